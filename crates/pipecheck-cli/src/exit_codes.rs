//! Unified exit codes for the pipecheck CLI.
//! These codes are part of the public contract.

pub const SUCCESS: i32 = 0;
pub const TESTS_FAILED: i32 = 1; // At least one comparison or pipeline run failed
pub const CONFIG_ERROR: i32 = 2; // Bad arguments, unreadable test case, setup failure
