//! Exit codes for the idflow CLI.
//! These codes are part of the public contract.

pub const SUCCESS: i32 = 0;
pub const VERIFICATION_FAILED: i32 = 1; // Report carries an error, or token acquisition failed
pub const CONFIG_ERROR: i32 = 2; // Bad configuration, unreadable input files
