//! Exit code constants for the gitops-provider CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unreadable plan or state file)
//! - 2: Configuration error (missing or inconsistent resource fields)
//! - 3: Subprocess failure (start, non-zero exit, stream read)
//! - 4: Output failure (result file missing or not valid JSON)
//! - 5: One or more plan operations failed

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or an unreadable plan/state file.
pub const USER_ERROR: i32 = 1;

/// Configuration error: detected before any subprocess is started.
pub const CONFIG_FAILURE: i32 = 2;

/// Subprocess failure: the executable could not be started, exited non-zero,
/// or one of its output streams could not be read.
pub const SUBPROCESS_FAILURE: i32 = 3;

/// Output failure: the subprocess result could not be read or parsed.
pub const OUTPUT_FAILURE: i32 = 4;

/// At least one operation of a plan failed.
pub const OPERATION_FAILURE: i32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            CONFIG_FAILURE,
            SUBPROCESS_FAILURE,
            OUTPUT_FAILURE,
            OPERATION_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
