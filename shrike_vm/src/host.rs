//! Failures surfaced by the host binary.

use shrike_core::error::ErrorCode;

use std::path::PathBuf;
use thiserror::Error;

/// A user-facing failure of the host.
///
/// Every variant ends up on the console error path and terminates the
/// process with exit code 1. Broken runtime invariants are deliberately
/// not represented here; those panic instead, so bad input and a broken
/// runtime can never be confused.
#[derive(Debug, Error)]
pub enum HostError
{
    /// No bytecode file was named on the command line.
    #[error("no input file")]
    NoInput,

    /// The named bytecode file could not be loaded.
    #[error("cannot load `{}`: {}", .path.display(), .source.message())]
    Load
    {
        /// Path that failed to load.
        path: PathBuf,

        /// The catalog code describing the failure.
        #[source]
        source: ErrorCode,
    },
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn load_errors_name_the_path_and_the_catalog_message()
    {
        let error = HostError::Load{
            path: PathBuf::from("missing.bc"),
            source: ErrorCode::Fexist,
        };

        assert_eq!(
            error.to_string(),
            "cannot load `missing.bc`: file/directory does not exist",
        );
    }

    #[test]
    fn missing_input_has_the_classic_message()
    {
        assert_eq!(HostError::NoInput.to_string(), "no input file");
    }
}
