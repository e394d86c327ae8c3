//! Process runtime context.
//!
//! The host parses its command line once, before any loading begins, and
//! everything downstream reads the result through an explicit
//! [`RuntimeContext`] parameter. Nothing in the workspace consults ambient
//! global state.

use std::path::PathBuf;

/// Parsed command-line surface consumed by the runtime.
///
/// How the arguments are parsed is the host binary's business; the
/// libraries only ever see this struct.
#[derive(Clone, Debug)]
pub struct Args
{
    /// Path of the bytecode file to load.
    pub filename: PathBuf,

    /// Optional argument string handed to the loaded module.
    pub args: Option<String>,

    /// Enables debug-only diagnostics such as module dumps.
    pub debug: bool,
}

/// Process-wide state initialised once before loading begins.
///
/// Read-only after construction; torn down implicitly at process exit.
#[derive(Clone, Debug)]
pub struct RuntimeContext
{
    /// The parsed command-line arguments.
    pub args: Args,
}

impl RuntimeContext
{
    /// Create a context from parsed arguments.
    pub fn new(args: Args) -> Self
    {
        Self{args}
    }

    /// Whether debug-only diagnostics are enabled.
    pub fn debug(&self) -> bool
    {
        self.args.debug
    }
}
