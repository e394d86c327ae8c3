//! Console reporting for user-facing diagnostics.
//!
//! Expected failures are reported here as single-line, colour-tagged
//! messages. Errors terminate the process with exit code 1; warnings do
//! not. Invariant violations never pass through this module, they panic at
//! their call site so the broken contract is not mistaken for bad input.

use colored::Colorize;

use std::fmt::Display;
use std::io;
use std::io::Write;
use std::process;

/// Name the console prefixes every line with.
const PROGRAM: &str = "shrike";

/// Print a formatted error to the diagnostic stream and exit.
///
/// Terminates the process with exit code 1 after reporting.
pub fn error(message: impl Display) -> !
{
    eprintln!("{}: {} {}", PROGRAM, "error:".bright_red(), message);
    process::exit(1);
}

/// Print a formatted warning to the diagnostic stream.
pub fn warn(message: impl Display)
{
    eprintln!("{}: {} {}", PROGRAM, "warning:".bright_magenta(), message);
}

/// Write a byte region as hex, one byte per line.
pub fn hexdump(out: &mut dyn Write, bytes: &[u8]) -> io::Result<()>
{
    for byte in bytes {
        writeln!(out, "{:02x}", byte)?;
    }

    Ok(())
}
