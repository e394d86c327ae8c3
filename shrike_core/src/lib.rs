//! Foundation shared by every part of the virtual machine:
//! the error catalog, console reporting, and the process runtime context.

#![warn(missing_docs)]

pub mod console;
pub mod context;
pub mod error;
