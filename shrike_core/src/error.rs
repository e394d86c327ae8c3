//! Error catalog: the status codes every component answers with.
//!
//! Expected failures travel as [`ErrorCode`] values through ordinary
//! `Result`s; they are never thrown as control flow. Invariant violations
//! are a different class entirely and panic at the offending call site
//! instead of being encoded here.

use core::fmt;

/// Number of codes in the defined range.
///
/// [`describe`] answers `"Unknown error"` for everything at or past this.
pub const CODE_COUNT: i64 = 9;

/// Status and error codes understood across the virtual machine.
///
/// The discriminants are fixed: they are handed to callers as plain
/// integers and must never be renumbered. The catalog intentionally carries
/// codes that no current path returns ([`ErrorCode::True`],
/// [`ErrorCode::Ffile`], [`ErrorCode::Mmapm`]); they hold their slots so the
/// numbering stays stable as operations grow into them.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ErrorCode
{
    /// Everything is fine.
    Ok = 0,

    /// Reserved for boolean statuses; returned by no current operation.
    True = 1,

    /// The operation is not permitted.
    Perm = 2,

    /// The file or directory does not exist.
    Fexist = 3,

    /// The path names a file where it should not.
    Ffile = 4,

    /// The path names a directory where it should not.
    Fdir = 5,

    /// Mapping a file into memory failed.
    Mmapf = 6,

    /// Mapping new memory failed.
    Mmapm = 7,

    /// The file is smaller than the fixed bytecode header.
    HdrSize = 8,
}

impl ErrorCode
{
    /// Fixed message text for this code.
    pub fn message(self) -> &'static str
    {
        match self {
            Self::Ok => "?",
            Self::True => "?",
            Self::Perm => "action is not permitted",
            Self::Fexist => "file/directory does not exist",
            Self::Ffile => "is a file",
            Self::Fdir => "is a directory",
            Self::Mmapf => "failed to map a file into memory",
            Self::Mmapm => "failed to map new memory",
            Self::HdrSize => "bytecode header is truncated",
        }
    }

    /// Convert a raw integer into a code.
    ///
    /// Anything outside the defined range answers [`None`]. Negative inputs
    /// are simply out of range, not an error condition of their own.
    pub fn from_raw(code: i64) -> Option<Self>
    {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::True),
            2 => Some(Self::Perm),
            3 => Some(Self::Fexist),
            4 => Some(Self::Ffile),
            5 => Some(Self::Fdir),
            6 => Some(Self::Mmapf),
            7 => Some(Self::Mmapm),
            8 => Some(Self::HdrSize),
            _ => None,
        }
    }

    /// The raw integer value of this code.
    pub fn raw(self) -> u32
    {
        self as u32
    }
}

impl fmt::Display for ErrorCode
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.write_str(self.message())
    }
}

impl std::error::Error for ErrorCode
{
}

/// Get the message for a raw code, for it to be printed.
///
/// In-range codes answer their fixed message; any other integer, negative
/// numbers included, answers exactly `"Unknown error"`. Pure lookup with no
/// side effects, safe to call from any failure path.
pub fn describe(code: i64) -> &'static str
{
    match ErrorCode::from_raw(code) {
        Some(code) => code.message(),
        None => "Unknown error",
    }
}
