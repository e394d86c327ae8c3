//! Read-only views of a bytecode file.
//!
//! Loading interprets the same bytes twice: first as a fixed header whose
//! fields locate the rest, then, once those fields are validated, as code.
//! [`Image`] makes the two readings explicit phases instead of an untyped
//! reinterpretation, and [`MapSource`] hides whether the bytes come from a
//! memory mapping or a plain heap buffer.

use shrike_core::error::ErrorCode;

use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::ops::Range;

/// Size in bytes of the fixed header at the start of every bytecode file.
///
/// The bytes past [`Header::name_offset`] are reserved for the symbol
/// table directory and are not interpreted yet; minimal header-only
/// modules may keep their name string there.
pub const HEADER_SIZE: usize = 16;

/// Decoded fixed header of a bytecode file. All fields are little-endian
/// on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header
{
    /// Declared total logical size of the module payload.
    pub size: u32,

    /// Byte offset of the NUL-terminated module name within the region.
    pub name_offset: u32,
}

fn read_u32(bytes: &[u8], offset: usize) -> u32
{
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset .. offset + 4]);
    u32::from_le_bytes(word)
}

impl Header
{
    /// Decode the header from the first bytes of a region.
    ///
    /// Answers [`ErrorCode::HdrSize`] when the region cannot hold a
    /// header; no field is read in that case.
    pub fn decode(bytes: &[u8]) -> Result<Self, ErrorCode>
    {
        if bytes.len() < HEADER_SIZE {
            return Err(ErrorCode::HdrSize);
        }

        Ok(Self{
            size: read_u32(bytes, 0),
            name_offset: read_u32(bytes, 4),
        })
    }

    /// Encode the header, reserved bytes zeroed.
    pub fn encode(&self) -> [u8; HEADER_SIZE]
    {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0 .. 4].copy_from_slice(&self.size.to_le_bytes());
        bytes[4 .. 8].copy_from_slice(&self.name_offset.to_le_bytes());
        bytes
    }
}

/// Contiguous read-only byte region backing a module.
///
/// One capability with two interchangeable backends. Both yield the same
/// logical result, a readable byte region plus its length, so callers
/// never branch on how the bytes arrived.
pub enum MapSource
{
    /// Private read-only mapping of the file, with no write-back.
    Mapped(Mmap),

    /// Heap buffer filled by reading the file sequentially.
    Buffered(Box<[u8]>),
}

impl MapSource
{
    /// Map the whole file read-only into the address space.
    pub fn map(file: &File) -> Result<Self, ErrorCode>
    {
        // SAFETY: the mapping is private and read-only, and the runtime
        // never writes to a module file it has opened.
        match unsafe { Mmap::map(file) } {
            Ok(map) => Ok(Self::Mapped(map)),
            Err(_) => Err(ErrorCode::Mmapf),
        }
    }

    /// Read `len` bytes of the file into a heap buffer.
    ///
    /// The fallback backend for platforms or callers that cannot map.
    pub fn read(file: &mut File, len: usize) -> Result<Self, ErrorCode>
    {
        let mut buffer = vec![0u8; len];
        match file.read_exact(&mut buffer) {
            Ok(()) => Ok(Self::Buffered(buffer.into_boxed_slice())),
            Err(_) => Err(ErrorCode::Mmapf),
        }
    }

    /// The bytes of the region.
    pub fn bytes(&self) -> &[u8]
    {
        match self {
            Self::Mapped(map) => map,
            Self::Buffered(buffer) => buffer,
        }
    }
}

impl Deref for MapSource
{
    type Target = [u8];

    fn deref(&self) -> &[u8]
    {
        self.bytes()
    }
}

/// Phased interpretation of a mapped bytecode region.
///
/// Freshly mapped bytes are only trusted as far as the fixed header; the
/// whole region becomes addressable as code once
/// [`validate`](`Image::validate`) has checked the header's claims. The
/// phase is part of the type, so a caller can never read code out of an
/// unvalidated region.
pub enum Image
{
    /// Freshly mapped: the fixed header may be read, nothing else.
    Header(MapSource),

    /// Validated: the whole region is addressable as code.
    Code(MapSource),
}

impl Image
{
    /// Wrap a freshly mapped region in the header phase.
    pub fn new(source: MapSource) -> Self
    {
        Self::Header(source)
    }

    /// Decode the fixed header.
    ///
    /// Answered only in the header phase; once the image has moved on, the
    /// header bytes are ordinary code and reading them as fields is denied
    /// with [`ErrorCode::Perm`].
    pub fn header(&self) -> Result<Header, ErrorCode>
    {
        match self {
            Self::Header(source) => Header::decode(source),
            Self::Code(_) => Err(ErrorCode::Perm),
        }
    }

    /// Validate the header's claims and move the region to the code phase.
    ///
    /// Checks that the name offset lies inside the region and that a NUL
    /// terminator follows it; a header pointing outside the mapped bytes
    /// is rejected with [`ErrorCode::HdrSize`] before anything could read
    /// out of bounds later. On success, answers the code-phase image
    /// together with the byte range of the name view.
    pub fn validate(self) -> Result<(Self, Range<usize>), ErrorCode>
    {
        let header = self.header()?;
        let source = match self {
            Self::Header(source) => source,
            Self::Code(_) => return Err(ErrorCode::Perm),
        };

        let offset = header.name_offset as usize;
        if offset >= source.len() {
            return Err(ErrorCode::HdrSize);
        }

        let name = match source[offset ..].iter().position(|&b| b == 0) {
            Some(nul) => offset .. offset + nul,
            None => return Err(ErrorCode::HdrSize),
        };

        Ok((Self::Code(source), name))
    }

    /// The code bytes. Answered only once validation has run.
    pub fn code(&self) -> Option<&[u8]>
    {
        match self {
            Self::Header(_) => None,
            Self::Code(source) => Some(source),
        }
    }

    /// Number of bytes in the underlying region, in either phase.
    pub fn len(&self) -> usize
    {
        match self {
            Self::Header(source) => source.len(),
            Self::Code(source) => source.len(),
        }
    }

    /// Whether the region holds no bytes.
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}
