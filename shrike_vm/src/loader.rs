//! Mapping bytecode files into memory and installing them as objects.
//!
//! A module moves through three states and never back: unloaded, loaded,
//! freed. [`load`] takes it to loaded, [`unload`] to freed. Expected
//! failures come back as catalog codes; the loader itself never
//! terminates the process, that is the caller's decision.

use crate::image::HEADER_SIZE;
use crate::image::Image;
use crate::image::MapSource;
use crate::module::Module;

use bitflags::bitflags;
use shrike_core::error::ErrorCode;
use shrike_memory::heap::Handle;
use shrike_memory::heap::Heap;
use shrike_memory::object::Flags;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

bitflags!
{
    /// Options accepted by [`load`].
    pub struct LoadFlags: u32
    {
        /// Read the file into a heap buffer instead of mapping it.
        const BUFFERED = 1 << 0;
    }
}

/// Load a module from a bytecode file.
///
/// Opens the file read-only, maps its bytes, validates the fixed header,
/// and installs the module on the heap as an object with its dispatch
/// bound, the [`Flags::LOADED`] flag set, and a reference count of 1.
///
/// Symbols are left unmapped: the count stays 0 and the table empty.
///
/// Expected failures answer a catalog code and construct nothing, so the
/// heap and the caller's state are exactly as they were:
///
/// - the path does not exist: [`ErrorCode::Fexist`]
/// - the file cannot be inspected: [`ErrorCode::Perm`]
/// - the path is a directory: [`ErrorCode::Fdir`]
/// - the file is smaller than the fixed header: [`ErrorCode::HdrSize`],
///   checked before any header field is read
/// - the chosen backend cannot map: [`ErrorCode::Mmapf`]
/// - the header's name claims do not fit the region:
///   [`ErrorCode::HdrSize`]
pub fn load(heap: &mut Heap, path: &Path, flags: LoadFlags)
    -> Result<Handle, ErrorCode>
{
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            return Err(match error.kind() {
                ErrorKind::PermissionDenied => ErrorCode::Perm,
                _ => ErrorCode::Fexist,
            });
        }
    };

    let metadata = match file.metadata() {
        Ok(metadata) => metadata,
        Err(_) => return Err(ErrorCode::Perm),
    };
    if metadata.is_dir() {
        return Err(ErrorCode::Fdir);
    }

    let len = metadata.len() as usize;
    if len < HEADER_SIZE {
        return Err(ErrorCode::HdrSize);
    }

    let source = if flags.contains(LoadFlags::BUFFERED) {
        MapSource::read(&mut file, len)?
    } else {
        MapSource::map(&file)?
    };

    let image = Image::new(source);
    let header = image.header()?;
    let (image, name) = image.validate()?;

    debug!(
        path = %path.display(),
        bytes = image.len(),
        declared = header.size,
        "module mapped",
    );

    // TODO: map symbols once the reserved header directory is specified.
    let module = Module{
        nsyms: 0,
        syms: Vec::new(),
        size: header.size,
        image: Some(image),
        name,
        locals: Vec::new(),
    };

    let handle = heap.adopt("", Box::new(module));
    if let Some(object) = heap.get_mut(handle) {
        object.flags_mut().insert(Flags::LOADED);
    }

    Ok(handle)
}

/// Unload a module object, releasing the mapped region.
///
/// Valid only on loaded objects; anything else that is still live answers
/// [`ErrorCode::Perm`]. The module's destructor drops the mapping and the
/// generic teardown zeroes the object, leaving it freed. Unloading twice,
/// or through a stale handle, is a guarded no-op.
pub fn unload(heap: &mut Heap, handle: Handle) -> ErrorCode
{
    let object = match heap.get(handle) {
        Some(object) => object,
        None => return ErrorCode::Ok,
    };

    if object.flags().contains(Flags::FREED) {
        return ErrorCode::Ok;
    }
    if !object.flags().contains(Flags::LOADED) {
        return ErrorCode::Perm;
    }

    debug!(index = handle.index(), "module unloaded");
    heap.destroy(handle)
}
