//! End-to-end loader scenarios against real files on disk.

use shrike_core::error::ErrorCode;
use shrike_memory::heap::Heap;
use shrike_memory::object::Flags;
use shrike_vm::image::Header;
use shrike_vm::image::HEADER_SIZE;
use shrike_vm::loader;
use shrike_vm::loader::LoadFlags;
use shrike_vm::module::Module;

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf
{
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

/// A well-formed module of exactly the header size: the declared size is
/// the header size and the name string "main" sits in the reserved bytes.
fn minimal_module() -> Vec<u8>
{
    let mut bytes =
        Header{size: HEADER_SIZE as u32, name_offset: 8}.encode().to_vec();
    bytes[8 .. 13].copy_from_slice(b"main\0");
    bytes
}

fn module_of<'h>(heap: &'h Heap, handle: shrike_memory::heap::Handle)
    -> &'h Module
{
    heap.get(handle)
        .unwrap()
        .payload()
        .unwrap()
        .as_any()
        .downcast_ref()
        .unwrap()
}

#[test]
fn loading_a_missing_path_is_fexist()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let missing = dir.path().join("missing.bc");
    let result = loader::load(&mut heap, &missing, LoadFlags::empty());

    assert_eq!(result.unwrap_err(), ErrorCode::Fexist);
    assert!(heap.is_empty());
}

#[test]
fn loading_a_zero_byte_file_is_hdrsize()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let path = write_file(&dir, "empty.bc", &[]);
    let result = loader::load(&mut heap, &path, LoadFlags::empty());

    assert_eq!(result.unwrap_err(), ErrorCode::HdrSize);
    assert!(heap.is_empty());
}

#[test]
fn loading_a_truncated_header_is_hdrsize()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let path = write_file(&dir, "short.bc", &[0u8; HEADER_SIZE - 1]);
    let result = loader::load(&mut heap, &path, LoadFlags::empty());

    assert_eq!(result.unwrap_err(), ErrorCode::HdrSize);
    assert!(heap.is_empty());
}

#[test]
fn loading_a_directory_is_fdir()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let result =
        loader::load(&mut heap, dir.path(), LoadFlags::empty());

    assert_eq!(result.unwrap_err(), ErrorCode::Fdir);
    assert!(heap.is_empty());
}

#[test]
fn loading_a_minimal_module_succeeds()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let path = write_file(&dir, "minimal.bc", &minimal_module());
    let handle = loader::load(&mut heap, &path, LoadFlags::empty()).unwrap();

    let object = heap.get(handle).unwrap();
    assert_eq!(object.refs(), 1);
    assert!(object.flags().contains(Flags::USED | Flags::LOADED));
    assert!(object.truthy());

    let module = module_of(&heap, handle);
    assert_eq!(module.name(), "main");
    assert_eq!(module.size(), HEADER_SIZE as u32);
    assert_eq!(module.symbol_count(), 0);
    assert!(module.symbols().is_empty());
    assert!(module.locals().is_empty());
    assert_eq!(module.code().unwrap().len(), HEADER_SIZE);
}

#[test]
fn the_buffered_backend_yields_the_same_module()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let path = write_file(&dir, "minimal.bc", &minimal_module());
    let handle =
        loader::load(&mut heap, &path, LoadFlags::BUFFERED).unwrap();

    let module = module_of(&heap, handle);
    assert_eq!(module.name(), "main");
    assert_eq!(module.size(), HEADER_SIZE as u32);
    assert_eq!(module.code().unwrap(), &minimal_module()[..]);
}

#[test]
fn the_declared_size_is_trusted_over_the_byte_count()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let mut bytes = Header{size: 999, name_offset: 16}.encode().to_vec();
    bytes.extend_from_slice(b"mod\0");
    bytes.extend_from_slice(&[0u8; 12]);

    let path = write_file(&dir, "oversold.bc", &bytes);
    let handle = loader::load(&mut heap, &path, LoadFlags::empty()).unwrap();

    let module = module_of(&heap, handle);
    assert_eq!(module.size(), 999);
    assert_eq!(module.code().unwrap().len(), bytes.len());
}

#[test]
fn a_name_offset_outside_the_region_is_hdrsize()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let bytes = Header{size: 16, name_offset: 64}.encode();
    let path = write_file(&dir, "wild.bc", &bytes);

    let result = loader::load(&mut heap, &path, LoadFlags::empty());
    assert_eq!(result.unwrap_err(), ErrorCode::HdrSize);
    assert!(heap.is_empty());
}

#[test]
fn a_name_without_a_terminator_is_hdrsize()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let mut bytes = Header{size: 16, name_offset: 8}.encode().to_vec();
    bytes[8 ..].fill(b'x');
    let path = write_file(&dir, "untermed.bc", &bytes);

    let result = loader::load(&mut heap, &path, LoadFlags::empty());
    assert_eq!(result.unwrap_err(), ErrorCode::HdrSize);
}

#[test]
fn unloading_releases_the_module_and_zeroes_the_object()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let path = write_file(&dir, "minimal.bc", &minimal_module());
    let handle = loader::load(&mut heap, &path, LoadFlags::empty()).unwrap();

    assert_eq!(loader::unload(&mut heap, handle), ErrorCode::Ok);

    let object = heap.get(handle).unwrap();
    assert_eq!(object.flags(), Flags::FREED);
    assert_eq!(object.name(), "");
    assert_eq!(object.refs(), 0);
    assert!(object.payload().is_none());
}

#[test]
fn unloading_twice_is_a_guarded_no_op()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let path = write_file(&dir, "minimal.bc", &minimal_module());
    let handle = loader::load(&mut heap, &path, LoadFlags::empty()).unwrap();

    assert_eq!(loader::unload(&mut heap, handle), ErrorCode::Ok);
    assert_eq!(loader::unload(&mut heap, handle), ErrorCode::Ok);
}

#[test]
fn unloading_a_reclaimed_handle_is_a_no_op()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let path = write_file(&dir, "minimal.bc", &minimal_module());
    let handle = loader::load(&mut heap, &path, LoadFlags::empty()).unwrap();

    loader::unload(&mut heap, handle);
    assert_eq!(heap.reclaim(handle), ErrorCode::Ok);

    assert!(!heap.contains(handle));
    assert_eq!(loader::unload(&mut heap, handle), ErrorCode::Ok);
}

#[test]
fn unloading_an_object_that_was_never_loaded_is_denied()
{
    let mut heap = Heap::new();
    let handle = heap.create("plain");

    assert_eq!(loader::unload(&mut heap, handle), ErrorCode::Perm);
    assert!(heap.contains(handle));
}

#[test]
fn a_loaded_module_prints_through_the_object_dispatch()
{
    let dir = TempDir::new().unwrap();
    let mut heap = Heap::new();

    let path = write_file(&dir, "minimal.bc", &minimal_module());
    let handle = loader::load(&mut heap, &path, LoadFlags::empty()).unwrap();

    let mut out = Vec::new();
    heap.get(handle).unwrap().print(&mut out).unwrap();
    let line = String::from_utf8(out).unwrap();

    assert!(line.starts_with("[Module 'main' 0x"));
    assert!(line.ends_with(']'));
}
