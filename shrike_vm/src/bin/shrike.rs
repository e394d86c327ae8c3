//! Host executable: loads a bytecode module, optionally dumps it, and
//! tears it down again.

use shrike_core::console;
use shrike_core::context::Args;
use shrike_core::context::RuntimeContext;
use shrike_memory::heap::Heap;
use shrike_vm::host::HostError;
use shrike_vm::loader;
use shrike_vm::loader::LoadFlags;

use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line surface of the host.
#[derive(Debug, Parser)]
#[command(name = "shrike", version, about = "Bytecode virtual machine host")]
struct Cli
{
    /// Bytecode file to load.
    filename: Option<PathBuf>,

    /// Argument string handed to the loaded module.
    #[arg(short, long)]
    args: Option<String>,

    /// Enable debug diagnostics such as module dumps.
    #[arg(short, long)]
    debug: bool,
}

fn main()
{
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(error) = run(Cli::parse()) {
        console::error(error);
    }
}

fn run(cli: Cli) -> Result<(), HostError>
{
    let filename = cli.filename.ok_or(HostError::NoInput)?;
    let context = RuntimeContext::new(Args{
        filename: filename.clone(),
        args: cli.args,
        debug: cli.debug,
    });

    let mut heap = Heap::new();
    let handle =
        loader::load(&mut heap, &context.args.filename, LoadFlags::empty())
            .map_err(|source| HostError::Load{path: filename, source})?;

    if let Some(object) = heap.get(handle) {
        let _ = object.dump(&context, &mut io::stdout());
    }

    loader::unload(&mut heap, handle);
    heap.reclaim(handle);

    Ok(())
}
