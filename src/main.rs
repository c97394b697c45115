//! CLI entry point: opens (or formats) the fixed-name backing image in
//! the current directory and mounts it at the given mountpoint.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};

use blockfs::bridge::Fuse;
use blockfs::param::DEFAULT_IMAGE_NAME;
use blockfs::FileSystemCore;

/// Mounts the single-file-backed filesystem image at `FS` in the
/// current directory.
#[derive(Parser)]
#[command(name = "blockfs", version, about)]
struct Args {
    /// Directory to mount the filesystem at.
    mountpoint: PathBuf,

    /// Run in the foreground instead of daemonizing.
    #[arg(short = 'f', long)]
    foreground: bool,

    /// Increase logging verbosity; repeatable.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(level_for(args.verbose))
        .init();

    let image_path = PathBuf::from(DEFAULT_IMAGE_NAME);
    let core = match FileSystemCore::open(&image_path) {
        Ok(core) => core,
        Err(e) => {
            error!("failed to open {}: {e}", image_path.display());
            return ExitCode::FAILURE;
        }
    };

    info!("mounting {} at {}", image_path.display(), args.mountpoint.display());

    let options = vec![
        fuser::MountOption::FSName("blockfs".to_string()),
        fuser::MountOption::AutoUnmount,
    ];

    if !args.foreground {
        info!("this build always runs in the foreground; pass -f to silence this note");
    }

    match fuser::mount2(Fuse::new(core), &args.mountpoint, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("mount failed: {e}");
            ExitCode::FAILURE
        }
    }
}
