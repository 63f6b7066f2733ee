//! Boot-Time Program Preload
//!
//! Before any file system is mounted, a program image sits at a fixed raw
//! sector range on the boot disk. It is read whole and written out as a
//! file so the first user process can exec it.

use core::fmt;

use log::{error, info};

use super::block::BlockDevice;
use crate::error::IdeError;
use crate::SECTOR_SIZE;

/// Location of a program image on raw disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramImage {
    /// Destination file path
    pub path: &'static str,
    /// First sector of the image
    pub lba: u32,
    /// Image size in bytes
    pub size: usize,
}

impl ProgramImage {
    /// Test program installed at boot
    pub const DEFAULT: Self = Self {
        path: "/prog_no_arg",
        lba: 300,
        size: 6172,
    };

    /// Whole sectors spanned by the image
    pub const fn sector_count(&self) -> usize {
        self.size.div_ceil(SECTOR_SIZE)
    }
}

/// File creation hook provided by the file system
pub trait FileSink {
    type Error: fmt::Debug;

    /// Create (or truncate) `path` and store `data` in it
    fn create_and_write(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error>;
}

/// Preload failures
#[derive(Debug, PartialEq, Eq)]
pub enum PreloadError<E> {
    /// Raw disk read failed
    Disk(IdeError),
    /// Scratch buffer cannot hold the image's sectors
    ScratchTooSmall { needed: usize, actual: usize },
    /// File system rejected the image
    Sink(E),
}

impl<E: fmt::Debug> fmt::Display for PreloadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreloadError::Disk(err) => write!(f, "disk: {}", err),
            PreloadError::ScratchTooSmall { needed, actual } => {
                write!(f, "scratch holds {} bytes, image needs {}", actual, needed)
            }
            PreloadError::Sink(err) => write!(f, "file write error: {:?}", err),
        }
    }
}

/// Copy `image` from `disk` into a file
///
/// `scratch` must hold the image rounded up to whole sectors; only the
/// first `image.size` bytes reach the sink.
pub fn preload_image<D, F>(
    disk: &D,
    image: &ProgramImage,
    scratch: &mut [u8],
    sink: &mut F,
) -> Result<(), PreloadError<F::Error>>
where
    D: BlockDevice + ?Sized,
    F: FileSink + ?Sized,
{
    let needed = image.sector_count() * SECTOR_SIZE;
    if scratch.len() < needed {
        return Err(PreloadError::ScratchTooSmall {
            needed,
            actual: scratch.len(),
        });
    }

    let buf = &mut scratch[..needed];
    disk.read_blocks(image.lba, buf).map_err(PreloadError::Disk)?;

    if let Err(err) = sink.create_and_write(image.path, &buf[..image.size]) {
        error!("preload: {}: file write error", image.path);
        return Err(PreloadError::Sink(err));
    }

    info!(
        "preload: {} ({} bytes) from {} lba {}",
        image.path,
        image.size,
        disk.name(),
        image.lba
    );
    Ok(())
}
