//! I/O Layer
//!
//! Consumers of the raw driver:
//!
//! - **block**: sector-granular block device interface over an ATA device
//! - **preload**: boot-time copy of a program image from raw disk into a file

pub mod block;
pub mod preload;

pub use block::{AtaBlockDevice, BlockDevice, DiskGeometry};
pub use preload::{preload_image, FileSink, PreloadError, ProgramImage};
