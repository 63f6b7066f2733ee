//! Hardware Abstraction Layer
//!
//! - **port**: byte/word port I/O used by the register protocol and data pump
//! - **interrupt**: handler objects and the vector dispatch table

pub mod interrupt;
pub mod port;
