//! HAL Interrupt Support
//!
//! Decouples interrupt service logic from the platform's registration
//! mechanics:
//!
//! - **InterruptHandler**: an object serving one or more vectors
//! - **InterruptDispatcher**: anything that can connect a handler to a vector
//! - **VectorTable**: a ready-made dispatcher the platform's IDT stubs call into
//!
//! # Architecture
//!
//! ```text
//! Device Interrupt (IRQ 14/15)
//!       │
//!       ▼
//! ┌─────────────┐
//! │  8259 PIC   │  Remapped to 0x2E / 0x2F
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │     IDT     │  Platform stub
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ VectorTable │  dispatch(vector) -> handler.on_signal(vector)
//! └─────────────┘
//! ```

use spin::RwLock;

/// Number of interrupt vectors
pub const MAX_VECTORS: usize = 256;

/// Interrupt service object
///
/// Runs in interrupt context: implementations must not block.
pub trait InterruptHandler: Sync {
    /// Service an interrupt raised on `vector`
    fn on_signal(&self, vector: u8);
}

/// Interrupt registration
pub trait InterruptDispatcher {
    /// Route `vector` to `handler`, replacing any previous connection
    fn connect(&self, vector: u8, handler: &'static dyn InterruptHandler);
}

impl<T: InterruptDispatcher + ?Sized> InterruptDispatcher for &T {
    #[inline]
    fn connect(&self, vector: u8, handler: &'static dyn InterruptHandler) {
        (**self).connect(vector, handler)
    }
}

/// Vector-indexed handler table
pub struct VectorTable {
    slots: RwLock<[Option<&'static dyn InterruptHandler>; MAX_VECTORS]>,
}

impl VectorTable {
    pub const fn new() -> Self {
        Self {
            slots: RwLock::new([None; MAX_VECTORS]),
        }
    }

    /// Disconnect whatever serves `vector`
    pub fn disconnect(&self, vector: u8) {
        self.slots.write()[vector as usize] = None;
    }

    /// Check if a handler is connected to `vector`
    pub fn is_connected(&self, vector: u8) -> bool {
        self.slots.read()[vector as usize].is_some()
    }

    /// Deliver an interrupt
    ///
    /// Returns true if a handler was connected. The table lock is dropped
    /// before the handler runs.
    pub fn dispatch(&self, vector: u8) -> bool {
        let handler = self.slots.read()[vector as usize];
        match handler {
            Some(handler) => {
                handler.on_signal(vector);
                true
            }
            None => false,
        }
    }
}

impl InterruptDispatcher for VectorTable {
    fn connect(&self, vector: u8, handler: &'static dyn InterruptHandler) {
        self.slots.write()[vector as usize] = Some(handler);
    }
}

impl Default for VectorTable {
    fn default() -> Self {
        Self::new()
    }
}
