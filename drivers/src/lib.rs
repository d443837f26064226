//! i.MX GPT Driver Subsystem
//!
//! This crate provides a layered architecture for the General Purpose
//! Timer hardware:
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent trait definitions and the device model
//! - [`platform`]: Platform-specific drivers (SoC level)
//! - [`device_manager`]: Registry of bound device instances
//!
//! # Design Principles
//!
//! 1. **Separation of Concerns**: Variant-specific register layouts are
//!    separate from the channel and sequencing logic they share
//! 2. **Typed Failure**: Validation never silently no-ops; every rejected
//!    operation surfaces an error value
//! 3. **Interrupt Safety**: Shared-register read-modify-write runs under an
//!    IRQ-masking lock, usable from both interrupt and process context
//! 4. **Clear Ownership**: Each bound device exclusively owns its register
//!    block
//!
//! # Usage Example
//!
//! ```ignore
//! use drivers::platform::imx;
//!
//! let dev = imx::probe(&my_platform_device)?;
//! dev.ops().oc_setup(&dev, 2, 0x0010_0000)?;
//! dev.ops().oc_irq_enable(&dev, 2)?;
//! ```

#![no_std]
#![allow(dead_code)]

pub mod device_manager;
pub mod hal;
pub mod platform;

// Re-export commonly used types
pub use hal::clock::{Clock, ClockError, FixedClock};
pub use hal::regio::{Mmio, RegisterIo};
pub use hal::timer::{EdgeMode, GptOps, GptVariant, TimerDevice, TimerError};
pub use platform::{BindError, PlatformDevice};

extern crate alloc;

#[cfg(test)]
extern crate std;
