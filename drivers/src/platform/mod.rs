//! Platform Abstraction Layer
//!
//! A platform device hands the driver its bind-time resources: the mapped
//! register block, the interrupt line, and named clock handles. The
//! platform integration implements [`PlatformDevice`] for each discovered
//! piece of hardware; the i.MX GPT driver in [`imx`] consumes it.

use alloc::boxed::Box;

use crate::hal::clock::{Clock, ClockError};
use crate::hal::regio::RegisterIo;
use crate::hal::timer::{IrqNumber, TimerError};

pub mod imx;

/// Bind-time resource provider for one matched hardware device.
pub trait PlatformDevice {
    /// Compatibility string used to select the hardware variant.
    fn compatible(&self) -> &str;

    /// Map the device's register block.
    ///
    /// Returns `None` when the block cannot be mapped. The returned
    /// accessor exclusively owns the mapping.
    fn map_registers(&self) -> Option<Box<dyn RegisterIo + Send + Sync>>;

    /// Resolve the device's interrupt line.
    fn map_irq(&self) -> Option<IrqNumber>;

    /// Look up a clock by name.
    fn clock(&self, name: &str) -> Option<Box<dyn Clock + Send + Sync>>;
}

/// Errors that abort device attachment.
///
/// Any of these leaves the device unbound; resources acquired before the
/// failing step are released as their owning handles drop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BindError {
    /// No variant matches the device's compatibility string.
    UnknownVariant,
    /// The register block could not be mapped.
    MapFailed,
    /// No interrupt line resolved for the device.
    IrqMapFailed,
    /// A required clock could not be looked up or enabled.
    ClockUnavailable,
    /// The one-time initialization sequence failed.
    Init(TimerError),
}

impl From<ClockError> for BindError {
    fn from(_err: ClockError) -> Self {
        BindError::ClockUnavailable
    }
}

impl From<TimerError> for BindError {
    fn from(err: TimerError) -> Self {
        BindError::Init(err)
    }
}
