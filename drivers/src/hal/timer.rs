//! Timer Hardware Abstraction Layer.
//!
//! Defines the GPT capability table and the bound-device model. Each
//! hardware generation implements [`GptOps`] once; a [`GptVariant`]
//! descriptor binds compatibility strings to that implementation, and a
//! [`TimerDevice`] is one bound instance operating through it.

use alloc::boxed::Box;
use common::arch::CurrentIrq;
use common::sync::IrqSpinLock;

use crate::hal::clock::Clock;
use crate::hal::regio::RegisterIo;

/// Interrupt number type.
pub type IrqNumber = u32;

/// Timer operation errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Channel index is 0 or exceeds the channel count for its kind.
    InvalidChannel,
    /// Edge-mode encoding does not fit the 2-bit mode field.
    InvalidMode,
}

/// Input-capture edge detection mode.
///
/// Encoded as a 2-bit field in the control register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EdgeMode {
    /// Capture disabled.
    Disabled = 0,
    /// Capture on rising edge.
    RisingEdge = 1,
    /// Capture on falling edge.
    FallingEdge = 2,
    /// Capture on both edges.
    Both = 3,
}

impl EdgeMode {
    /// Decode a raw 2-bit field value.
    ///
    /// Values above 3 do not encode a mode and are rejected with
    /// [`TimerError::InvalidMode`].
    pub const fn from_bits(bits: u32) -> Result<Self, TimerError> {
        match bits {
            0 => Ok(EdgeMode::Disabled),
            1 => Ok(EdgeMode::RisingEdge),
            2 => Ok(EdgeMode::FallingEdge),
            3 => Ok(EdgeMode::Both),
            _ => Err(TimerError::InvalidMode),
        }
    }

    /// The 2-bit field encoding of this mode.
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// GPT capability table.
///
/// One implementation per register-layout generation. All hardware access
/// goes through this table so silicon revisions can share the channel and
/// sequencing logic while swapping only register specifics.
///
/// Channel indices are 1-based. Every channel-scoped operation validates
/// the index against its kind's channel count before touching any register
/// and fails with [`TimerError::InvalidChannel`] otherwise.
pub trait GptOps: Sync {
    /// Reset the control and prescaler registers, then program the clock
    /// source and prescaler for the target counting rate.
    fn setup(&self, dev: &TimerDevice);

    /// Set the run-enable bit.
    fn enable(&self, dev: &TimerDevice);

    /// Clear the run-enable bit.
    fn disable(&self, dev: &TimerDevice);

    /// Clear the rollover interrupt status (write-one-to-clear).
    fn irq_acknowledge(&self, dev: &TimerDevice);

    /// Whether the rollover status bit is currently set.
    fn is_rollover(&self, dev: &TimerDevice) -> bool;

    /// Program an output-compare channel's compare value.
    fn oc_setup(&self, dev: &TimerDevice, chan: u32, compare: u32) -> Result<(), TimerError>;

    /// Unmask an output-compare channel's interrupt.
    fn oc_irq_enable(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError>;

    /// Mask an output-compare channel's interrupt.
    fn oc_irq_disable(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError>;

    /// Clear an output-compare channel's interrupt status.
    fn oc_irq_acknowledge(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError>;

    /// Whether an output-compare channel's status bit is set.
    fn oc_is_irq(&self, dev: &TimerDevice, chan: u32) -> Result<bool, TimerError>;

    /// Program an input-capture channel's edge mode.
    fn ic_setup(&self, dev: &TimerDevice, chan: u32, mode: EdgeMode) -> Result<(), TimerError>;

    /// Unmask an input-capture channel's interrupt.
    fn ic_irq_enable(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError>;

    /// Mask an input-capture channel's interrupt.
    fn ic_irq_disable(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError>;

    /// Clear an input-capture channel's interrupt status.
    fn ic_irq_acknowledge(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError>;

    /// Whether an input-capture channel's status bit is set.
    fn ic_is_irq(&self, dev: &TimerDevice, chan: u32) -> Result<bool, TimerError>;
}

/// Hardware variant descriptor.
///
/// Immutable binding of a register layout to the compatibility strings
/// that select it. Resolved once at bind time and shared read-only between
/// all instances of the variant; safe without locking because it is never
/// mutated after construction.
pub struct GptVariant {
    /// Variant name for diagnostics.
    pub name: &'static str,
    /// Compatibility strings matched against the platform device.
    pub compatible: &'static [&'static str],
    /// Operation table for this register layout.
    pub ops: &'static dyn GptOps,
}

/// One bound GPT instance.
///
/// Holds the exclusively-owned register block, the interrupt line, the
/// peripheral and bus-interface clock handles, and the resolved variant.
/// A `TimerDevice` is only constructed after the register block is mapped
/// and both clocks are enabled; no earlier state is observable.
pub struct TimerDevice {
    regs: Box<dyn RegisterIo + Send + Sync>,
    irq: IrqNumber,
    clk_per: Box<dyn Clock + Send + Sync>,
    clk_ipg: Box<dyn Clock + Send + Sync>,
    variant: &'static GptVariant,
    /// Serializes read-modify-write of the shared interrupt-enable
    /// register across all channels and both channel kinds.
    ir_lock: IrqSpinLock<(), CurrentIrq>,
}

impl TimerDevice {
    /// Create a bound instance from already-acquired resources.
    ///
    /// Callers must have mapped `regs` and enabled both clocks before
    /// calling this; the platform probe path enforces that order.
    pub fn new(
        regs: Box<dyn RegisterIo + Send + Sync>,
        irq: IrqNumber,
        clk_per: Box<dyn Clock + Send + Sync>,
        clk_ipg: Box<dyn Clock + Send + Sync>,
        variant: &'static GptVariant,
    ) -> Self {
        Self {
            regs,
            irq,
            clk_per,
            clk_ipg,
            variant,
            ir_lock: IrqSpinLock::new(()),
        }
    }

    /// The operation table resolved for this instance's hardware variant.
    pub fn ops(&self) -> &'static dyn GptOps {
        self.variant.ops
    }

    /// The variant descriptor this instance was matched to.
    pub fn variant(&self) -> &'static GptVariant {
        self.variant
    }

    /// This instance's register block.
    pub fn regs(&self) -> &dyn RegisterIo {
        &*self.regs
    }

    /// The peripheral (counting) clock.
    pub fn clk_per(&self) -> &dyn Clock {
        &*self.clk_per
    }

    /// The bus-interface clock.
    pub fn clk_ipg(&self) -> &dyn Clock {
        &*self.clk_ipg
    }

    /// The interrupt line resolved for this instance.
    pub fn irq(&self) -> IrqNumber {
        self.irq
    }

    /// Run `f` with the interrupt-enable register lock held.
    ///
    /// The lock masks local interrupt delivery for its duration, so it is
    /// safe to take from both interrupt and process context.
    pub(crate) fn with_ir_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.ir_lock.lock();
        f()
    }
}

impl core::fmt::Debug for TimerDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerDevice")
            .field("variant", &self.variant.name)
            .field("irq", &self.irq)
            .finish_non_exhaustive()
    }
}
