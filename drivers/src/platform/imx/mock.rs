//! Test doubles for the GPT driver.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::hal::clock::{Clock, ClockError, FixedClock};
use crate::hal::regio::RegisterIo;
use crate::hal::timer::{GptVariant, IrqNumber, TimerDevice};
use crate::platform::PlatformDevice;

use super::IMX8M_GPT;
use super::gpt;

/// Number of 32-bit registers in the v2 block (CR through CNT).
const REG_COUNT: usize = gpt::CNT_OFFSET / 4 + 1;

/// Mock GPT register file.
///
/// Behaves like the hardware where the driver depends on it: the status
/// register is write-one-to-clear, everything else is plain read/write.
/// Every `write32` is counted so tests can assert that rejected operations
/// never touch a register.
pub(crate) struct MockGpt {
    regs: [AtomicU32; REG_COUNT],
    writes: AtomicUsize,
}

impl MockGpt {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            regs: [const { AtomicU32::new(0) }; REG_COUNT],
            writes: AtomicUsize::new(0),
        })
    }

    /// Read a register without going through the driver.
    pub(crate) fn get(&self, offset: usize) -> u32 {
        self.regs[offset / 4].load(Ordering::Relaxed)
    }

    /// Set a register directly, bypassing the write-one-to-clear rule.
    pub(crate) fn set(&self, offset: usize, value: u32) {
        self.regs[offset / 4].store(value, Ordering::Relaxed);
    }

    /// Number of `write32` calls the driver has performed.
    pub(crate) fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

/// [`RegisterIo`] handle over a shared mock register file.
pub(crate) struct SharedRegs(pub(crate) Arc<MockGpt>);

impl RegisterIo for SharedRegs {
    fn read32(&self, offset: usize) -> u32 {
        self.0.get(offset)
    }

    fn write32(&self, offset: usize, value: u32) {
        self.0.writes.fetch_add(1, Ordering::Relaxed);
        if offset == gpt::SR_OFFSET {
            // Write-one-to-clear.
            self.0.regs[offset / 4].fetch_and(!value, Ordering::Relaxed);
        } else {
            self.0.regs[offset / 4].store(value, Ordering::Relaxed);
        }
    }
}

/// Clock whose `prepare_enable` always fails.
pub(crate) struct FailingClock;

impl Clock for FailingClock {
    fn rate(&self) -> u32 {
        0
    }

    fn prepare_enable(&self) -> Result<(), ClockError> {
        Err(ClockError::EnableFailed)
    }
}

/// Build a `TimerDevice` over a fresh mock register file.
///
/// Returns the shared register file alongside the device so tests can
/// inspect and seed registers directly.
pub(crate) fn mock_device(clk_per_rate: u32) -> (Arc<MockGpt>, TimerDevice) {
    mock_device_with_variant(clk_per_rate, &IMX8M_GPT)
}

/// [`mock_device`] with a caller-chosen variant descriptor.
pub(crate) fn mock_device_with_variant(
    clk_per_rate: u32,
    variant: &'static GptVariant,
) -> (Arc<MockGpt>, TimerDevice) {
    let regs = MockGpt::new();
    let dev = TimerDevice::new(
        Box::new(SharedRegs(regs.clone())),
        55,
        Box::new(FixedClock::new(clk_per_rate)),
        Box::new(FixedClock::new(66_000_000)),
        variant,
    );
    (regs, dev)
}

/// Platform device double with per-resource knockouts.
pub(crate) struct MockPlatformDevice {
    pub(crate) compatible: &'static str,
    pub(crate) regs: Arc<MockGpt>,
    pub(crate) provide_regs: bool,
    pub(crate) irq: Option<IrqNumber>,
    pub(crate) clocks: Vec<(&'static str, u32)>,
    pub(crate) failing_clocks: bool,
}

impl MockPlatformDevice {
    /// A fully-provisioned device: registers, IRQ 55, `ipg` and `osc_per`
    /// clocks with `osc_per` at `clk_per_rate`.
    pub(crate) fn new(compatible: &'static str, clk_per_rate: u32) -> Self {
        let mut clocks = Vec::new();
        clocks.push(("ipg", 66_000_000));
        clocks.push(("osc_per", clk_per_rate));
        Self {
            compatible,
            regs: MockGpt::new(),
            provide_regs: true,
            irq: Some(55),
            clocks,
            failing_clocks: false,
        }
    }
}

impl PlatformDevice for MockPlatformDevice {
    fn compatible(&self) -> &str {
        self.compatible
    }

    fn map_registers(&self) -> Option<Box<dyn RegisterIo + Send + Sync>> {
        if self.provide_regs {
            Some(Box::new(SharedRegs(self.regs.clone())))
        } else {
            None
        }
    }

    fn map_irq(&self) -> Option<IrqNumber> {
        self.irq
    }

    fn clock(&self, name: &str) -> Option<Box<dyn Clock + Send + Sync>> {
        let (_, rate) = self.clocks.iter().find(|(n, _)| *n == name)?;
        if self.failing_clocks {
            Some(Box::new(FailingClock))
        } else {
            Some(Box::new(FixedClock::new(*rate)))
        }
    }
}
