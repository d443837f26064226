//! i.MX GPT Platform Driver
//!
//! Variant matching, device bind, and the one-time initialization
//! sequence. The operation tables themselves live in [`gpt`]; this module
//! decides which table a device gets and drives it through bring-up.

pub mod gpt;
#[cfg(test)]
pub(crate) mod mock;

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU8, Ordering};

use common::sync::SpinLock;

use crate::device_manager::{Device, devices};
use crate::hal::timer::{EdgeMode, GptVariant, TimerDevice, TimerError};
use crate::platform::{BindError, PlatformDevice};

use gpt::GptV2;

/// v2 operation table instance shared by every matching variant.
static V2_OPS: GptV2 = GptV2;

/// The i.MX8M-generation GPT.
pub static IMX8M_GPT: GptVariant = GptVariant {
    name: "imx8m-gpt",
    compatible: &["fsl,imx8mn-gpt", "fsl,imx8mm-gpt", "fsl,imx8mp-gpt"],
    ops: &V2_OPS,
};

/// Variants known to this driver, in match order.
static VARIANTS: &[&GptVariant] = &[&IMX8M_GPT];

/// Match a compatibility string to a hardware variant.
///
/// Consulted once per device at bind time; the resolved variant never
/// changes for the life of the instance.
pub fn of_match(compatible: &str) -> Option<&'static GptVariant> {
    VARIANTS
        .iter()
        .copied()
        .find(|v| v.compatible.contains(&compatible))
}

// ============================================================================
// Initialization Sequencer
// ============================================================================

const LATCH_IDLE: u8 = 0;
const LATCH_RUNNING: u8 = 1;
const LATCH_DONE: u8 = 2;
const LATCH_FAILED: u8 = 3;

/// One-shot guard for the initialization sequence.
///
/// The sequence must run at most once per process no matter how many times
/// the hardware is (re)discovered. The latch is an explicit object rather
/// than a hidden static so the one-time contract is visible in the API and
/// tests can run the sequencer against their own instance.
pub struct InitLatch {
    state: AtomicU8,
    failure: SpinLock<Option<TimerError>>,
}

impl InitLatch {
    /// Create a latch in the idle state.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(LATCH_IDLE),
            failure: SpinLock::new(None),
        }
    }

    /// Claim the latch for a run.
    ///
    /// `Ok(true)` means the caller owns the run and must settle the latch
    /// with [`complete`](Self::complete) or [`fail`](Self::fail).
    /// `Ok(false)` means the sequence already ran (or is running) and the
    /// caller must not touch the hardware. A previously failed run returns
    /// its error.
    fn try_claim(&self) -> Result<bool, TimerError> {
        match self.state.compare_exchange(
            LATCH_IDLE,
            LATCH_RUNNING,
            Ordering::Acquire,
            Ordering::Acquire,
        ) {
            Ok(_) => Ok(true),
            Err(LATCH_FAILED) => {
                if let Some(err) = *self.failure.lock() {
                    Err(err)
                } else {
                    Ok(false)
                }
            }
            Err(_) => Ok(false),
        }
    }

    fn complete(&self) {
        self.state.store(LATCH_DONE, Ordering::Release);
    }

    fn fail(&self, err: TimerError) {
        *self.failure.lock() = Some(err);
        self.state.store(LATCH_FAILED, Ordering::Release);
    }
}

impl Default for InitLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the one-time hardware initialization.
///
/// Protocol: `setup` → compare channel 1 armed at the counter maximum →
/// capture channel 1 on both edges → capture channel 1 interrupt unmasked
/// → counter enabled. Returns `Ok(true)` when this call performed the
/// sequence and `Ok(false)` when an earlier call already had; in the
/// latter case no register is touched.
///
/// There is no rollback of completed steps: on a mid-sequence error the
/// counter is stopped, the latch parks in its terminal failed state, and
/// every later call returns the same error.
pub fn run_init(latch: &InitLatch, dev: &TimerDevice) -> Result<bool, TimerError> {
    if !latch.try_claim()? {
        return Ok(false);
    }

    match init_sequence(dev) {
        Ok(()) => {
            latch.complete();
            log::debug!("gpt: init sequence complete");
            Ok(true)
        }
        Err(err) => {
            // Leave the hardware configured-but-stopped.
            dev.ops().disable(dev);
            latch.fail(err);
            log::warn!("gpt: init sequence failed: {:?}", err);
            Err(err)
        }
    }
}

fn init_sequence(dev: &TimerDevice) -> Result<(), TimerError> {
    let ops = dev.ops();

    ops.setup(dev);
    ops.oc_setup(dev, 1, 0xFFFF_FFFF)?;
    ops.ic_setup(dev, 1, EdgeMode::Both)?;
    ops.ic_irq_enable(dev, 1)?;
    ops.enable(dev);

    Ok(())
}

// ============================================================================
// Probe
// ============================================================================

/// Process-wide latch for the boot-time GPT bring-up.
static GPT_INIT: InitLatch = InitLatch::new();

/// Name the bound instance registers under in the device manager.
const GPT_DEVICE_NAME: &str = "gpt0";

/// Acquire resources for a matched device and bring the hardware up.
///
/// Resource order follows the hardware's needs: registers, interrupt
/// line, bus-interface clock, then the counting clock (the crystal-derived
/// `osc_per` when the platform provides it, plain `per` otherwise). Any
/// failure drops the handles acquired so far.
fn bind(pdev: &dyn PlatformDevice, latch: &InitLatch) -> Result<Arc<TimerDevice>, BindError> {
    let variant = of_match(pdev.compatible()).ok_or(BindError::UnknownVariant)?;

    let regs = pdev.map_registers().ok_or(BindError::MapFailed)?;
    let irq = pdev.map_irq().ok_or(BindError::IrqMapFailed)?;

    let clk_ipg = pdev.clock("ipg").ok_or(BindError::ClockUnavailable)?;
    let clk_per = pdev
        .clock("osc_per")
        .or_else(|| pdev.clock("per"))
        .ok_or(BindError::ClockUnavailable)?;

    clk_ipg.prepare_enable()?;
    clk_per.prepare_enable()?;

    let dev = Arc::new(TimerDevice::new(regs, irq, clk_per, clk_ipg, variant));

    run_init(latch, &dev)?;

    Ok(dev)
}

/// Bind a matched GPT platform device.
///
/// The first successful probe maps the hardware, runs the one-time
/// initialization sequence, and registers the instance with the device
/// manager. Probing again afterwards returns the already-bound instance
/// without touching the hardware.
pub fn probe(pdev: &dyn PlatformDevice) -> Result<Arc<TimerDevice>, BindError> {
    if let Some(existing) = devices().lock().timer(GPT_DEVICE_NAME) {
        log::debug!("gpt: already bound, returning existing instance");
        return Ok(existing);
    }

    let dev = bind(pdev, &GPT_INIT)?;

    devices()
        .lock()
        .register(GPT_DEVICE_NAME.into(), Device::new_timer(dev.clone()));

    log::info!(
        "gpt: bound {} ({}) irq {}",
        GPT_DEVICE_NAME,
        dev.variant().name,
        dev.irq()
    );

    Ok(dev)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::gpt::{
        CR_EN, CR_IM1_SHIFT, CR_IM_FIELD, IR_OFFSET, OCR1_OFFSET, RATE_OSC_DIV8, SR_IF1,
    };
    use super::mock::{MockPlatformDevice, mock_device};
    use super::*;
    use crate::hal::timer::GptOps;
    use std::thread;
    use std::vec::Vec;

    #[test]
    fn of_match_knows_every_imx8m_compatible() {
        for compatible in ["fsl,imx8mn-gpt", "fsl,imx8mm-gpt", "fsl,imx8mp-gpt"] {
            let variant = of_match(compatible).unwrap();
            assert_eq!(variant.name, "imx8m-gpt");
        }
    }

    #[test]
    fn of_match_rejects_unknown_compatibles() {
        assert!(of_match("fsl,imx6q-gpt").is_none());
        assert!(of_match("").is_none());
    }

    #[test]
    fn init_sequence_configures_and_starts_the_timer() {
        let (regs, dev) = mock_device(RATE_OSC_DIV8);
        let latch = InitLatch::new();

        assert_eq!(run_init(&latch, &dev), Ok(true));

        let cr = regs.get(super::gpt::CR_OFFSET);
        assert_ne!(cr & CR_EN, 0, "counter must be running");
        assert_eq!(
            cr >> CR_IM1_SHIFT & CR_IM_FIELD,
            EdgeMode::Both.bits(),
            "capture channel 1 must trigger on both edges"
        );
        assert_eq!(regs.get(OCR1_OFFSET), 0xFFFF_FFFF);
        assert_eq!(regs.get(IR_OFFSET), SR_IF1);
    }

    #[test]
    fn init_sequence_runs_only_once_per_latch() {
        let (regs, dev) = mock_device(RATE_OSC_DIV8);
        let latch = InitLatch::new();

        assert_eq!(run_init(&latch, &dev), Ok(true));
        let writes_after_first = regs.write_count();

        assert_eq!(run_init(&latch, &dev), Ok(false));
        assert_eq!(
            regs.write_count(),
            writes_after_first,
            "a repeated run must not touch any register"
        );
    }

    #[test]
    fn failed_init_parks_the_latch() {
        struct FailingOps;

        impl GptOps for FailingOps {
            fn setup(&self, _dev: &TimerDevice) {}
            fn enable(&self, _dev: &TimerDevice) {}
            fn disable(&self, _dev: &TimerDevice) {}
            fn irq_acknowledge(&self, _dev: &TimerDevice) {}
            fn is_rollover(&self, _dev: &TimerDevice) -> bool {
                false
            }
            fn oc_setup(&self, _: &TimerDevice, _: u32, _: u32) -> Result<(), TimerError> {
                Err(TimerError::InvalidChannel)
            }
            fn oc_irq_enable(&self, _: &TimerDevice, _: u32) -> Result<(), TimerError> {
                Ok(())
            }
            fn oc_irq_disable(&self, _: &TimerDevice, _: u32) -> Result<(), TimerError> {
                Ok(())
            }
            fn oc_irq_acknowledge(&self, _: &TimerDevice, _: u32) -> Result<(), TimerError> {
                Ok(())
            }
            fn oc_is_irq(&self, _: &TimerDevice, _: u32) -> Result<bool, TimerError> {
                Ok(false)
            }
            fn ic_setup(&self, _: &TimerDevice, _: u32, _: EdgeMode) -> Result<(), TimerError> {
                Ok(())
            }
            fn ic_irq_enable(&self, _: &TimerDevice, _: u32) -> Result<(), TimerError> {
                Ok(())
            }
            fn ic_irq_disable(&self, _: &TimerDevice, _: u32) -> Result<(), TimerError> {
                Ok(())
            }
            fn ic_irq_acknowledge(&self, _: &TimerDevice, _: u32) -> Result<(), TimerError> {
                Ok(())
            }
            fn ic_is_irq(&self, _: &TimerDevice, _: u32) -> Result<bool, TimerError> {
                Ok(false)
            }
        }

        static FAILING_OPS: FailingOps = FailingOps;
        static FAILING_VARIANT: GptVariant = GptVariant {
            name: "failing-gpt",
            compatible: &[],
            ops: &FAILING_OPS,
        };

        let (_regs, dev) = mock::mock_device_with_variant(RATE_OSC_DIV8, &FAILING_VARIANT);
        let latch = InitLatch::new();

        assert_eq!(run_init(&latch, &dev), Err(TimerError::InvalidChannel));
        // The latch is terminal: later runs report the original failure.
        assert_eq!(run_init(&latch, &dev), Err(TimerError::InvalidChannel));
    }

    #[test]
    fn concurrent_irq_enables_lose_no_bits() {
        let (regs, dev) = mock_device(RATE_OSC_DIV8);
        let dev = Arc::new(dev);

        let mut handles = Vec::new();
        for oc in [true, false] {
            let dev = dev.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    if oc {
                        dev.ops().oc_irq_enable(&dev, 1).unwrap();
                    } else {
                        dev.ops().ic_irq_enable(&dev, 1).unwrap();
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(regs.get(IR_OFFSET), super::gpt::SR_OF1 | SR_IF1);
    }

    #[test]
    fn bind_reports_each_missing_resource() {
        let latch = InitLatch::new();

        let pdev = MockPlatformDevice::new("nope,not-a-gpt", RATE_OSC_DIV8);
        assert_eq!(
            bind(&pdev, &latch).unwrap_err(),
            BindError::UnknownVariant
        );

        let mut pdev = MockPlatformDevice::new("fsl,imx8mm-gpt", RATE_OSC_DIV8);
        pdev.provide_regs = false;
        assert_eq!(bind(&pdev, &latch).unwrap_err(), BindError::MapFailed);

        let mut pdev = MockPlatformDevice::new("fsl,imx8mm-gpt", RATE_OSC_DIV8);
        pdev.irq = None;
        assert_eq!(bind(&pdev, &latch).unwrap_err(), BindError::IrqMapFailed);

        let mut pdev = MockPlatformDevice::new("fsl,imx8mm-gpt", RATE_OSC_DIV8);
        pdev.clocks.retain(|(name, _)| *name != "ipg");
        assert_eq!(
            bind(&pdev, &latch).unwrap_err(),
            BindError::ClockUnavailable
        );
    }

    #[test]
    fn bind_falls_back_from_osc_per_to_per() {
        let latch = InitLatch::new();

        let mut pdev = MockPlatformDevice::new("fsl,imx8mm-gpt", RATE_OSC_DIV8);
        pdev.clocks.retain(|(name, _)| *name != "osc_per");
        pdev.clocks.push(("per", 66_000_000));

        let dev = bind(&pdev, &latch).unwrap();
        assert_eq!(dev.clk_per().rate(), 66_000_000);
    }

    #[test]
    fn bind_maps_clock_enable_failure_to_clock_unavailable() {
        let latch = InitLatch::new();

        let mut pdev = MockPlatformDevice::new("fsl,imx8mm-gpt", RATE_OSC_DIV8);
        pdev.failing_clocks = true;
        assert_eq!(
            bind(&pdev, &latch).unwrap_err(),
            BindError::ClockUnavailable
        );
        // Bind never reached the hardware.
        assert_eq!(pdev.regs.write_count(), 0);
    }

    #[test]
    fn probe_binds_once_and_reuses_the_instance() {
        let pdev = MockPlatformDevice::new("fsl,imx8mn-gpt", RATE_OSC_DIV8);

        let first = probe(&pdev).unwrap();
        assert_ne!(pdev.regs.get(super::gpt::CR_OFFSET) & CR_EN, 0);
        assert_eq!(first.irq(), pdev.irq.unwrap());

        let writes_after_first = pdev.regs.write_count();
        let second = probe(&pdev).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            pdev.regs.write_count(),
            writes_after_first,
            "a repeat probe must not touch the hardware"
        );
        assert!(devices().lock().timer("gpt0").is_some());
    }
}
