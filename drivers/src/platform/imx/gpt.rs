//! i.MX GPT v2 Register Layout Driver
//!
//! Operation table implementation for the v2 General Purpose Timer block
//! (i.MX8M family): a 32-bit free-running counter, three output-compare
//! channels, and two input-capture channels sharing one status register
//! and one interrupt-enable register.

use crate::hal::timer::{EdgeMode, GptOps, TimerDevice, TimerError};

// Register offsets
pub(crate) const CR_OFFSET: usize = 0x00;
pub(crate) const PR_OFFSET: usize = 0x04;
pub(crate) const SR_OFFSET: usize = 0x08;
pub(crate) const IR_OFFSET: usize = 0x0C;
pub(crate) const OCR1_OFFSET: usize = 0x10;
pub(crate) const OCR2_OFFSET: usize = 0x14;
pub(crate) const OCR3_OFFSET: usize = 0x18;
pub(crate) const ICR1_OFFSET: usize = 0x1C;
pub(crate) const ICR2_OFFSET: usize = 0x20;
pub(crate) const CNT_OFFSET: usize = 0x24;

// Control Register (CR) bits
pub(crate) const CR_EN: u32 = 1 << 0;
pub(crate) const CR_WAITEN: u32 = 1 << 3;
pub(crate) const CR_CLKSRC_24M: u32 = 5 << 6;
pub(crate) const CR_EN_24M: u32 = 1 << 10;

// Input-capture mode: one 2-bit field per channel in CR
pub(crate) const CR_IM_FIELD: u32 = 0b11;
pub(crate) const CR_IM1_SHIFT: u32 = 16;
pub(crate) const CR_IM2_SHIFT: u32 = 18;

// Prescaler Register (PR): 24 MHz crystal prescaler field,
// divide-by-N encoded as N-1
pub(crate) const PR_PRE24M_DIV3: u32 = 2 << 12;
pub(crate) const PR_PRE24M_DIV8: u32 = 7 << 12;

// Status Register (SR) bits, write-one-to-clear. The interrupt-enable
// register (IR) mirrors this layout bit for bit.
pub(crate) const SR_OF1: u32 = 1 << 0;
pub(crate) const SR_OF2: u32 = 1 << 1;
pub(crate) const SR_OF3: u32 = 1 << 2;
pub(crate) const SR_IF1: u32 = 1 << 3;
pub(crate) const SR_IF2: u32 = 1 << 4;
pub(crate) const SR_ROV: u32 = 1 << 5;

/// Output-compare channel count for this layout.
pub const OC_CHANNELS: u32 = 3;
/// Input-capture channel count for this layout.
pub const IC_CHANNELS: u32 = 2;

/// Counting rate of the crystal source after divide-by-8.
pub(crate) const RATE_OSC_DIV8: u32 = 3_000_000;

// ============================================================================
// Channel Table Resolver
// ============================================================================

/// Channel kinds addressed by the resolver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ChannelKind {
    OutputCompare,
    InputCapture,
}

/// Register coordinates for one channel.
///
/// `reg` is the compare register offset for output-compare channels and
/// the control-register mode-field shift for input-capture channels.
/// `mask` is the channel's bit in both the status and interrupt-enable
/// registers.
#[derive(Debug, Copy, Clone)]
struct ChannelSlot {
    reg: u32,
    mask: u32,
}

const OC_SLOTS: [ChannelSlot; OC_CHANNELS as usize] = [
    ChannelSlot { reg: OCR1_OFFSET as u32, mask: SR_OF1 },
    ChannelSlot { reg: OCR2_OFFSET as u32, mask: SR_OF2 },
    ChannelSlot { reg: OCR3_OFFSET as u32, mask: SR_OF3 },
];

const IC_SLOTS: [ChannelSlot; IC_CHANNELS as usize] = [
    ChannelSlot { reg: CR_IM1_SHIFT, mask: SR_IF1 },
    ChannelSlot { reg: CR_IM2_SHIFT, mask: SR_IF2 },
];

/// Resolve a 1-based channel index to its register coordinates.
///
/// The single bounds check consulted by every channel-scoped operation:
/// index 0 and indices beyond the kind's channel count fail with
/// [`TimerError::InvalidChannel`] before any register is touched.
fn channel_slot(kind: ChannelKind, chan: u32) -> Result<ChannelSlot, TimerError> {
    let table: &[ChannelSlot] = match kind {
        ChannelKind::OutputCompare => &OC_SLOTS,
        ChannelKind::InputCapture => &IC_SLOTS,
    };

    if chan == 0 {
        return Err(TimerError::InvalidChannel);
    }

    table
        .get((chan - 1) as usize)
        .copied()
        .ok_or(TimerError::InvalidChannel)
}

// ============================================================================
// Operation Table
// ============================================================================

/// Operation table for the v2 register layout.
pub struct GptV2;

impl GptV2 {
    /// Set or clear `mask` in the shared interrupt-enable register.
    ///
    /// All IR updates funnel through here so the read-modify-write always
    /// runs under the device's IR lock.
    fn ir_update(dev: &TimerDevice, mask: u32, set: bool) {
        dev.with_ir_lock(|| {
            let mut ir = dev.regs().read32(IR_OFFSET);
            if set {
                ir |= mask;
            } else {
                ir &= !mask;
            }
            dev.regs().write32(IR_OFFSET, ir);
        });
    }
}

impl GptOps for GptV2 {
    fn setup(&self, dev: &TimerDevice) {
        // Known state first: counter stopped, prescaler cleared.
        dev.regs().write32(CR_OFFSET, 0);
        dev.regs().write32(PR_OFFSET, 0);

        // Count from the 24 MHz crystal; keep counting in wait mode.
        let cr = CR_WAITEN | CR_EN_24M | CR_CLKSRC_24M;
        let pr = if dev.clk_per().rate() == RATE_OSC_DIV8 {
            // 24 MHz / 8 = 3 MHz
            PR_PRE24M_DIV8
        } else {
            // 24 MHz / 3 = 8 MHz
            PR_PRE24M_DIV3
        };

        dev.regs().write32(CR_OFFSET, cr);
        dev.regs().write32(PR_OFFSET, pr);
    }

    fn enable(&self, dev: &TimerDevice) {
        let cr = dev.regs().read32(CR_OFFSET);
        dev.regs().write32(CR_OFFSET, cr | CR_EN);
    }

    fn disable(&self, dev: &TimerDevice) {
        let cr = dev.regs().read32(CR_OFFSET);
        dev.regs().write32(CR_OFFSET, cr & !CR_EN);
    }

    fn irq_acknowledge(&self, dev: &TimerDevice) {
        dev.regs().write32(SR_OFFSET, SR_ROV);
    }

    fn is_rollover(&self, dev: &TimerDevice) -> bool {
        dev.regs().read32(SR_OFFSET) & SR_ROV != 0
    }

    fn oc_setup(&self, dev: &TimerDevice, chan: u32, compare: u32) -> Result<(), TimerError> {
        let slot = channel_slot(ChannelKind::OutputCompare, chan)?;
        dev.regs().write32(slot.reg as usize, compare);
        Ok(())
    }

    fn oc_irq_enable(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError> {
        let slot = channel_slot(ChannelKind::OutputCompare, chan)?;
        Self::ir_update(dev, slot.mask, true);
        Ok(())
    }

    fn oc_irq_disable(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError> {
        let slot = channel_slot(ChannelKind::OutputCompare, chan)?;
        Self::ir_update(dev, slot.mask, false);
        Ok(())
    }

    fn oc_irq_acknowledge(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError> {
        let slot = channel_slot(ChannelKind::OutputCompare, chan)?;
        dev.regs().write32(SR_OFFSET, slot.mask);
        Ok(())
    }

    fn oc_is_irq(&self, dev: &TimerDevice, chan: u32) -> Result<bool, TimerError> {
        let slot = channel_slot(ChannelKind::OutputCompare, chan)?;
        Ok(dev.regs().read32(SR_OFFSET) & slot.mask != 0)
    }

    fn ic_setup(&self, dev: &TimerDevice, chan: u32, mode: EdgeMode) -> Result<(), TimerError> {
        let slot = channel_slot(ChannelKind::InputCapture, chan)?;

        // Clear the 2-bit field before setting the new mode so a previous
        // configuration cannot linger.
        let cr = dev.regs().read32(CR_OFFSET);
        let cr = (cr & !(CR_IM_FIELD << slot.reg)) | (mode.bits() << slot.reg);
        dev.regs().write32(CR_OFFSET, cr);
        Ok(())
    }

    fn ic_irq_enable(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError> {
        let slot = channel_slot(ChannelKind::InputCapture, chan)?;
        Self::ir_update(dev, slot.mask, true);
        Ok(())
    }

    fn ic_irq_disable(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError> {
        let slot = channel_slot(ChannelKind::InputCapture, chan)?;
        Self::ir_update(dev, slot.mask, false);
        Ok(())
    }

    fn ic_irq_acknowledge(&self, dev: &TimerDevice, chan: u32) -> Result<(), TimerError> {
        let slot = channel_slot(ChannelKind::InputCapture, chan)?;
        dev.regs().write32(SR_OFFSET, slot.mask);
        Ok(())
    }

    fn ic_is_irq(&self, dev: &TimerDevice, chan: u32) -> Result<bool, TimerError> {
        let slot = channel_slot(ChannelKind::InputCapture, chan)?;
        Ok(dev.regs().read32(SR_OFFSET) & slot.mask != 0)
    }
}

// ============================================================================
// Tests
// ============================================================================
