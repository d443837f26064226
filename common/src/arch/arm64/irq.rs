use crate::sync::irq::IrqControl;

const DAIF_I_BIT: u64 = 1 << 7;

pub struct Arm64Irq;

/// Interrupt masking for AArch64 via the `DAIF` flags register.
///
/// `State` is `bool`: whether IRQ delivery was enabled before `disable()`.
/// `restore` only re-enables delivery when it was enabled going in, so
/// nested critical sections compose.
impl IrqControl for Arm64Irq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        let daif: u64;
        // SAFETY: reading DAIF and setting the I mask only affects local
        // interrupt delivery; the prior state is returned for restore.
        unsafe {
            core::arch::asm!(
                "mrs {0}, daif",
                "msr daifset, #2",
                out(reg) daif,
                options(nomem, nostack)
            );
        }
        daif & DAIF_I_BIT == 0
    }

    #[inline(always)]
    fn restore(prev_enabled: bool) {
        if prev_enabled {
            // SAFETY: clearing the I mask re-enables delivery; only done
            // when delivery was enabled before the matching disable().
            unsafe {
                core::arch::asm!("msr daifclr, #2", options(nomem, nostack));
            }
        }
    }
}
