use crate::sync::irq::IrqControl;

/// No-op interrupt control for targets without local IRQ delivery.
///
/// Used by host-side unit test builds, where there are no interrupts to
/// mask and mutual exclusion comes from the spinlock alone.
pub struct StubIrq;

impl IrqControl for StubIrq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        false
    }

    #[inline(always)]
    fn restore(_prev_enabled: bool) {}
}
