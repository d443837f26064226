use core::fmt::Debug;

/// Architecture-specific interrupt masking interface.
///
/// Implemented once per architecture in [`crate::arch`].
pub trait IrqControl {
    /// Saved interrupt state
    type State: Copy + Debug;

    /// Disable local interrupt delivery and return the previous state.
    fn disable() -> Self::State;

    /// Restore interrupt delivery to a previously saved state.
    fn restore(state: Self::State);
}
