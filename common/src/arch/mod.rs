//! Architecture selection.
//!
//! Exposes the interrupt-masking implementation for the compilation target
//! as [`CurrentIrq`]. Host builds (unit tests) get a stub that performs no
//! masking; the spinlock part of `IrqSpinLock` still serializes normally.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "aarch64")] {
        pub mod arm64;
        pub use arm64::irq::Arm64Irq as CurrentIrq;
    } else {
        pub mod stub;
        pub use stub::irq::StubIrq as CurrentIrq;
    }
}
