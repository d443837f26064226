//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! This module defines generic traits for the resources a timer driver
//! consumes and the capability table it exposes. Platform code implements
//! the traits; everything above it stays hardware-agnostic.
//!
//! # Design Principles
//!
//! - **Zero-cost abstractions**: Traits compile to direct hardware access
//! - **Testability**: Every hardware seam can be replaced by a test double
//! - **No platform leakage**: Traits must not reference platform-specific types
//!
//! # Available Interfaces
//!
//! - [`regio`]: Raw register block access
//! - [`clock`]: Clock handles (rate query, gating on)
//! - [`timer`]: The GPT capability table and bound-device model

pub mod clock;
pub mod regio;
pub mod timer;
