//! Host-facing use-case layer.
//!
//! # Responsibility
//! - Expose one facade that owns the basin and the derived state.
//! - Keep callers decoupled from the individual sync components.

pub mod runoff_model;
