//! Record storage for derived element data.
//!
//! # Responsibility
//! - Define the storage contract the synchronizers write through.
//! - Keep record lookup details out of the sync and service layers.

pub mod element_registry;
