//! Graph-to-derived-data synchronization.
//!
//! # Responsibility
//! - React to basin events, basin redirection and meteo/station signals.
//! - Keep the element data store and meteo datasets consistent with them.
//!
//! # Invariants
//! - Every reaction runs to completion before control returns to the caller.
//! - Components never own the state they write; the host passes it in per
//!   call through a context struct.
//!
//! # See also
//! - crate::service::runoff_model for the host that wires these together.

pub mod events;
pub mod graph_observer;
pub mod guard;
pub mod meteo_sync;
pub mod relink;
