//! Domain model for basin graphs and their derived runoff data.
//!
//! # Responsibility
//! - Define the drainage basin graph and the events it raises.
//! - Define the per-node records, meteo datasets and station lists that are
//!   kept in sync with the graph by `crate::sync`.
//!
//! # Invariants
//! - Nodes are identified by a stable `NodeId`; records never own nodes.
//! - Model types only queue or return events; they never dispatch them.
//!
//! # See also
//! - crate::sync for the observers that consume these events.

pub mod basin;
pub mod coverage;
pub mod element_data;
pub mod factory;
pub mod meteo;
pub mod stations;
