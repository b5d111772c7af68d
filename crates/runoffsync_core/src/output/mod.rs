//! Read-only output settings consumed by the output aggregation builder.

pub mod settings;
