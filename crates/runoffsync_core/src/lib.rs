//! Graph-to-derived-data synchronization engine for rainfall-runoff models.
//! This crate keeps per-node model data, meteo datasets and station lists
//! consistent with an editable drainage basin graph.

pub mod config;
pub mod logging;
pub mod model;
pub mod output;
pub mod repo;
pub mod service;
pub mod sync;

pub use config::{ConfigError, ConfigResult, LoggingConfig, MeteoConfig, OutputConfig, SyncConfig};
pub use logging::{default_log_dir, default_log_level, init_logging, init_logging_at, logging_status};
pub use model::basin::{
    BasinError, BasinEvent, BasinId, Boundary, Catchment, CatchmentKind, CoordinateSystem,
    DrainageBasin, NodeClass, NodeId, NodeRef,
};
pub use model::coverage::{FeatureCoverage, UNDEFINED_VALUE};
pub use model::element_data::{CatchmentModelData, ConceptData, ConceptKind, RunoffBoundaryData};
pub use model::meteo::{DistributionMode, MeteoData, MeteoKind};
pub use model::stations::{StationList, StationListError, StationListKind};
pub use output::settings::{AggregationOption, ElementSet, OutputBinding, OutputSettings};
pub use repo::element_registry::{ElementDataRegistry, ModelDataStore, RegistryError};
pub use service::runoff_model::{ModelError, ModelResult, RunoffModel};
pub use sync::events::{ElementKey, ModelEvent};
pub use sync::relink::{LinkState, RelinkError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
