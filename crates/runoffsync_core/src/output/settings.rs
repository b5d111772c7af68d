//! Output settings query surface.
//!
//! # Responsibility
//! - Hold the engine output parameters with their enabled flags.
//! - Answer what the output aggregation builder needs: enabled quantities
//!   per catchment kind, the basin coordinate reference and its catchments.
//!
//! # Invariants
//! - The parameter catalog is fixed; only enabled flags and the aggregation
//!   option change.
//! - Boundary discharge is the only parameter enabled by default.

use crate::model::basin::{Catchment, CatchmentKind, CoordinateSystem, DrainageBasin};
use serde::{Deserialize, Serialize};

/// Output group an engine parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementSet {
    Paved,
    Unpaved,
    Greenhouse,
    OpenWater,
    Sacramento,
    Hbv,
    Nwrw,
    Boundary,
    Link,
    ModelBalance,
}

impl ElementSet {
    /// Element set reporting on catchments of `kind`.
    pub fn for_catchment_kind(kind: CatchmentKind) -> Option<Self> {
        match kind {
            CatchmentKind::Paved => Some(Self::Paved),
            CatchmentKind::Unpaved => Some(Self::Unpaved),
            CatchmentKind::Greenhouse => Some(Self::Greenhouse),
            CatchmentKind::OpenWater => Some(Self::OpenWater),
            CatchmentKind::Sacramento => Some(Self::Sacramento),
            CatchmentKind::Hbv => Some(Self::Hbv),
            CatchmentKind::Nwrw => Some(Self::Nwrw),
            CatchmentKind::Polder | CatchmentKind::Unspecified => None,
        }
    }
}

/// How values are combined over one output time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOption {
    #[default]
    Current,
    Average,
    Maximum,
}

/// One output quantity with its element set and enabled flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParameter {
    pub name: String,
    pub element_set: ElementSet,
    pub is_enabled: bool,
}

/// Quantity enabled by default.
pub const BOUNDARY_DISCHARGE: &str = "Discharge (bnd)";

const PARAMETER_CATALOG: &[(&str, ElementSet)] = &[
    ("Storage RWA (p)", ElementSet::Paved),
    ("Storage DWA (p)", ElementSet::Paved),
    ("Spilling (p)", ElementSet::Paved),
    ("Pumped flow (p)", ElementSet::Paved),
    ("Rainfall (p)", ElementSet::Paved),
    ("Groundwater level (unp)", ElementSet::Unpaved),
    ("Surface runoff (unp)", ElementSet::Unpaved),
    ("Rainfall (unp)", ElementSet::Unpaved),
    ("Actual evaporation (unp)", ElementSet::Unpaved),
    ("Infiltration (unp)", ElementSet::Unpaved),
    ("Storage basins (g)", ElementSet::Greenhouse),
    ("Rainfall (g)", ElementSet::Greenhouse),
    ("Water use (g)", ElementSet::Greenhouse),
    ("Rainfall (ow)", ElementSet::OpenWater),
    ("Evaporation (ow)", ElementSet::OpenWater),
    ("Rainfall (sac)", ElementSet::Sacramento),
    ("Base flow (sac)", ElementSet::Sacramento),
    ("Total runoff (sac)", ElementSet::Sacramento),
    ("Outflow (hbv)", ElementSet::Hbv),
    ("Rainfall (hbv)", ElementSet::Hbv),
    ("Snowfall (hbv)", ElementSet::Hbv),
    ("Temperature (hbv)", ElementSet::Hbv),
    ("Rainfall (nwrw)", ElementSet::Nwrw),
    ("Inflow sewer (nwrw)", ElementSet::Nwrw),
    ("Link flow (lnk)", ElementSet::Link),
    (BOUNDARY_DISCHARGE, ElementSet::Boundary),
    ("Rainfall (bm)", ElementSet::ModelBalance),
    ("Balance error RR Rural (bm)", ElementSet::ModelBalance),
];

/// Engine output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    pub aggregation: AggregationOption,
    pub output_time_step_s: u64,
    parameters: Vec<EngineParameter>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            aggregation: AggregationOption::Current,
            output_time_step_s: 3600,
            parameters: PARAMETER_CATALOG
                .iter()
                .map(|(name, element_set)| EngineParameter {
                    name: (*name).to_string(),
                    element_set: *element_set,
                    is_enabled: *name == BOUNDARY_DISCHARGE,
                })
                .collect(),
        }
    }
}

impl OutputSettings {
    /// Creates settings with only boundary discharge enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Full parameter catalog in engine order.
    pub fn engine_parameters(&self) -> &[EngineParameter] {
        &self.parameters
    }

    /// Looks up one parameter by quantity name.
    pub fn engine_parameter(&self, name: &str) -> Option<&EngineParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Whether `name` is in the catalog.
    pub fn is_known_quantity(&self, name: &str) -> bool {
        self.engine_parameter(name).is_some()
    }

    /// Returns `false` when `name` is not in the catalog.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.parameters.iter_mut().find(|p| p.name == name) {
            Some(parameter) => {
                parameter.is_enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Whether any parameter of `element_set` is enabled.
    pub fn is_output_enabled_for_element_set(&self, element_set: ElementSet) -> bool {
        self.parameters
            .iter()
            .any(|p| p.element_set == element_set && p.is_enabled)
    }

    /// Enables or disables every parameter of `element_set`.
    pub fn toggle_element_set(&mut self, element_set: ElementSet, enabled: bool) {
        for parameter in self
            .parameters
            .iter_mut()
            .filter(|p| p.element_set == element_set)
        {
            parameter.is_enabled = enabled;
        }
    }

    /// Enabled quantity names for catchments of `kind`.
    pub fn enabled_quantities(&self, kind: CatchmentKind) -> Vec<&str> {
        let Some(element_set) = ElementSet::for_catchment_kind(kind) else {
            return Vec::new();
        };
        self.parameters
            .iter()
            .filter(|p| p.element_set == element_set && p.is_enabled)
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// Read-only view handed to the output aggregation builder.
#[derive(Debug, Clone, Copy)]
pub struct OutputBinding<'a> {
    basin: &'a DrainageBasin,
    settings: &'a OutputSettings,
}

impl<'a> OutputBinding<'a> {
    /// Binds the current basin and settings.
    pub fn new(basin: &'a DrainageBasin, settings: &'a OutputSettings) -> Self {
        Self { basin, settings }
    }

    /// Enabled quantity names for catchments of `kind`.
    pub fn enabled_quantities(&self, kind: CatchmentKind) -> Vec<&'a str> {
        self.settings.enabled_quantities(kind)
    }

    /// Coordinate reference of the bound basin.
    pub fn coordinate_system(&self) -> Option<&'a CoordinateSystem> {
        self.basin.coordinate_system()
    }

    /// Catchments of the bound basin, for spatial output.
    pub fn catchments(&self) -> &'a [Catchment] {
        self.basin.catchments()
    }

    /// Aggregation applied over each output time step.
    pub fn aggregation(&self) -> AggregationOption {
        self.settings.aggregation
    }
}
