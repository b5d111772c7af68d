//! Derived per-node records.
//!
//! # Responsibility
//! - Define the catchment model data variants (one per runoff concept).
//! - Define runoff boundary data.
//!
//! # Invariants
//! - A record refers to its node by `NodeId` only; it never owns the node.
//! - `CatchmentModelData::concept_kind()` is the variant tag compared by the
//!   record factory when a catchment changes kind.

use crate::model::basin::NodeId;
use serde::{Deserialize, Serialize};

/// Runoff concept tag of a catchment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptKind {
    Paved,
    Unpaved,
    Greenhouse,
    OpenWater,
    Sacramento,
    Hbv,
    Nwrw,
}

impl ConceptKind {
    /// Stable lowercase name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paved => "paved",
            Self::Unpaved => "unpaved",
            Self::Greenhouse => "greenhouse",
            Self::OpenWater => "open_water",
            Self::Sacramento => "sacramento",
            Self::Hbv => "hbv",
            Self::Nwrw => "nwrw",
        }
    }
}

/// Sewer layout of a paved area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SewerType {
    Mixed,
    Separated,
    ImprovedSeparated,
}

/// Paved-area concept parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PavedData {
    pub sewer_type: SewerType,
    pub street_storage_mm: f64,
    pub sewer_storage_mm: f64,
    pub pump_capacity_m3_s: f64,
}

impl Default for PavedData {
    fn default() -> Self {
        Self {
            sewer_type: SewerType::Mixed,
            street_storage_mm: 1.0,
            sewer_storage_mm: 7.0,
            pump_capacity_m3_s: 0.0,
        }
    }
}

/// Unpaved-area concept parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnpavedData {
    pub surface_level_m: f64,
    pub initial_groundwater_depth_m: f64,
    pub max_land_storage_mm: f64,
    pub infiltration_capacity_mm_h: f64,
}

impl Default for UnpavedData {
    fn default() -> Self {
        Self {
            surface_level_m: 0.0,
            initial_groundwater_depth_m: 1.0,
            max_land_storage_mm: 1.0,
            infiltration_capacity_mm_h: 5.0,
        }
    }
}

/// Greenhouse concept parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenhouseData {
    pub roof_storage_mm: f64,
    pub silo_capacity_m3_ha: f64,
}

impl Default for GreenhouseData {
    fn default() -> Self {
        Self {
            roof_storage_mm: 0.0,
            silo_capacity_m3_ha: 0.0,
        }
    }
}

/// Open water concept; no parameters of its own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpenWaterData {}

/// Sacramento concept parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SacramentoData {
    pub upper_zone_tension_capacity_mm: f64,
    pub upper_zone_free_capacity_mm: f64,
    pub lower_zone_tension_capacity_mm: f64,
}

impl Default for SacramentoData {
    fn default() -> Self {
        Self {
            upper_zone_tension_capacity_mm: 50.0,
            upper_zone_free_capacity_mm: 40.0,
            lower_zone_tension_capacity_mm: 130.0,
        }
    }
}

/// HBV concept parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HbvData {
    pub snowfall_temperature_c: f64,
    pub snow_melt_temperature_c: f64,
    /// Name from the temperature station list; empty when unassigned.
    pub temperature_station_name: String,
}

impl Default for HbvData {
    fn default() -> Self {
        Self {
            snowfall_temperature_c: 0.0,
            snow_melt_temperature_c: 1.0,
            temperature_station_name: String::new(),
        }
    }
}

/// NWRW concept parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NwrwData {
    pub dry_weather_flow_id: String,
    pub number_of_inhabitants: u32,
}

impl Default for NwrwData {
    fn default() -> Self {
        Self {
            dry_weather_flow_id: "Default_DWA".to_string(),
            number_of_inhabitants: 0,
        }
    }
}

/// Concept-specific payload of a catchment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "concept", rename_all = "snake_case")]
pub enum ConceptData {
    Paved(PavedData),
    Unpaved(UnpavedData),
    Greenhouse(GreenhouseData),
    OpenWater(OpenWaterData),
    Sacramento(SacramentoData),
    Hbv(HbvData),
    Nwrw(NwrwData),
}

impl ConceptData {
    /// Default payload for one concept.
    pub fn default_for(kind: ConceptKind) -> Self {
        match kind {
            ConceptKind::Paved => Self::Paved(PavedData::default()),
            ConceptKind::Unpaved => Self::Unpaved(UnpavedData::default()),
            ConceptKind::Greenhouse => Self::Greenhouse(GreenhouseData::default()),
            ConceptKind::OpenWater => Self::OpenWater(OpenWaterData::default()),
            ConceptKind::Sacramento => Self::Sacramento(SacramentoData::default()),
            ConceptKind::Hbv => Self::Hbv(HbvData::default()),
            ConceptKind::Nwrw => Self::Nwrw(NwrwData::default()),
        }
    }

    /// Variant tag of this payload.
    pub fn kind(&self) -> ConceptKind {
        match self {
            Self::Paved(_) => ConceptKind::Paved,
            Self::Unpaved(_) => ConceptKind::Unpaved,
            Self::Greenhouse(_) => ConceptKind::Greenhouse,
            Self::OpenWater(_) => ConceptKind::OpenWater,
            Self::Sacramento(_) => ConceptKind::Sacramento,
            Self::Hbv(_) => ConceptKind::Hbv,
            Self::Nwrw(_) => ConceptKind::Nwrw,
        }
    }
}

/// Model configuration attached to one catchment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchmentModelData {
    /// Non-owning back-reference to the catchment.
    pub catchment: NodeId,
    pub calculation_area_m2: f64,
    pub area_adjustment_factor: f64,
    /// Name from the meteo station list; empty when unassigned.
    pub meteo_station_name: String,
    pub concept: ConceptData,
}

impl CatchmentModelData {
    /// Creates a record for `catchment` with no station assigned.
    pub fn new(catchment: NodeId, concept: ConceptData) -> Self {
        Self {
            catchment,
            calculation_area_m2: 0.0,
            area_adjustment_factor: 1.0,
            meteo_station_name: String::new(),
            concept,
        }
    }

    /// Variant tag of the record's concept payload.
    pub fn concept_kind(&self) -> ConceptKind {
        self.concept.kind()
    }

    /// Temperature station of an HBV record, `None` for other concepts.
    pub fn temperature_station_name(&self) -> Option<&str> {
        match &self.concept {
            ConceptData::Hbv(hbv) => Some(hbv.temperature_station_name.as_str()),
            _ => None,
        }
    }

    /// Sets the temperature station of an HBV record.
    ///
    /// Returns `false` (and changes nothing) for other concepts.
    pub fn set_temperature_station_name(&mut self, name: impl Into<String>) -> bool {
        match &mut self.concept {
            ConceptData::Hbv(hbv) => {
                hbv.temperature_station_name = name.into();
                true
            }
            _ => false,
        }
    }
}

/// Boundary condition attached to one runoff boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunoffBoundaryData {
    /// Non-owning back-reference to the boundary.
    pub boundary: NodeId,
    pub is_time_series: bool,
    pub constant_water_level_m: f64,
}

impl RunoffBoundaryData {
    /// Creates a constant-level boundary record for `boundary`.
    pub fn new(boundary: NodeId) -> Self {
        Self {
            boundary,
            is_time_series: false,
            constant_water_level_m: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CatchmentModelData, ConceptData, ConceptKind};
    use uuid::Uuid;

    #[test]
    fn default_payload_matches_requested_kind() {
        for kind in [
            ConceptKind::Paved,
            ConceptKind::Unpaved,
            ConceptKind::Greenhouse,
            ConceptKind::OpenWater,
            ConceptKind::Sacramento,
            ConceptKind::Hbv,
            ConceptKind::Nwrw,
        ] {
            assert_eq!(ConceptData::default_for(kind).kind(), kind);
        }
    }

    #[test]
    fn temperature_station_only_applies_to_hbv() {
        let mut hbv =
            CatchmentModelData::new(Uuid::new_v4(), ConceptData::default_for(ConceptKind::Hbv));
        assert!(hbv.set_temperature_station_name("De Bilt"));
        assert_eq!(hbv.temperature_station_name(), Some("De Bilt"));

        let mut paved =
            CatchmentModelData::new(Uuid::new_v4(), ConceptData::default_for(ConceptKind::Paved));
        assert!(!paved.set_temperature_station_name("De Bilt"));
        assert_eq!(paved.temperature_station_name(), None);
    }
}
