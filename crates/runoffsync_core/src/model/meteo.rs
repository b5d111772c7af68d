//! Meteorological input datasets.
//!
//! # Responsibility
//! - Hold precipitation, evaporation and temperature with their distribution
//!   mode, edit-session flag and both representations (station argument and
//!   catchment feature coverage).
//! - Report edit-session end and mode changes as `MeteoEvent`s.
//!
//! # Invariants
//! - Station argument values are unique.
//! - Setting the current mode again reports nothing.

use crate::model::coverage::FeatureCoverage;
use crate::model::stations::StationListKind;
use serde::{Deserialize, Serialize};

/// Meteorological quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeteoKind {
    Precipitation,
    Evaporation,
    Temperature,
}

impl MeteoKind {
    /// Every dataset kind, in model order.
    pub const ALL: [MeteoKind; 3] = [Self::Precipitation, Self::Evaporation, Self::Temperature];

    /// Stable lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Precipitation => "precipitation",
            Self::Evaporation => "evaporation",
            Self::Temperature => "temperature",
        }
    }

    /// External station list feeding this dataset in per-station mode.
    pub fn station_list(self) -> StationListKind {
        match self {
            Self::Precipitation | Self::Evaporation => StationListKind::Meteo,
            Self::Temperature => StationListKind::Temperature,
        }
    }
}

/// Spatial/tabular representation of a meteo quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    #[default]
    Global,
    PerStation,
    PerFeature,
}

impl DistributionMode {
    /// Stable snake_case name used in logs and config.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::PerStation => "per_station",
            Self::PerFeature => "per_feature",
        }
    }
}

/// Signals raised by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeteoEvent {
    /// Editing flag went from `true` to `false`.
    EditEnded(MeteoKind),
    DistributionChanged {
        kind: MeteoKind,
        from: DistributionMode,
        to: DistributionMode,
    },
}

/// One meteo dataset with its distribution mode and representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteoData {
    kind: MeteoKind,
    mode: DistributionMode,
    #[serde(skip)]
    editing: bool,
    station_values: Vec<String>,
    features: FeatureCoverage,
}

impl MeteoData {
    /// Creates a global dataset with empty representations.
    pub fn new(kind: MeteoKind) -> Self {
        Self {
            kind,
            mode: DistributionMode::Global,
            editing: false,
            station_values: Vec::new(),
            features: FeatureCoverage::with_default_value(kind.as_str(), 0.0),
        }
    }

    /// Which quantity this dataset holds.
    pub fn kind(&self) -> MeteoKind {
        self.kind
    }

    /// Current distribution mode.
    pub fn mode(&self) -> DistributionMode {
        self.mode
    }

    /// Whether an edit session is open.
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Opens an edit session.
    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    /// Closes the edit session; reports only a real `true -> false` transition.
    pub fn end_edit(&mut self) -> Option<MeteoEvent> {
        if !self.editing {
            return None;
        }
        self.editing = false;
        Some(MeteoEvent::EditEnded(self.kind))
    }

    /// Changes the mode; `None` when `mode` is already current.
    pub fn set_distribution(&mut self, mode: DistributionMode) -> Option<MeteoEvent> {
        if self.mode == mode {
            return None;
        }
        let from = std::mem::replace(&mut self.mode, mode);
        Some(MeteoEvent::DistributionChanged {
            kind: self.kind,
            from,
            to: mode,
        })
    }

    /// Station names of the station argument, in table order.
    pub fn station_values(&self) -> &[String] {
        &self.station_values
    }

    /// Whether the station argument lists `name`.
    pub fn contains_station(&self, name: &str) -> bool {
        self.station_values.iter().any(|s| s == name)
    }

    /// Appends a station; blank and repeated names are refused.
    pub fn add_station_value(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.trim().is_empty() || self.contains_station(&name) {
            return false;
        }
        self.station_values.push(name);
        true
    }

    /// Removes a station; `false` when it was not listed.
    pub fn remove_station_value(&mut self, name: &str) -> bool {
        let before = self.station_values.len();
        self.station_values.retain(|s| s != name);
        self.station_values.len() != before
    }

    /// Clears the station argument and refills it, skipping duplicates.
    pub fn replace_station_values<I, T>(&mut self, names: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.station_values.clear();
        for name in names {
            self.add_station_value(name);
        }
    }

    /// Per-feature representation.
    pub fn features(&self) -> &FeatureCoverage {
        &self.features
    }

    /// Mutable per-feature representation.
    pub fn features_mut(&mut self) -> &mut FeatureCoverage {
        &mut self.features
    }
}

/// The three datasets of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteoDataSet {
    pub precipitation: MeteoData,
    pub evaporation: MeteoData,
    pub temperature: MeteoData,
}

impl Default for MeteoDataSet {
    fn default() -> Self {
        Self {
            precipitation: MeteoData::new(MeteoKind::Precipitation),
            evaporation: MeteoData::new(MeteoKind::Evaporation),
            temperature: MeteoData::new(MeteoKind::Temperature),
        }
    }
}

impl MeteoDataSet {
    /// Dataset of `kind`.
    pub fn get(&self, kind: MeteoKind) -> &MeteoData {
        match kind {
            MeteoKind::Precipitation => &self.precipitation,
            MeteoKind::Evaporation => &self.evaporation,
            MeteoKind::Temperature => &self.temperature,
        }
    }

    /// Mutable dataset of `kind`.
    pub fn get_mut(&mut self, kind: MeteoKind) -> &mut MeteoData {
        match kind {
            MeteoKind::Precipitation => &mut self.precipitation,
            MeteoKind::Evaporation => &mut self.evaporation,
            MeteoKind::Temperature => &mut self.temperature,
        }
    }

    /// All three datasets in model order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MeteoData> {
        [
            &mut self.precipitation,
            &mut self.evaporation,
            &mut self.temperature,
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{DistributionMode, MeteoData, MeteoEvent, MeteoKind};

    #[test]
    fn end_edit_reports_only_real_transition() {
        let mut precipitation = MeteoData::new(MeteoKind::Precipitation);
        assert_eq!(precipitation.end_edit(), None);

        precipitation.begin_edit();
        assert!(precipitation.is_editing());
        assert_eq!(
            precipitation.end_edit(),
            Some(MeteoEvent::EditEnded(MeteoKind::Precipitation))
        );
        assert!(!precipitation.is_editing());
    }

    #[test]
    fn set_distribution_reports_previous_mode() {
        let mut evaporation = MeteoData::new(MeteoKind::Evaporation);
        assert_eq!(evaporation.set_distribution(DistributionMode::Global), None);
        assert_eq!(
            evaporation.set_distribution(DistributionMode::PerFeature),
            Some(MeteoEvent::DistributionChanged {
                kind: MeteoKind::Evaporation,
                from: DistributionMode::Global,
                to: DistributionMode::PerFeature,
            })
        );
    }

    #[test]
    fn station_values_stay_unique() {
        let mut temperature = MeteoData::new(MeteoKind::Temperature);
        temperature.replace_station_values(["A", "B", "A", " "]);
        assert_eq!(temperature.station_values(), &["A", "B"]);
        assert!(temperature.remove_station_value("A"));
        assert!(!temperature.remove_station_value("A"));
    }

    #[test]
    fn station_list_source_depends_on_quantity() {
        use crate::model::stations::StationListKind;
        assert_eq!(
            MeteoKind::Evaporation.station_list(),
            StationListKind::Meteo
        );
        assert_eq!(
            MeteoKind::Temperature.station_list(),
            StationListKind::Temperature
        );
    }
}
