//! Feature coverage: a spatial surface with one value per catchment feature.

use crate::model::basin::{CoordinateSystem, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value stored for features that were never assigned one.
pub const UNDEFINED_VALUE: f64 = -999.0;

/// Per-catchment values of one quantity, aligned with an ordered feature list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCoverage {
    name: String,
    coordinate_system: Option<CoordinateSystem>,
    features: Vec<NodeId>,
    values: Vec<f64>,
    default_value: f64,
}

impl FeatureCoverage {
    /// Creates an empty coverage whose default value is `UNDEFINED_VALUE`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_default_value(name, UNDEFINED_VALUE)
    }

    /// Creates an empty coverage with a custom default for new features.
    pub fn with_default_value(name: impl Into<String>, default_value: f64) -> Self {
        Self {
            name: name.into(),
            coordinate_system: None,
            features: Vec::new(),
            values: Vec::new(),
            default_value,
        }
    }

    /// Quantity name of the coverage.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coordinate reference mirrored from the basin.
    pub fn coordinate_system(&self) -> Option<&CoordinateSystem> {
        self.coordinate_system.as_ref()
    }

    /// Mirrors a new basin coordinate reference.
    pub fn set_coordinate_system(&mut self, coordinate_system: Option<CoordinateSystem>) {
        self.coordinate_system = coordinate_system;
    }

    /// Member catchments in insertion order.
    pub fn features(&self) -> &[NodeId] {
        &self.features
    }

    /// Number of member catchments.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the coverage has no members.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Whether `feature` is a member.
    pub fn contains(&self, feature: NodeId) -> bool {
        self.features.contains(&feature)
    }

    /// Adds a feature with the default value. Returns `false` when present.
    pub fn add_feature(&mut self, feature: NodeId) -> bool {
        if self.contains(feature) {
            return false;
        }
        self.features.push(feature);
        self.values.push(self.default_value);
        true
    }

    /// Removes a member and its value; `false` when absent.
    pub fn remove_feature(&mut self, feature: NodeId) -> bool {
        let Some(index) = self.features.iter().position(|f| *f == feature) else {
            return false;
        };
        self.features.remove(index);
        self.values.remove(index);
        true
    }

    /// Drops every member and value.
    pub fn clear(&mut self) {
        self.features.clear();
        self.values.clear();
    }

    /// Value of one member, `None` for non-members.
    pub fn value(&self, feature: NodeId) -> Option<f64> {
        let index = self.features.iter().position(|f| *f == feature)?;
        self.values.get(index).copied()
    }

    /// Sets the value of one member; `false` for non-members.
    pub fn set_value(&mut self, feature: NodeId, value: f64) -> bool {
        let Some(index) = self.features.iter().position(|f| *f == feature) else {
            return false;
        };
        self.values[index] = value;
        true
    }

    /// Re-points features through an old-to-new id mapping, keeping values.
    ///
    /// Features missing from the mapping are dropped.
    pub fn remap_features(&mut self, mapping: &HashMap<NodeId, NodeId>) {
        let mut features = Vec::with_capacity(self.features.len());
        let mut values = Vec::with_capacity(self.values.len());
        for (feature, value) in self.features.iter().zip(self.values.iter()) {
            if let Some(mapped) = mapping.get(feature) {
                features.push(*mapped);
                values.push(*value);
            }
        }
        self.features = features;
        self.values = values;
    }
}
