//! Element data registry contracts and in-memory implementation.
//!
//! # Responsibility
//! - Own the derived catchment and boundary records of one model.
//! - Offer lookup by node id and in-place mutation for relink.
//!
//! # Invariants
//! - At most one catchment record and one boundary record per node id.
//! - Iteration order is insertion order.
//! - The registry never creates records itself; callers go through the
//!   record factory.

use crate::model::basin::NodeId;
use crate::model::element_data::{CatchmentModelData, RunoffBoundaryData};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result alias for registry writes.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry write rejected because a record already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateCatchmentData(NodeId),
    DuplicateBoundaryData(NodeId),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateCatchmentData(id) => {
                write!(f, "catchment already has model data: {id}")
            }
            Self::DuplicateBoundaryData(id) => {
                write!(f, "boundary already has model data: {id}")
            }
        }
    }
}

impl Error for RegistryError {}

/// Storage contract for derived per-node records.
pub trait ModelDataStore {
    /// Stores a catchment record; a second record for the same node is rejected.
    fn add_catchment_data(&mut self, data: CatchmentModelData) -> RegistryResult<()>;
    /// Removes the catchment record of `node`, if any.
    fn remove_catchment_data(&mut self, node: NodeId) -> Option<CatchmentModelData>;
    /// Catchment records in insertion order.
    fn catchment_records(&self) -> &[CatchmentModelData];
    /// Mutable catchment records, for in-place re-pointing.
    fn catchment_records_mut(&mut self) -> &mut [CatchmentModelData];

    /// Stores a boundary record; a second record for the same node is rejected.
    fn add_boundary_data(&mut self, data: RunoffBoundaryData) -> RegistryResult<()>;
    /// Removes the boundary record of `node`, if any.
    fn remove_boundary_data(&mut self, node: NodeId) -> Option<RunoffBoundaryData>;
    /// Boundary records in insertion order.
    fn boundary_records(&self) -> &[RunoffBoundaryData];
    /// Mutable boundary records, for in-place re-pointing.
    fn boundary_records_mut(&mut self) -> &mut [RunoffBoundaryData];

    /// Drops every record.
    fn clear(&mut self);

    fn catchment_data(&self, node: NodeId) -> Option<&CatchmentModelData> {
        self.catchment_records()
            .iter()
            .find(|data| data.catchment == node)
    }

    fn catchment_data_mut(&mut self, node: NodeId) -> Option<&mut CatchmentModelData> {
        self.catchment_records_mut()
            .iter_mut()
            .find(|data| data.catchment == node)
    }

    fn boundary_data(&self, node: NodeId) -> Option<&RunoffBoundaryData> {
        self.boundary_records()
            .iter()
            .find(|data| data.boundary == node)
    }

    fn boundary_data_mut(&mut self, node: NodeId) -> Option<&mut RunoffBoundaryData> {
        self.boundary_records_mut()
            .iter_mut()
            .find(|data| data.boundary == node)
    }

    fn len(&self) -> usize {
        self.catchment_records().len() + self.boundary_records().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vec-backed record store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementDataRegistry {
    catchments: Vec<CatchmentModelData>,
    boundaries: Vec<RunoffBoundaryData>,
}

impl ElementDataRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelDataStore for ElementDataRegistry {
    fn add_catchment_data(&mut self, data: CatchmentModelData) -> RegistryResult<()> {
        if self.catchment_data(data.catchment).is_some() {
            return Err(RegistryError::DuplicateCatchmentData(data.catchment));
        }
        self.catchments.push(data);
        Ok(())
    }

    fn remove_catchment_data(&mut self, node: NodeId) -> Option<CatchmentModelData> {
        let index = self.catchments.iter().position(|d| d.catchment == node)?;
        Some(self.catchments.remove(index))
    }

    fn catchment_records(&self) -> &[CatchmentModelData] {
        &self.catchments
    }

    fn catchment_records_mut(&mut self) -> &mut [CatchmentModelData] {
        &mut self.catchments
    }

    fn add_boundary_data(&mut self, data: RunoffBoundaryData) -> RegistryResult<()> {
        if self.boundary_data(data.boundary).is_some() {
            return Err(RegistryError::DuplicateBoundaryData(data.boundary));
        }
        self.boundaries.push(data);
        Ok(())
    }

    fn remove_boundary_data(&mut self, node: NodeId) -> Option<RunoffBoundaryData> {
        let index = self.boundaries.iter().position(|d| d.boundary == node)?;
        Some(self.boundaries.remove(index))
    }

    fn boundary_records(&self) -> &[RunoffBoundaryData] {
        &self.boundaries
    }

    fn boundary_records_mut(&mut self) -> &mut [RunoffBoundaryData] {
        &mut self.boundaries
    }

    fn clear(&mut self) {
        self.catchments.clear();
        self.boundaries.clear();
    }
}
