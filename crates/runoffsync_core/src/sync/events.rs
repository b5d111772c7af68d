//! Notifications raised by the sync layer for the host.

use crate::model::basin::NodeId;
use crate::model::element_data::ConceptKind;
use crate::model::meteo::{DistributionMode, MeteoKind};
use crate::model::stations::StationListKind;

/// Identity of one derived record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKey {
    Catchment { node: NodeId, concept: ConceptKind },
    Boundary { node: NodeId },
}

impl ElementKey {
    /// Node the record belongs to.
    pub fn node(&self) -> NodeId {
        match self {
            Self::Catchment { node, .. } | Self::Boundary { node } => *node,
        }
    }
}

/// Host-visible outcome of one synchronization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    ElementAdded(ElementKey),
    ElementRemoved(ElementKey),
    DistributionChanged {
        kind: MeteoKind,
        from: DistributionMode,
        to: DistributionMode,
    },
    /// A record lost its station because the station left its list.
    StationAssignmentCleared {
        node: NodeId,
        list: StationListKind,
        station: String,
    },
    /// Fresh link: every record was discarded and rebuilt.
    RegistryRebuilt {
        catchment_records: usize,
        boundary_records: usize,
    },
    /// Relink: existing records were re-pointed by position.
    Relinked { catchments: usize, boundaries: usize },
}
