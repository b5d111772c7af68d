//! Drainage basin graph model.
//!
//! # Responsibility
//! - Hold catchments and boundaries in stable iteration order.
//! - Queue one `BasinEvent` per structural or property mutation so the owning
//!   model can forward them to subscribed observers.
//!
//! # Invariants
//! - Node ids are unique across catchments and boundaries of one basin.
//! - Iteration order is insertion order; positional relink depends on it.
//! - Queued events are transient and never serialized.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identity of one catchment or boundary node.
///
/// Derived records hold this id instead of a reference to the node, so a
/// record survives structural churn and can be re-pointed during relink.
pub type NodeId = Uuid;

/// Stable identity of one basin instance.
pub type BasinId = Uuid;

/// Catchment kind tag used to select the derived record variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchmentKind {
    Paved,
    Unpaved,
    Greenhouse,
    OpenWater,
    Sacramento,
    Hbv,
    Nwrw,
    /// Grouping area without its own runoff concept.
    Polder,
    /// Placeholder kind for freshly drawn catchments.
    Unspecified,
}

impl CatchmentKind {
    /// Stable string id used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paved => "paved",
            Self::Unpaved => "unpaved",
            Self::Greenhouse => "greenhouse",
            Self::OpenWater => "open_water",
            Self::Sacramento => "sacramento",
            Self::Hbv => "hbv",
            Self::Nwrw => "nwrw",
            Self::Polder => "polder",
            Self::Unspecified => "unspecified",
        }
    }
}

/// Coordinate reference of a basin and every surface mirroring its geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    pub epsg: u32,
    pub name: String,
}

impl CoordinateSystem {
    /// Creates a coordinate reference from an EPSG code and display name.
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self {
            epsg,
            name: name.into(),
        }
    }
}

/// Node class inside the basin graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    Catchment,
    Boundary,
}

impl NodeClass {
    /// Stable lowercase name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Catchment => "catchment",
            Self::Boundary => "boundary",
        }
    }
}

/// Class-qualified node identity carried by basin events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub class: NodeClass,
    pub id: NodeId,
}

impl NodeRef {
    /// Reference to a catchment node.
    pub fn catchment(id: NodeId) -> Self {
        Self {
            class: NodeClass::Catchment,
            id,
        }
    }

    /// Reference to a boundary node.
    pub fn boundary(id: NodeId) -> Self {
        Self {
            class: NodeClass::Boundary,
            id,
        }
    }
}

/// Hydrological contribution area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catchment {
    pub id: NodeId,
    pub name: String,
    pub kind: CatchmentKind,
    /// Geometric area in square meters.
    pub area_m2: f64,
}

impl Catchment {
    /// Creates a catchment with a generated stable id.
    pub fn new(name: impl Into<String>, kind: CatchmentKind) -> Self {
        Self::with_id(Uuid::new_v4(), name, kind)
    }

    /// Creates a catchment with a caller-provided id.
    pub fn with_id(id: NodeId, name: impl Into<String>, kind: CatchmentKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            area_m2: 0.0,
        }
    }

    /// Sets the catchment area in square meters.
    pub fn with_area(mut self, area_m2: f64) -> Self {
        self.area_m2 = area_m2;
        self
    }
}

/// Terminal node receiving runoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub id: NodeId,
    pub name: String,
}

impl Boundary {
    /// Creates a boundary with a fresh node id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a boundary with a caller-chosen node id.
    pub fn with_id(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Property names reported by `BasinEvent::PropertyChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasinProperty {
    Name,
    CatchmentKind,
    Area,
    CoordinateSystem,
}

/// Owner of a changed property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyTarget {
    Basin,
    Node(NodeRef),
}

/// Structural or property change of one basin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasinEvent {
    NodeAdded(NodeRef),
    NodeRemoved(NodeRef),
    PropertyChanged {
        target: PropertyTarget,
        property: BasinProperty,
    },
}

/// Basin mutation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasinError {
    NodeNotFound(NodeId),
    DuplicateNode(NodeId),
    NotACatchment(NodeId),
}

impl Display for BasinError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "basin node not found: {id}"),
            Self::DuplicateNode(id) => write!(f, "basin node already exists: {id}"),
            Self::NotACatchment(id) => write!(f, "basin node is not a catchment: {id}"),
        }
    }
}

impl Error for BasinError {}

/// Result alias for basin mutations.
pub type BasinResult<T> = Result<T, BasinError>;

/// Graph of catchments and boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrainageBasin {
    id: BasinId,
    name: String,
    coordinate_system: Option<CoordinateSystem>,
    catchments: Vec<Catchment>,
    boundaries: Vec<Boundary>,
    #[serde(skip)]
    pending_events: Vec<BasinEvent>,
}

impl DrainageBasin {
    /// Creates an empty basin with a fresh basin id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates an empty basin with a caller-chosen basin id.
    pub fn with_id(id: BasinId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            coordinate_system: None,
            catchments: Vec::new(),
            boundaries: Vec::new(),
            pending_events: Vec::new(),
        }
    }

    /// Copies nodes and identities into a new basin instance.
    ///
    /// The copy gets a fresh basin id and no queued events, which is what a
    /// model needs when detaching from an externally owned basin.
    pub fn detached_copy(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            coordinate_system: self.coordinate_system.clone(),
            catchments: self.catchments.clone(),
            boundaries: self.boundaries.clone(),
            pending_events: Vec::new(),
        }
    }

    /// Instance identity; changes on `detached_copy`.
    pub fn id(&self) -> BasinId {
        self.id
    }

    /// Display name of the basin.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coordinate reference of the basin geometry, if set.
    pub fn coordinate_system(&self) -> Option<&CoordinateSystem> {
        self.coordinate_system.as_ref()
    }

    /// Catchments in insertion order.
    pub fn catchments(&self) -> &[Catchment] {
        &self.catchments
    }

    /// Boundaries in insertion order.
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Looks up one catchment by node id.
    pub fn catchment(&self, id: NodeId) -> Option<&Catchment> {
        self.catchments.iter().find(|c| c.id == id)
    }

    /// Looks up one boundary by node id.
    pub fn boundary(&self, id: NodeId) -> Option<&Boundary> {
        self.boundaries.iter().find(|b| b.id == id)
    }

    /// Returns the class of a node, if present.
    pub fn node_class(&self, id: NodeId) -> Option<NodeClass> {
        if self.catchment(id).is_some() {
            Some(NodeClass::Catchment)
        } else if self.boundary(id).is_some() {
            Some(NodeClass::Boundary)
        } else {
            None
        }
    }

    /// Whether any node of this basin has `id`.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node_class(id).is_some()
    }

    /// Appends a catchment and queues `NodeAdded`.
    pub fn add_catchment(&mut self, catchment: Catchment) -> BasinResult<NodeId> {
        let id = catchment.id;
        if self.contains(id) {
            return Err(BasinError::DuplicateNode(id));
        }
        self.catchments.push(catchment);
        self.pending_events
            .push(BasinEvent::NodeAdded(NodeRef::catchment(id)));
        Ok(id)
    }

    /// Appends a boundary and queues `NodeAdded`.
    pub fn add_boundary(&mut self, boundary: Boundary) -> BasinResult<NodeId> {
        let id = boundary.id;
        if self.contains(id) {
            return Err(BasinError::DuplicateNode(id));
        }
        self.boundaries.push(boundary);
        self.pending_events
            .push(BasinEvent::NodeAdded(NodeRef::boundary(id)));
        Ok(id)
    }

    /// Removes a catchment or boundary by id.
    pub fn remove_node(&mut self, id: NodeId) -> BasinResult<NodeRef> {
        let node = if let Some(index) = self.catchments.iter().position(|c| c.id == id) {
            self.catchments.remove(index);
            NodeRef::catchment(id)
        } else if let Some(index) = self.boundaries.iter().position(|b| b.id == id) {
            self.boundaries.remove(index);
            NodeRef::boundary(id)
        } else {
            return Err(BasinError::NodeNotFound(id));
        };
        self.pending_events.push(BasinEvent::NodeRemoved(node));
        Ok(node)
    }

    /// Changes the kind of one catchment. Setting the current kind is a no-op.
    pub fn set_catchment_kind(&mut self, id: NodeId, kind: CatchmentKind) -> BasinResult<()> {
        let catchment = self.catchment_mut(id)?;
        if catchment.kind == kind {
            return Ok(());
        }
        catchment.kind = kind;
        self.push_node_property(NodeRef::catchment(id), BasinProperty::CatchmentKind);
        Ok(())
    }

    /// Sets a catchment's area and queues an `Area` property change.
    pub fn set_catchment_area(&mut self, id: NodeId, area_m2: f64) -> BasinResult<()> {
        let catchment = self.catchment_mut(id)?;
        catchment.area_m2 = area_m2;
        self.push_node_property(NodeRef::catchment(id), BasinProperty::Area);
        Ok(())
    }

    /// Renames a catchment or boundary.
    pub fn rename_node(&mut self, id: NodeId, name: impl Into<String>) -> BasinResult<()> {
        let name = name.into();
        let node = if let Some(catchment) = self.catchments.iter_mut().find(|c| c.id == id) {
            catchment.name = name;
            NodeRef::catchment(id)
        } else if let Some(boundary) = self.boundaries.iter_mut().find(|b| b.id == id) {
            boundary.name = name;
            NodeRef::boundary(id)
        } else {
            return Err(BasinError::NodeNotFound(id));
        };
        self.push_node_property(node, BasinProperty::Name);
        Ok(())
    }

    /// Replaces the coordinate reference. Setting the current value is a no-op.
    pub fn set_coordinate_system(&mut self, coordinate_system: Option<CoordinateSystem>) {
        if self.coordinate_system == coordinate_system {
            return;
        }
        self.coordinate_system = coordinate_system;
        self.pending_events.push(BasinEvent::PropertyChanged {
            target: PropertyTarget::Basin,
            property: BasinProperty::CoordinateSystem,
        });
    }

    /// Drains queued change events in mutation order.
    pub fn take_events(&mut self) -> Vec<BasinEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Whether events are queued and not yet taken.
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn catchment_mut(&mut self, id: NodeId) -> BasinResult<&mut Catchment> {
        if let Some(index) = self.catchments.iter().position(|c| c.id == id) {
            return Ok(&mut self.catchments[index]);
        }
        if self.boundary(id).is_some() {
            return Err(BasinError::NotACatchment(id));
        }
        Err(BasinError::NodeNotFound(id))
    }

    fn push_node_property(&mut self, node: NodeRef, property: BasinProperty) {
        self.pending_events.push(BasinEvent::PropertyChanged {
            target: PropertyTarget::Node(node),
            property,
        });
    }
}
