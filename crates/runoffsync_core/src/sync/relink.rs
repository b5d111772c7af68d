//! Basin link state machine.
//!
//! # Responsibility
//! - Drive `Unlinked -> Linking -> Linked` when the model's basin reference
//!   is redirected.
//! - On relink, re-point existing records to the new basin's nodes by
//!   ordinal position; on a fresh link, rebuild every record.
//!
//! # Invariants
//! - A relink validates both node counts and every record's ordinal before
//!   the first write; a rejected relink leaves the store untouched.
//! - A relink creates and destroys no records.
//! - The observer is subscribed to the new basin only after records match it.

use crate::model::basin::{BasinId, DrainageBasin, NodeClass, NodeId};
use crate::model::coverage::FeatureCoverage;
use crate::model::factory;
use crate::model::meteo::MeteoDataSet;
use crate::repo::element_registry::ModelDataStore;
use crate::sync::events::ModelEvent;
use crate::sync::graph_observer::{
    add_boundary_record, add_catchment_record, propagate_coordinate_system, track_catchment,
    GraphChangeObserver,
};
use log::{error, info};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result alias for link transitions.
pub type RelinkResult<T> = Result<T, RelinkError>;

/// Fatal relink failures. The host must treat the model as needing reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelinkError {
    /// Node counts of the old and new basin differ.
    CountMismatch {
        class: NodeClass,
        expected: usize,
        found: usize,
    },
    /// A record points at a node the pre-link basin did not contain.
    UnknownNode { class: NodeClass, node: NodeId },
    /// `after_link` was called without a preceding `before_link`.
    NotLinking,
}

impl Display for RelinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CountMismatch {
                class,
                expected,
                found,
            } => write!(
                f,
                "relink {} count mismatch: expected {expected}, found {found}",
                class.as_str()
            ),
            Self::UnknownNode { class, node } => {
                write!(f, "relink {} record has unknown node: {node}", class.as_str())
            }
            Self::NotLinking => write!(f, "after_link called outside of a link transition"),
        }
    }
}

impl Error for RelinkError {}

/// Link state of the model's basin reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Unlinked,
    Linking,
    Linked,
}

impl LinkState {
    /// Stable lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unlinked => "unlinked",
            Self::Linking => "linking",
            Self::Linked => "linked",
        }
    }
}

/// Node order of the basin that was subscribed when linking began.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasinSnapshot {
    pub basin_id: BasinId,
    pub catchments: Vec<NodeId>,
    pub boundaries: Vec<NodeId>,
}

impl BasinSnapshot {
    /// Records the node order of `basin`.
    pub fn capture(basin: &DrainageBasin) -> Self {
        Self {
            basin_id: basin.id(),
            catchments: basin.catchments().iter().map(|c| c.id).collect(),
            boundaries: basin.boundaries().iter().map(|b| b.id).collect(),
        }
    }
}

/// State touched by `after_link`.
pub struct RelinkContext<'a, S: ModelDataStore> {
    pub basin: &'a DrainageBasin,
    pub store: &'a mut S,
    pub observer: &'a mut GraphChangeObserver,
    pub meteo: &'a mut MeteoDataSet,
    pub input_water_level: &'a mut FeatureCoverage,
    pub events: &'a mut Vec<ModelEvent>,
}

/// Drives link transitions and re-points records across basin swaps.
#[derive(Debug, Default)]
pub struct RelinkCoordinator {
    state: LinkState,
    pre_link: Option<BasinSnapshot>,
}

impl RelinkCoordinator {
    /// Creates an unlinked coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Node order captured by `before_link`, kept until a link succeeds.
    pub fn pre_link_snapshot(&self) -> Option<&BasinSnapshot> {
        self.pre_link.as_ref()
    }

    /// Starts a link transition away from `current`.
    ///
    /// The snapshot is only taken when the observer is attached to `current`;
    /// otherwise the following `after_link` falls back to a full rebuild.
    pub fn before_link(&mut self, observer: &mut GraphChangeObserver, current: &DrainageBasin) {
        self.pre_link = observer
            .is_subscribed_to(current.id())
            .then(|| BasinSnapshot::capture(current));
        self.state = LinkState::Linking;
        observer.unsubscribe();
        info!(
            "event=basin_link module=sync status=start basin_id={} snapshot={}",
            current.id(),
            self.pre_link.is_some()
        );
    }

    /// Completes the transition onto `ctx.basin`.
    ///
    /// # Errors
    /// - `NotLinking` when no transition is in progress.
    /// - `CountMismatch` / `UnknownNode` when positional relink is undefined.
    ///   The store is untouched, the state stays `Linking` and the snapshot
    ///   is kept.
    pub fn after_link<S: ModelDataStore>(
        &mut self,
        is_relink: bool,
        ctx: &mut RelinkContext<'_, S>,
    ) -> RelinkResult<()> {
        if self.state != LinkState::Linking {
            return Err(RelinkError::NotLinking);
        }

        match self.pre_link.as_ref().filter(|_| is_relink) {
            Some(snapshot) => {
                let mapping = match plan_relink(snapshot, ctx.basin, &*ctx.store) {
                    Ok(mapping) => mapping,
                    Err(err) => {
                        error!(
                            "event=basin_link module=sync status=error mode=relink basin_id={} error={err}",
                            ctx.basin.id()
                        );
                        return Err(err);
                    }
                };
                apply_relink(ctx, &mapping);
            }
            None => rebuild(ctx),
        }

        propagate_coordinate_system(ctx.basin, ctx.meteo, ctx.input_water_level);
        ctx.observer.subscribe(Some(ctx.basin));
        self.pre_link = None;
        self.state = LinkState::Linked;
        info!(
            "event=basin_link module=sync status=ok basin_id={} relink={is_relink}",
            ctx.basin.id()
        );
        Ok(())
    }
}

/// Old-to-new node mapping, validated against every existing record.
struct RelinkPlan {
    catchments: HashMap<NodeId, NodeId>,
    boundaries: HashMap<NodeId, NodeId>,
}

fn plan_relink<S: ModelDataStore>(
    snapshot: &BasinSnapshot,
    basin: &DrainageBasin,
    store: &S,
) -> RelinkResult<RelinkPlan> {
    let catchments = positional_mapping(
        NodeClass::Catchment,
        &snapshot.catchments,
        basin.catchments().iter().map(|c| c.id),
    )?;
    let boundaries = positional_mapping(
        NodeClass::Boundary,
        &snapshot.boundaries,
        basin.boundaries().iter().map(|b| b.id),
    )?;

    if let Some(data) = store
        .catchment_records()
        .iter()
        .find(|data| !catchments.contains_key(&data.catchment))
    {
        return Err(RelinkError::UnknownNode {
            class: NodeClass::Catchment,
            node: data.catchment,
        });
    }
    if let Some(data) = store
        .boundary_records()
        .iter()
        .find(|data| !boundaries.contains_key(&data.boundary))
    {
        return Err(RelinkError::UnknownNode {
            class: NodeClass::Boundary,
            node: data.boundary,
        });
    }

    Ok(RelinkPlan {
        catchments,
        boundaries,
    })
}

fn positional_mapping(
    class: NodeClass,
    old: &[NodeId],
    new: impl ExactSizeIterator<Item = NodeId>,
) -> RelinkResult<HashMap<NodeId, NodeId>> {
    if old.len() != new.len() {
        return Err(RelinkError::CountMismatch {
            class,
            expected: old.len(),
            found: new.len(),
        });
    }
    Ok(old.iter().copied().zip(new).collect())
}

fn apply_relink<S: ModelDataStore>(ctx: &mut RelinkContext<'_, S>, plan: &RelinkPlan) {
    for data in ctx.store.catchment_records_mut() {
        if let Some(node) = plan.catchments.get(&data.catchment) {
            data.catchment = *node;
        }
    }
    for data in ctx.store.boundary_records_mut() {
        if let Some(node) = plan.boundaries.get(&data.boundary) {
            data.boundary = *node;
        }
    }
    for data in ctx.meteo.iter_mut() {
        data.features_mut().remap_features(&plan.catchments);
    }
    ctx.input_water_level.remap_features(&plan.catchments);

    ctx.events.push(ModelEvent::Relinked {
        catchments: plan.catchments.len(),
        boundaries: plan.boundaries.len(),
    });
}

fn rebuild<S: ModelDataStore>(ctx: &mut RelinkContext<'_, S>) {
    ctx.store.clear();
    for data in ctx.meteo.iter_mut() {
        data.features_mut().clear();
    }
    ctx.input_water_level.clear();

    // Events of individual records are folded into one rebuild notification.
    let mut scratch = Vec::new();
    for catchment in ctx.basin.catchments() {
        if let Some(data) = factory::create_default(catchment) {
            add_catchment_record(ctx.store, &mut scratch, data);
        }
        track_catchment(ctx.meteo, ctx.input_water_level, catchment);
    }
    for boundary in ctx.basin.boundaries() {
        add_boundary_record(ctx.store, &mut scratch, factory::create_boundary_data(boundary));
    }

    info!(
        "event=registry_rebuild module=sync status=ok catchment_records={} boundary_records={}",
        ctx.store.catchment_records().len(),
        ctx.store.boundary_records().len()
    );
    ctx.events.push(ModelEvent::RegistryRebuilt {
        catchment_records: ctx.store.catchment_records().len(),
        boundary_records: ctx.store.boundary_records().len(),
    });
}

#[cfg(test)]
mod tests {
    use super::{LinkState, RelinkContext, RelinkCoordinator, RelinkError};
    use crate::model::basin::DrainageBasin;
    use crate::model::coverage::FeatureCoverage;
    use crate::model::meteo::MeteoDataSet;
    use crate::repo::element_registry::ElementDataRegistry;
    use crate::sync::graph_observer::GraphChangeObserver;

    #[test]
    fn after_link_requires_before_link() {
        let mut coordinator = RelinkCoordinator::new();
        let basin = DrainageBasin::new("basin");
        let mut store = ElementDataRegistry::new();
        let mut observer = GraphChangeObserver::new();
        let mut meteo = MeteoDataSet::default();
        let mut input_water_level = FeatureCoverage::new("Input water level");
        let mut events = Vec::new();

        let result = coordinator.after_link(
            false,
            &mut RelinkContext {
                basin: &basin,
                store: &mut store,
                observer: &mut observer,
                meteo: &mut meteo,
                input_water_level: &mut input_water_level,
                events: &mut events,
            },
        );

        assert_eq!(result, Err(RelinkError::NotLinking));
        assert_eq!(coordinator.state(), LinkState::Unlinked);
    }

    #[test]
    fn before_link_without_subscription_takes_no_snapshot() {
        let mut coordinator = RelinkCoordinator::new();
        let mut observer = GraphChangeObserver::new();
        let basin = DrainageBasin::new("basin");

        coordinator.before_link(&mut observer, &basin);
        assert_eq!(coordinator.state(), LinkState::Linking);
        assert!(coordinator.pre_link_snapshot().is_none());
    }
}
