//! Basin change observer.
//!
//! # Responsibility
//! - Hold the scoped subscription to the currently linked basin.
//! - Translate basin events into record creation/removal and keep the
//!   catchment coverages (meteo per-feature surfaces, input water level)
//!   aligned with the graph.
//!
//! # Invariants
//! - After each handled event, every catchment has exactly the record its
//!   kind expects (or none for pass-through kinds), and every boundary has
//!   exactly one boundary record.
//! - A kind change removes the old record before adding the new one.
//! - Removing a node that has no record is a no-op.
//! - A record's calculation area follows its catchment's area.

use crate::model::basin::{
    BasinEvent, BasinId, BasinProperty, Catchment, CatchmentKind, DrainageBasin, NodeClass,
    NodeId, NodeRef, PropertyTarget,
};
use crate::model::coverage::FeatureCoverage;
use crate::model::element_data::{CatchmentModelData, RunoffBoundaryData};
use crate::model::factory;
use crate::model::meteo::{DistributionMode, MeteoDataSet};
use crate::repo::element_registry::ModelDataStore;
use crate::sync::events::{ElementKey, ModelEvent};
use log::{debug, info, warn};

/// Live attachment to one basin's change streams.
///
/// Dropping the handle detaches.
#[derive(Debug)]
pub struct BasinSubscription {
    basin_id: BasinId,
}

impl BasinSubscription {
    fn attach(basin_id: BasinId) -> Self {
        info!("event=basin_subscribe module=sync status=ok basin_id={basin_id}");
        Self { basin_id }
    }

    /// Basin this subscription is attached to.
    pub fn basin_id(&self) -> BasinId {
        self.basin_id
    }
}

impl Drop for BasinSubscription {
    fn drop(&mut self) {
        info!(
            "event=basin_unsubscribe module=sync status=ok basin_id={}",
            self.basin_id
        );
    }
}

/// Mutable state an observer writes while handling one basin event.
pub struct GraphContext<'a, S: ModelDataStore> {
    pub basin: &'a DrainageBasin,
    pub store: &'a mut S,
    pub meteo: &'a mut MeteoDataSet,
    pub input_water_level: &'a mut FeatureCoverage,
    pub events: &'a mut Vec<ModelEvent>,
}

/// Keeps records and coverages aligned with the subscribed basin.
#[derive(Debug, Default)]
pub struct GraphChangeObserver {
    subscription: Option<BasinSubscription>,
}

impl GraphChangeObserver {
    /// Creates an observer with no subscription.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches to `basin`, replacing any previous subscription.
    ///
    /// No-op when `basin` is absent.
    pub fn subscribe(&mut self, basin: Option<&DrainageBasin>) {
        let Some(basin) = basin else {
            return;
        };
        if self.is_subscribed_to(basin.id()) {
            return;
        }
        self.subscription = Some(BasinSubscription::attach(basin.id()));
    }

    /// Detaches from the current basin. Safe to call repeatedly.
    pub fn unsubscribe(&mut self) {
        drop(self.subscription.take());
    }

    /// Basin currently subscribed to, if any.
    pub fn subscribed_basin(&self) -> Option<BasinId> {
        self.subscription.as_ref().map(BasinSubscription::basin_id)
    }

    /// Whether the observer is attached to `basin_id`.
    pub fn is_subscribed_to(&self, basin_id: BasinId) -> bool {
        self.subscribed_basin() == Some(basin_id)
    }

    /// Applies one basin event to the records and coverages in `ctx`.
    ///
    /// Events from a basin other than the subscribed one are ignored.
    pub fn handle<S: ModelDataStore>(&self, ctx: &mut GraphContext<'_, S>, event: &BasinEvent) {
        if !self.is_subscribed_to(ctx.basin.id()) {
            debug!(
                "event=basin_event_ignored module=sync status=skip reason=not_subscribed basin_id={}",
                ctx.basin.id()
            );
            return;
        }

        match *event {
            BasinEvent::NodeAdded(node) => on_node_added(ctx, node),
            BasinEvent::NodeRemoved(node) => on_node_removed(ctx, node),
            BasinEvent::PropertyChanged {
                target: PropertyTarget::Basin,
                property: BasinProperty::CoordinateSystem,
            } => propagate_coordinate_system(ctx.basin, ctx.meteo, ctx.input_water_level),
            BasinEvent::PropertyChanged {
                target: PropertyTarget::Node(node),
                property: BasinProperty::CatchmentKind,
            } if node.class == NodeClass::Catchment => on_kind_changed(ctx, node.id),
            BasinEvent::PropertyChanged {
                target: PropertyTarget::Node(node),
                property: BasinProperty::Area,
            } if node.class == NodeClass::Catchment => on_area_changed(ctx, node.id),
            BasinEvent::PropertyChanged { .. } => {}
        }
    }
}

fn on_node_added<S: ModelDataStore>(ctx: &mut GraphContext<'_, S>, node: NodeRef) {
    match node.class {
        NodeClass::Catchment => {
            let Some(catchment) = ctx.basin.catchment(node.id) else {
                debug!(
                    "event=node_added module=sync status=skip reason=stale node_id={}",
                    node.id
                );
                return;
            };
            if let Some(data) = factory::create_default(catchment) {
                add_catchment_record(ctx.store, ctx.events, data);
            }
            track_catchment(ctx.meteo, ctx.input_water_level, catchment);
        }
        NodeClass::Boundary => {
            let Some(boundary) = ctx.basin.boundary(node.id) else {
                return;
            };
            add_boundary_record(ctx.store, ctx.events, factory::create_boundary_data(boundary));
        }
    }
}

fn on_node_removed<S: ModelDataStore>(ctx: &mut GraphContext<'_, S>, node: NodeRef) {
    match node.class {
        NodeClass::Catchment => {
            if let Some(data) = ctx.store.remove_catchment_data(node.id) {
                ctx.events
                    .push(ModelEvent::ElementRemoved(catchment_key(&data)));
            }
            untrack_catchment(ctx.meteo, ctx.input_water_level, node.id);
        }
        NodeClass::Boundary => {
            if ctx.store.remove_boundary_data(node.id).is_some() {
                ctx.events
                    .push(ModelEvent::ElementRemoved(ElementKey::Boundary { node: node.id }));
            }
        }
    }
}

fn on_kind_changed<S: ModelDataStore>(ctx: &mut GraphContext<'_, S>, id: NodeId) {
    let Some(catchment) = ctx.basin.catchment(id) else {
        return;
    };

    if !factory::is_compatible(catchment, ctx.store.catchment_data(id)) {
        if let Some(old) = ctx.store.remove_catchment_data(id) {
            ctx.events.push(ModelEvent::ElementRemoved(catchment_key(&old)));
        }
        if let Some(data) = factory::create_default(catchment) {
            add_catchment_record(ctx.store, ctx.events, data);
        }
        debug!(
            "event=catchment_kind_changed module=sync status=ok node_id={} kind={}",
            id,
            catchment.kind.as_str()
        );
    }

    if catchment.kind == CatchmentKind::Unpaved {
        ctx.input_water_level.add_feature(id);
    } else {
        ctx.input_water_level.remove_feature(id);
    }
}

fn on_area_changed<S: ModelDataStore>(ctx: &mut GraphContext<'_, S>, id: NodeId) {
    let Some(catchment) = ctx.basin.catchment(id) else {
        return;
    };
    if let Some(data) = ctx.store.catchment_data_mut(id) {
        data.calculation_area_m2 = catchment.area_m2;
    }
}

pub(crate) fn add_catchment_record<S: ModelDataStore>(
    store: &mut S,
    events: &mut Vec<ModelEvent>,
    data: CatchmentModelData,
) {
    let key = catchment_key(&data);
    match store.add_catchment_data(data) {
        Ok(()) => events.push(ModelEvent::ElementAdded(key)),
        Err(err) => warn!(
            "event=record_add module=sync status=skip node_id={} error={err}",
            key.node()
        ),
    }
}

pub(crate) fn add_boundary_record<S: ModelDataStore>(
    store: &mut S,
    events: &mut Vec<ModelEvent>,
    data: RunoffBoundaryData,
) {
    let key = ElementKey::Boundary {
        node: data.boundary,
    };
    match store.add_boundary_data(data) {
        Ok(()) => events.push(ModelEvent::ElementAdded(key)),
        Err(err) => warn!(
            "event=record_add module=sync status=skip node_id={} error={err}",
            key.node()
        ),
    }
}

fn catchment_key(data: &CatchmentModelData) -> ElementKey {
    ElementKey::Catchment {
        node: data.catchment,
        concept: data.concept_kind(),
    }
}

/// Adds a catchment to every coverage that should contain it.
pub(crate) fn track_catchment(
    meteo: &mut MeteoDataSet,
    input_water_level: &mut FeatureCoverage,
    catchment: &Catchment,
) {
    for data in meteo.iter_mut() {
        if data.mode() == DistributionMode::PerFeature {
            data.features_mut().add_feature(catchment.id);
        }
    }
    if catchment.kind == CatchmentKind::Unpaved {
        input_water_level.add_feature(catchment.id);
    }
}

fn untrack_catchment(meteo: &mut MeteoDataSet, input_water_level: &mut FeatureCoverage, id: NodeId) {
    for data in meteo.iter_mut() {
        data.features_mut().remove_feature(id);
    }
    input_water_level.remove_feature(id);
}

/// Copies the basin coordinate reference onto every mirrored surface.
pub(crate) fn propagate_coordinate_system(
    basin: &DrainageBasin,
    meteo: &mut MeteoDataSet,
    input_water_level: &mut FeatureCoverage,
) {
    let coordinate_system = basin.coordinate_system().cloned();
    for data in meteo.iter_mut() {
        data.features_mut()
            .set_coordinate_system(coordinate_system.clone());
    }
    input_water_level.set_coordinate_system(coordinate_system);
}

#[cfg(test)]
mod tests {
    use super::{GraphChangeObserver, GraphContext};
    use crate::model::basin::{Catchment, CatchmentKind, DrainageBasin};
    use crate::model::coverage::FeatureCoverage;
    use crate::model::meteo::MeteoDataSet;
    use crate::repo::element_registry::{ElementDataRegistry, ModelDataStore};

    #[test]
    fn subscribe_to_absent_basin_is_noop() {
        let mut observer = GraphChangeObserver::new();
        observer.subscribe(None);
        assert_eq!(observer.subscribed_basin(), None);
    }

    #[test]
    fn events_of_unsubscribed_basin_are_ignored() {
        let observer = GraphChangeObserver::new();
        let mut basin = DrainageBasin::new("basin");
        basin
            .add_catchment(Catchment::new("P1", CatchmentKind::Paved))
            .expect("add paved");

        let mut store = ElementDataRegistry::new();
        let mut meteo = MeteoDataSet::default();
        let mut input_water_level = FeatureCoverage::new("Input water level");
        let mut events = Vec::new();
        let queued = basin.take_events();
        let mut ctx = GraphContext {
            basin: &basin,
            store: &mut store,
            meteo: &mut meteo,
            input_water_level: &mut input_water_level,
            events: &mut events,
        };
        for event in &queued {
            observer.handle(&mut ctx, event);
        }

        assert!(store.is_empty());
        assert!(events.is_empty());
    }
}
