//! Meteo distribution synchronizer.
//!
//! # Responsibility
//! - Keep precipitation, evaporation and temperature consistent with each
//!   other and with the two station lists.
//! - Clear record station assignments when a station leaves its list.
//!
//! # Invariants
//! - Every handler runs inside this synchronizer's `ReentrancyGuard`; a
//!   signal delivered while a cascade is open is dropped without logging.
//! - After a precipitation edit session settles, a non-global evaporation
//!   mode equals the precipitation mode.
//! - An evaporation mode change to a non-global mode that differs from the
//!   precipitation mode is copied back onto precipitation. Both directions
//!   are kept as observed.

use crate::model::basin::Catchment;
use crate::model::meteo::{DistributionMode, MeteoData, MeteoDataSet, MeteoEvent, MeteoKind};
use crate::model::stations::{MeteoStations, StationListEvent, StationListKind};
use crate::repo::element_registry::ModelDataStore;
use crate::sync::events::ModelEvent;
use crate::sync::guard::ReentrancyGuard;
use log::debug;

/// State touched by meteo cascades.
pub struct MeteoContext<'a, S: ModelDataStore> {
    pub meteo: &'a mut MeteoDataSet,
    pub stations: &'a mut MeteoStations,
    pub store: &'a mut S,
    /// Current basin catchments, for per-feature representations.
    pub catchments: &'a [Catchment],
    pub events: &'a mut Vec<ModelEvent>,
}

/// Applies meteo and station list cascades under one guard.
#[derive(Debug, Default)]
pub struct MeteoDistributionSynchronizer {
    guard: ReentrancyGuard,
}

impl MeteoDistributionSynchronizer {
    /// Creates a synchronizer with a closed guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a cascade is currently running.
    pub fn is_updating(&self) -> bool {
        self.guard.is_updating()
    }

    /// Handles an edit-end or mode-change signal of one dataset.
    pub fn on_meteo_event<S: ModelDataStore>(
        &self,
        ctx: &mut MeteoContext<'_, S>,
        event: MeteoEvent,
    ) {
        let Some(_scope) = self.guard.try_enter() else {
            return;
        };
        match event {
            MeteoEvent::EditEnded(kind) => self.edit_ended(ctx, kind),
            MeteoEvent::DistributionChanged { kind, to, .. } => {
                self.distribution_changed(ctx, kind, to)
            }
        }
    }

    /// Handles one insertion into or removal from a station list.
    pub fn on_station_event<S: ModelDataStore>(
        &self,
        ctx: &mut MeteoContext<'_, S>,
        event: &StationListEvent,
    ) {
        let Some(_scope) = self.guard.try_enter() else {
            return;
        };
        match event {
            StationListEvent::Added { list, name } => {
                for data in per_station_datasets(ctx.meteo, *list) {
                    data.add_station_value(name.as_str());
                }
            }
            StationListEvent::Removed { list, name } => {
                for data in per_station_datasets(ctx.meteo, *list) {
                    data.remove_station_value(name);
                }
                clear_assignments(ctx.store, ctx.events, *list, name);
            }
        }
    }

    fn edit_ended<S: ModelDataStore>(&self, ctx: &mut MeteoContext<'_, S>, kind: MeteoKind) {
        match kind {
            MeteoKind::Precipitation => {
                if ctx.meteo.precipitation.mode() == DistributionMode::PerStation {
                    self.rebuild_station_list(ctx, MeteoKind::Precipitation);
                }
                let source = ctx.meteo.precipitation.mode();
                let target = ctx.meteo.evaporation.mode();
                if target != DistributionMode::Global && target != source {
                    self.write_distribution(ctx, MeteoKind::Evaporation, source);
                }
            }
            MeteoKind::Temperature => {
                if ctx.meteo.temperature.mode() == DistributionMode::PerStation {
                    self.rebuild_station_list(ctx, MeteoKind::Temperature);
                }
            }
            MeteoKind::Evaporation => {}
        }
    }

    fn distribution_changed<S: ModelDataStore>(
        &self,
        ctx: &mut MeteoContext<'_, S>,
        kind: MeteoKind,
        mode: DistributionMode,
    ) {
        refresh_representation(ctx.meteo.get_mut(kind), ctx.stations, ctx.catchments);

        if kind == MeteoKind::Evaporation
            && mode != DistributionMode::Global
            && mode != ctx.meteo.precipitation.mode()
        {
            self.write_distribution(ctx, MeteoKind::Precipitation, mode);
        }
    }

    /// Overwrites the external list fed by `kind` with the dataset's own
    /// station values.
    ///
    /// Runs inside an open scope, so the list changes are applied here
    /// rather than through `on_station_event`: names that left the list are
    /// cleared from records, and other per-station datasets on the same list
    /// are refilled.
    fn rebuild_station_list<S: ModelDataStore>(
        &self,
        ctx: &mut MeteoContext<'_, S>,
        kind: MeteoKind,
    ) {
        let names = ctx.meteo.get(kind).station_values().to_vec();
        let list = kind.station_list();
        let changes = ctx.stations.get_mut(list).replace_all(names);
        debug!(
            "event=station_list_rebuild module=sync status=ok source={} list={} changes={}",
            kind.as_str(),
            list.as_str(),
            changes.len()
        );

        for change in &changes {
            if let StationListEvent::Removed { name, .. } = change {
                if !ctx.stations.get(list).contains(name) {
                    clear_assignments(ctx.store, ctx.events, list, name);
                }
            }
        }
        for data in per_station_datasets(ctx.meteo, list) {
            if data.kind() != kind {
                refresh_representation(data, ctx.stations, ctx.catchments);
            }
        }
    }

    /// Cascade write onto another dataset. Its own mode-change signal is not
    /// dispatched; the representation refresh it would trigger happens here.
    fn write_distribution<S: ModelDataStore>(
        &self,
        ctx: &mut MeteoContext<'_, S>,
        kind: MeteoKind,
        mode: DistributionMode,
    ) {
        let Some(MeteoEvent::DistributionChanged { from, to, .. }) =
            ctx.meteo.get_mut(kind).set_distribution(mode)
        else {
            return;
        };
        refresh_representation(ctx.meteo.get_mut(kind), ctx.stations, ctx.catchments);
        ctx.events
            .push(ModelEvent::DistributionChanged { kind, from, to });
        debug!(
            "event=meteo_cascade module=sync status=ok target={} mode={}",
            kind.as_str(),
            mode.as_str()
        );
    }
}

/// Aligns a dataset's representation with its current mode.
///
/// Per-feature datasets gain every catchment they lack; per-station datasets
/// are refilled from their external list. Global datasets are left as is.
pub fn refresh_representation(
    data: &mut MeteoData,
    stations: &MeteoStations,
    catchments: &[Catchment],
) {
    match data.mode() {
        DistributionMode::PerFeature => {
            for catchment in catchments {
                data.features_mut().add_feature(catchment.id);
            }
        }
        DistributionMode::PerStation => {
            let list = stations.get(data.kind().station_list());
            data.replace_station_values(list.names().iter().cloned());
        }
        DistributionMode::Global => {}
    }
}

fn per_station_datasets(
    meteo: &mut MeteoDataSet,
    list: StationListKind,
) -> impl Iterator<Item = &mut MeteoData> {
    meteo.iter_mut().filter(move |data| {
        data.mode() == DistributionMode::PerStation && data.kind().station_list() == list
    })
}

fn clear_assignments<S: ModelDataStore>(
    store: &mut S,
    events: &mut Vec<ModelEvent>,
    list: StationListKind,
    station: &str,
) {
    for data in store.catchment_records_mut() {
        let cleared = match list {
            StationListKind::Meteo if data.meteo_station_name == station => {
                data.meteo_station_name.clear();
                true
            }
            StationListKind::Temperature if data.temperature_station_name() == Some(station) => {
                data.set_temperature_station_name(String::new())
            }
            _ => false,
        };
        if cleared {
            events.push(ModelEvent::StationAssignmentCleared {
                node: data.catchment,
                list,
                station: station.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{refresh_representation, MeteoContext, MeteoDistributionSynchronizer};
    use crate::model::basin::{Catchment, CatchmentKind};
    use crate::model::meteo::{DistributionMode, MeteoData, MeteoDataSet, MeteoKind};
    use crate::model::stations::MeteoStations;
    use crate::repo::element_registry::ElementDataRegistry;
    use crate::sync::events::ModelEvent;

    #[test]
    fn per_feature_refresh_adds_missing_catchments_once() {
        let catchments = vec![
            Catchment::new("P1", CatchmentKind::Paved),
            Catchment::new("U1", CatchmentKind::Unpaved),
        ];
        let mut evaporation = MeteoData::new(MeteoKind::Evaporation);
        evaporation.set_distribution(DistributionMode::PerFeature);
        evaporation.features_mut().add_feature(catchments[0].id);

        refresh_representation(&mut evaporation, &MeteoStations::default(), &catchments);
        refresh_representation(&mut evaporation, &MeteoStations::default(), &catchments);

        assert_eq!(
            evaporation.features().features(),
            &[catchments[0].id, catchments[1].id]
        );
    }

    #[test]
    fn per_station_refresh_uses_matching_list() {
        let mut stations = MeteoStations::default();
        stations.meteo.add("A").expect("meteo station");
        stations.temperature.add("T").expect("temperature station");

        let mut temperature = MeteoData::new(MeteoKind::Temperature);
        temperature.set_distribution(DistributionMode::PerStation);
        refresh_representation(&mut temperature, &stations, &[]);

        assert_eq!(temperature.station_values(), &["T"]);
    }

    #[test]
    fn edit_end_without_cascade_leaves_guard_closed() {
        let synchronizer = MeteoDistributionSynchronizer::new();
        let mut meteo = MeteoDataSet::default();
        let mut stations = MeteoStations::default();
        let mut store = ElementDataRegistry::new();
        let mut events = Vec::new();

        meteo.precipitation.begin_edit();
        let signal = meteo.precipitation.end_edit().expect("edit ended");
        synchronizer.on_meteo_event(
            &mut MeteoContext {
                meteo: &mut meteo,
                stations: &mut stations,
                store: &mut store,
                catchments: &[],
                events: &mut events,
            },
            signal,
        );

        assert!(!synchronizer.is_updating());
        assert!(events.is_empty());
        assert_eq!(meteo.evaporation.mode(), DistributionMode::Global);
    }

    #[test]
    fn cascade_write_refreshes_target_and_reports_once() {
        let synchronizer = MeteoDistributionSynchronizer::new();
        let catchments = vec![Catchment::new("C1", CatchmentKind::Paved)];
        let mut meteo = MeteoDataSet::default();
        let mut stations = MeteoStations::default();
        let mut store = ElementDataRegistry::new();
        let mut events = Vec::new();

        let signal = meteo
            .evaporation
            .set_distribution(DistributionMode::PerFeature)
            .expect("mode changed");
        synchronizer.on_meteo_event(
            &mut MeteoContext {
                meteo: &mut meteo,
                stations: &mut stations,
                store: &mut store,
                catchments: &catchments,
                events: &mut events,
            },
            signal,
        );

        assert!(!synchronizer.is_updating());
        assert_eq!(meteo.precipitation.mode(), DistributionMode::PerFeature);
        assert_eq!(meteo.precipitation.features().features(), &[catchments[0].id]);
        assert_eq!(meteo.evaporation.features().features(), &[catchments[0].id]);
        assert_eq!(
            events,
            vec![ModelEvent::DistributionChanged {
                kind: MeteoKind::Precipitation,
                from: DistributionMode::Global,
                to: DistributionMode::PerFeature,
            }]
        );
    }
}
