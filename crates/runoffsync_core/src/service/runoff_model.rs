//! Rainfall-runoff model host.
//!
//! # Responsibility
//! - Own the basin reference and every piece of derived state.
//! - Route basin events, link transitions, meteo signals and station list
//!   changes to the sync components, in causal order.
//!
//! # Invariants
//! - Every public mutation returns only after all triggered cascades ran.
//! - Basin events are delivered only while the observer is subscribed to
//!   the current basin.
//! - A rejected relink restores the previous basin and leaves the link
//!   state at `Linking`; `requires_reload()` then reports `true`.
//!
//! # See also
//! - crate::sync for the handlers invoked here.

use crate::config::SyncConfig;
use crate::model::basin::{
    BasinError, Boundary, Catchment, CatchmentKind, CoordinateSystem, DrainageBasin, NodeId,
    NodeRef,
};
use crate::model::coverage::FeatureCoverage;
use crate::model::element_data::{CatchmentModelData, RunoffBoundaryData};
use crate::model::meteo::{DistributionMode, MeteoData, MeteoDataSet, MeteoEvent, MeteoKind};
use crate::model::stations::{
    MeteoStations, StationList, StationListError, StationListEvent, StationListKind,
};
use crate::output::settings::{OutputBinding, OutputSettings};
use crate::repo::element_registry::{ElementDataRegistry, ModelDataStore, RegistryError};
use crate::sync::events::ModelEvent;
use crate::sync::graph_observer::{GraphChangeObserver, GraphContext};
use crate::sync::meteo_sync::{refresh_representation, MeteoContext, MeteoDistributionSynchronizer};
use crate::sync::relink::{LinkState, RelinkContext, RelinkCoordinator, RelinkError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_BASIN_NAME: &str = "basin";
const INPUT_WATER_LEVEL_NAME: &str = "Input water level";

/// Result alias for facade calls.
pub type ModelResult<T> = Result<T, ModelError>;

/// Facade-level error wrapping every component error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    Basin(BasinError),
    Relink(RelinkError),
    StationList(StationListError),
    Registry(RegistryError),
    RecordNotFound(NodeId),
    /// Temperature stations only apply to HBV records.
    NotHbv(NodeId),
    UnknownStation {
        list: StationListKind,
        name: String,
    },
    /// `SyncConfig::validate` rejected the configuration.
    InvalidConfig(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basin(err) => write!(f, "{err}"),
            Self::Relink(err) => write!(f, "{err}"),
            Self::StationList(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::RecordNotFound(id) => write!(f, "no model data for node: {id}"),
            Self::NotHbv(id) => write!(f, "model data is not an HBV concept: {id}"),
            Self::UnknownStation { list, name } => {
                write!(f, "station not in {} list: {name}", list.as_str())
            }
            Self::InvalidConfig(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Basin(err) => Some(err),
            Self::Relink(err) => Some(err),
            Self::StationList(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::RecordNotFound(_) => None,
            Self::NotHbv(_) => None,
            Self::UnknownStation { .. } => None,
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<BasinError> for ModelError {
    fn from(value: BasinError) -> Self {
        Self::Basin(value)
    }
}

impl From<RelinkError> for ModelError {
    fn from(value: RelinkError) -> Self {
        Self::Relink(value)
    }
}

impl From<StationListError> for ModelError {
    fn from(value: StationListError) -> Self {
        Self::StationList(value)
    }
}

impl From<RegistryError> for ModelError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

/// Graph owner and host of the synchronization engine.
pub struct RunoffModel<S: ModelDataStore = ElementDataRegistry> {
    basin: DrainageBasin,
    store: S,
    meteo: MeteoDataSet,
    stations: MeteoStations,
    input_water_level: FeatureCoverage,
    output_settings: OutputSettings,
    observer: GraphChangeObserver,
    relink: RelinkCoordinator,
    meteo_sync: MeteoDistributionSynchronizer,
    events: Vec<ModelEvent>,
}

impl RunoffModel<ElementDataRegistry> {
    /// Creates a model with an in-memory registry and an empty local basin.
    pub fn new() -> Self {
        Self::with_store(ElementDataRegistry::new())
    }

    /// Builds a model whose initial state follows `config`.
    ///
    /// Modes and station lists are applied without running cascades.
    ///
    /// # Errors
    /// - `InvalidConfig` when `config.validate()` fails.
    /// - `StationList` when a configured station name is blank or repeated.
    pub fn from_config(config: &SyncConfig) -> ModelResult<Self> {
        config
            .validate()
            .map_err(|err| ModelError::InvalidConfig(err.to_string()))?;
        let mut model = Self::new();
        for name in &config.meteo_stations {
            model.stations.meteo.add(name.as_str())?;
        }
        for name in &config.temperature_stations {
            model.stations.temperature.add(name.as_str())?;
        }
        model
            .meteo
            .precipitation
            .set_distribution(config.meteo.precipitation);
        model
            .meteo
            .evaporation
            .set_distribution(config.meteo.evaporation);
        model
            .meteo
            .temperature
            .set_distribution(config.meteo.temperature);
        for data in model.meteo.iter_mut() {
            refresh_representation(data, &model.stations, model.basin.catchments());
        }
        model.output_settings = config.output_settings();
        model.events.clear();
        Ok(model)
    }
}

impl Default for RunoffModel<ElementDataRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ModelDataStore> RunoffModel<S> {
    /// Creates a model around `store`, linked to a fresh local basin.
    pub fn with_store(store: S) -> Self {
        let mut model = Self {
            basin: DrainageBasin::new(DEFAULT_BASIN_NAME),
            store,
            meteo: MeteoDataSet::default(),
            stations: MeteoStations::default(),
            input_water_level: FeatureCoverage::new(INPUT_WATER_LEVEL_NAME),
            output_settings: OutputSettings::new(),
            observer: GraphChangeObserver::new(),
            relink: RelinkCoordinator::new(),
            meteo_sync: MeteoDistributionSynchronizer::new(),
            events: Vec::new(),
        };
        model.relink.before_link(&mut model.observer, &model.basin);
        if let Err(err) = model.finish_link(false) {
            // Fresh link straight after before_link; positions are never checked.
            warn!("event=model_init module=service status=error error={err}");
        }
        model
    }

    /// Currently linked basin.
    pub fn basin(&self) -> &DrainageBasin {
        &self.basin
    }

    /// Applies a batch of basin mutations and synchronizes afterwards.
    ///
    /// Events are delivered in mutation order once `edit` returns.
    pub fn edit_basin<T>(&mut self, edit: impl FnOnce(&mut DrainageBasin) -> T) -> T {
        let result = edit(&mut self.basin);
        let queued = self.basin.take_events();
        let mut ctx = GraphContext {
            basin: &self.basin,
            store: &mut self.store,
            meteo: &mut self.meteo,
            input_water_level: &mut self.input_water_level,
            events: &mut self.events,
        };
        for event in &queued {
            self.observer.handle(&mut ctx, event);
        }
        result
    }

    /// Adds a catchment and creates its record.
    pub fn add_catchment(&mut self, catchment: Catchment) -> ModelResult<NodeId> {
        Ok(self.edit_basin(|basin| basin.add_catchment(catchment))?)
    }

    /// Adds a boundary and creates its record.
    pub fn add_boundary(&mut self, boundary: Boundary) -> ModelResult<NodeId> {
        Ok(self.edit_basin(|basin| basin.add_boundary(boundary))?)
    }

    /// Removes a node and its record.
    pub fn remove_node(&mut self, id: NodeId) -> ModelResult<NodeRef> {
        Ok(self.edit_basin(|basin| basin.remove_node(id))?)
    }

    /// Changes a catchment's kind, replacing its record when the concept differs.
    pub fn set_catchment_kind(&mut self, id: NodeId, kind: CatchmentKind) -> ModelResult<()> {
        Ok(self.edit_basin(|basin| basin.set_catchment_kind(id, kind))?)
    }

    /// Sets a catchment's area; its record's calculation area follows.
    pub fn set_catchment_area(&mut self, id: NodeId, area_m2: f64) -> ModelResult<()> {
        Ok(self.edit_basin(|basin| basin.set_catchment_area(id, area_m2))?)
    }

    /// Renames a catchment or boundary.
    pub fn rename_node(&mut self, id: NodeId, name: impl Into<String>) -> ModelResult<()> {
        let name = name.into();
        Ok(self.edit_basin(|basin| basin.rename_node(id, name))?)
    }

    /// Sets the basin coordinate reference and mirrors it onto every coverage.
    pub fn set_coordinate_system(&mut self, coordinate_system: Option<CoordinateSystem>) {
        self.edit_basin(|basin| basin.set_coordinate_system(coordinate_system));
    }

    /// Redirects the model to `basin` and returns the previous one.
    ///
    /// `is_relink` marks a swap between structurally identical basins (undo,
    /// redo, detach); records are then re-pointed by position instead of
    /// rebuilt.
    ///
    /// # Errors
    /// - `ModelError::Relink` when positional relink is impossible. The
    ///   previous basin stays current, records are untouched and the model
    ///   requires reload.
    pub fn link_basin(
        &mut self,
        mut basin: DrainageBasin,
        is_relink: bool,
    ) -> ModelResult<DrainageBasin> {
        basin.take_events();
        self.relink.before_link(&mut self.observer, &self.basin);
        let previous = std::mem::replace(&mut self.basin, basin);

        match self.finish_link(is_relink) {
            Ok(()) => Ok(previous),
            Err(err) => {
                self.basin = previous;
                Err(err.into())
            }
        }
    }

    /// Detaches from an externally owned basin onto a local copy.
    ///
    /// Node identities survive, so this is always a relink.
    pub fn unlink_basin(&mut self) -> ModelResult<DrainageBasin> {
        let local = self.basin.detached_copy();
        self.link_basin(local, true)
    }

    /// Current link state of the basin reference.
    pub fn link_state(&self) -> LinkState {
        self.relink.state()
    }

    /// Whether a rejected relink left the model needing a reload.
    pub fn requires_reload(&self) -> bool {
        self.relink.state() == LinkState::Linking
    }

    fn finish_link(&mut self, is_relink: bool) -> Result<(), RelinkError> {
        self.relink.after_link(
            is_relink,
            &mut RelinkContext {
                basin: &self.basin,
                store: &mut self.store,
                observer: &mut self.observer,
                meteo: &mut self.meteo,
                input_water_level: &mut self.input_water_level,
                events: &mut self.events,
            },
        )
    }

    /// Dataset of `kind`.
    pub fn meteo(&self, kind: MeteoKind) -> &MeteoData {
        self.meteo.get(kind)
    }

    /// Opens an edit session on a dataset.
    pub fn begin_edit(&mut self, kind: MeteoKind) {
        self.meteo.get_mut(kind).begin_edit();
    }

    /// Closes an edit session and runs the edit-end cascades.
    pub fn end_edit(&mut self, kind: MeteoKind) {
        if let Some(event) = self.meteo.get_mut(kind).end_edit() {
            self.dispatch_meteo(event);
        }
    }

    /// Changes a dataset's mode and runs the mode-change cascades.
    pub fn set_distribution(&mut self, kind: MeteoKind, mode: DistributionMode) {
        let Some(event) = self.meteo.get_mut(kind).set_distribution(mode) else {
            return;
        };
        if let MeteoEvent::DistributionChanged { kind, from, to } = event {
            self.events
                .push(ModelEvent::DistributionChanged { kind, from, to });
        }
        self.dispatch_meteo(event);
    }

    /// Adds a station to a dataset's own station argument.
    pub fn add_station_value(&mut self, kind: MeteoKind, name: impl Into<String>) -> bool {
        self.meteo.get_mut(kind).add_station_value(name)
    }

    /// Removes a station from a dataset's own station argument.
    pub fn remove_station_value(&mut self, kind: MeteoKind, name: &str) -> bool {
        self.meteo.get_mut(kind).remove_station_value(name)
    }

    /// Sets one catchment's value in a dataset's feature coverage.
    ///
    /// Returns `false` when the catchment is not a feature of that dataset.
    pub fn set_meteo_feature_value(&mut self, kind: MeteoKind, node: NodeId, value: f64) -> bool {
        self.meteo.get_mut(kind).features_mut().set_value(node, value)
    }

    fn dispatch_meteo(&mut self, event: MeteoEvent) {
        let mut ctx = MeteoContext {
            meteo: &mut self.meteo,
            stations: &mut self.stations,
            store: &mut self.store,
            catchments: self.basin.catchments(),
            events: &mut self.events,
        };
        self.meteo_sync.on_meteo_event(&mut ctx, event);
    }

    /// Meteo station list fed to precipitation and evaporation.
    pub fn meteo_stations(&self) -> &StationList {
        &self.stations.meteo
    }

    /// Temperature station list fed to temperature.
    pub fn temperature_stations(&self) -> &StationList {
        &self.stations.temperature
    }

    /// Lists a meteo station and adds it to per-station datasets.
    pub fn add_meteo_station(&mut self, name: impl Into<String>) -> ModelResult<()> {
        self.add_station(StationListKind::Meteo, name.into())
    }

    /// Unlists a meteo station and clears every assignment to it.
    pub fn remove_meteo_station(&mut self, name: &str) -> bool {
        self.remove_station(StationListKind::Meteo, name)
    }

    /// Lists a temperature station and adds it to per-station datasets.
    pub fn add_temperature_station(&mut self, name: impl Into<String>) -> ModelResult<()> {
        self.add_station(StationListKind::Temperature, name.into())
    }

    /// Unlists a temperature station and clears every HBV assignment to it.
    pub fn remove_temperature_station(&mut self, name: &str) -> bool {
        self.remove_station(StationListKind::Temperature, name)
    }

    fn add_station(&mut self, list: StationListKind, name: String) -> ModelResult<()> {
        let event = self.stations.get_mut(list).add(name)?;
        self.dispatch_station(&event);
        Ok(())
    }

    fn remove_station(&mut self, list: StationListKind, name: &str) -> bool {
        let Some(event) = self.stations.get_mut(list).remove(name) else {
            return false;
        };
        self.dispatch_station(&event);
        true
    }

    fn dispatch_station(&mut self, event: &StationListEvent) {
        let mut ctx = MeteoContext {
            meteo: &mut self.meteo,
            stations: &mut self.stations,
            store: &mut self.store,
            catchments: self.basin.catchments(),
            events: &mut self.events,
        };
        self.meteo_sync.on_station_event(&mut ctx, event);
    }

    /// Record store backing the model.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record of one catchment, if its kind has one.
    pub fn catchment_data(&self, node: NodeId) -> Option<&CatchmentModelData> {
        self.store.catchment_data(node)
    }

    /// Record of one boundary.
    pub fn boundary_data(&self, node: NodeId) -> Option<&RunoffBoundaryData> {
        self.store.boundary_data(node)
    }

    /// Assigns a meteo station to a catchment record; an empty name clears it.
    pub fn assign_meteo_station(&mut self, node: NodeId, name: &str) -> ModelResult<()> {
        check_listed(&self.stations.meteo, name)?;
        let data = self
            .store
            .catchment_data_mut(node)
            .ok_or(ModelError::RecordNotFound(node))?;
        data.meteo_station_name = name.to_string();
        Ok(())
    }

    /// Assigns a temperature station to an HBV record; an empty name clears it.
    pub fn assign_temperature_station(&mut self, node: NodeId, name: &str) -> ModelResult<()> {
        check_listed(&self.stations.temperature, name)?;
        let data = self
            .store
            .catchment_data_mut(node)
            .ok_or(ModelError::RecordNotFound(node))?;
        if !data.set_temperature_station_name(name) {
            return Err(ModelError::NotHbv(node));
        }
        Ok(())
    }

    /// True when any catchment runs the HBV concept.
    pub fn model_needs_temperature_data(&self) -> bool {
        self.basin
            .catchments()
            .iter()
            .any(|c| c.kind == CatchmentKind::Hbv)
    }

    /// Per-feature input water level over the unpaved catchments.
    pub fn input_water_level(&self) -> &FeatureCoverage {
        &self.input_water_level
    }

    /// Sets the input water level of one unpaved catchment.
    ///
    /// Returns `false` when the catchment is not in the coverage.
    pub fn set_input_water_level(&mut self, node: NodeId, value: f64) -> bool {
        self.input_water_level.set_value(node, value)
    }

    /// Engine output settings.
    pub fn output_settings(&self) -> &OutputSettings {
        &self.output_settings
    }

    /// Mutable engine output settings.
    pub fn output_settings_mut(&mut self) -> &mut OutputSettings {
        &mut self.output_settings
    }

    /// Read-only view for the output aggregation builder.
    pub fn output_binding(&self) -> OutputBinding<'_> {
        OutputBinding::new(&self.basin, &self.output_settings)
    }

    /// Drains notifications raised since the last call.
    pub fn take_events(&mut self) -> Vec<ModelEvent> {
        let events = std::mem::take(&mut self.events);
        if !events.is_empty() {
            info!(
                "event=model_events_drained module=service status=ok count={}",
                events.len()
            );
        }
        events
    }
}

fn check_listed(list: &StationList, name: &str) -> ModelResult<()> {
    if name.is_empty() || list.contains(name) {
        return Ok(());
    }
    Err(ModelError::UnknownStation {
        list: list.kind(),
        name: name.to_string(),
    })
}
