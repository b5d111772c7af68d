use runoffsync_core::model::coverage::FeatureCoverage;
use runoffsync_core::model::meteo::MeteoDataSet;
use runoffsync_core::sync::graph_observer::{GraphChangeObserver, GraphContext};
use runoffsync_core::{
    Boundary, Catchment, CatchmentKind, ConceptKind, CoordinateSystem, DistributionMode,
    DrainageBasin, ElementDataRegistry, ElementKey, MeteoKind, ModelDataStore, ModelEvent,
    RunoffModel,
};

fn assert_records_match_basin(model: &RunoffModel) {
    for catchment in model.basin().catchments() {
        let expected = runoffsync_core::model::factory::expected_concept(catchment.kind);
        let found = model
            .catchment_data(catchment.id)
            .map(|data| data.concept_kind());
        assert_eq!(found, expected, "record mismatch for {}", catchment.name);
    }
    for boundary in model.basin().boundaries() {
        let count = model
            .store()
            .boundary_records()
            .iter()
            .filter(|data| data.boundary == boundary.id)
            .count();
        assert_eq!(count, 1, "boundary {} must have one record", boundary.name);
    }
}

#[test]
fn kind_change_replaces_record_remove_before_add() {
    let mut model = RunoffModel::new();
    let p1 = model
        .add_catchment(Catchment::new("P1", CatchmentKind::Paved))
        .expect("add P1");
    let u1 = model
        .add_catchment(Catchment::new("U1", CatchmentKind::Unpaved))
        .expect("add U1");
    assert_eq!(
        model.catchment_data(u1).map(|d| d.concept_kind()),
        Some(ConceptKind::Unpaved)
    );
    model.take_events();

    model
        .set_catchment_kind(u1, CatchmentKind::Paved)
        .expect("change U1 kind");

    assert_eq!(
        model.catchment_data(u1).map(|d| d.concept_kind()),
        Some(ConceptKind::Paved)
    );
    let unpaved_left = model
        .store()
        .catchment_records()
        .iter()
        .any(|d| d.catchment == u1 && d.concept_kind() == ConceptKind::Unpaved);
    assert!(!unpaved_left);
    assert_eq!(model.store().catchment_records().len(), 2);
    assert!(model.catchment_data(p1).is_some());

    assert_eq!(
        model.take_events(),
        vec![
            ModelEvent::ElementRemoved(ElementKey::Catchment {
                node: u1,
                concept: ConceptKind::Unpaved,
            }),
            ModelEvent::ElementAdded(ElementKey::Catchment {
                node: u1,
                concept: ConceptKind::Paved,
            }),
        ]
    );
}

#[test]
fn records_follow_every_structural_change() {
    let mut model = RunoffModel::new();
    let polder = model
        .add_catchment(Catchment::new("polder", CatchmentKind::Polder))
        .expect("add polder");
    let hbv = model
        .add_catchment(Catchment::new("H1", CatchmentKind::Hbv))
        .expect("add hbv");
    let outlet = model
        .add_boundary(Boundary::new("outlet"))
        .expect("add boundary");
    assert_records_match_basin(&model);
    assert!(model.catchment_data(polder).is_none());

    model
        .set_catchment_kind(polder, CatchmentKind::Sacramento)
        .expect("polder becomes sacramento");
    model
        .set_catchment_kind(hbv, CatchmentKind::Unspecified)
        .expect("hbv becomes unspecified");
    assert_records_match_basin(&model);
    assert!(model.catchment_data(hbv).is_none());

    model.remove_node(outlet).expect("remove boundary");
    assert!(model.boundary_data(outlet).is_none());
    assert_records_match_basin(&model);
}

#[test]
fn removing_node_without_record_is_noop() {
    let mut model = RunoffModel::new();
    let polder = model
        .add_catchment(Catchment::new("polder", CatchmentKind::Polder))
        .expect("add polder");
    model.take_events();

    model.remove_node(polder).expect("remove polder");
    assert!(model.take_events().is_empty());
    assert!(model.store().is_empty());
}

#[test]
fn batched_edit_settles_after_closure_returns() {
    let mut model = RunoffModel::new();
    let (kept, dropped) = model.edit_basin(|basin| {
        let kept = basin
            .add_catchment(Catchment::new("C1", CatchmentKind::Paved))
            .expect("add C1");
        let dropped = basin
            .add_catchment(Catchment::new("C2", CatchmentKind::Unpaved))
            .expect("add C2");
        basin
            .set_catchment_kind(kept, CatchmentKind::Greenhouse)
            .expect("C1 becomes greenhouse");
        basin.remove_node(dropped).expect("remove C2");
        (kept, dropped)
    });

    assert_eq!(
        model.catchment_data(kept).map(|d| d.concept_kind()),
        Some(ConceptKind::Greenhouse)
    );
    assert!(model.catchment_data(dropped).is_none());
    assert_eq!(model.store().catchment_records().len(), 1);
}

#[test]
fn input_water_level_tracks_unpaved_catchments() {
    let mut model = RunoffModel::new();
    let u1 = model
        .add_catchment(Catchment::new("U1", CatchmentKind::Unpaved))
        .expect("add U1");
    let p1 = model
        .add_catchment(Catchment::new("P1", CatchmentKind::Paved))
        .expect("add P1");
    assert_eq!(model.input_water_level().features(), &[u1]);
    assert_eq!(
        model.input_water_level().value(u1),
        Some(runoffsync_core::UNDEFINED_VALUE)
    );

    model
        .set_catchment_kind(p1, CatchmentKind::Unpaved)
        .expect("P1 becomes unpaved");
    model
        .set_catchment_kind(u1, CatchmentKind::Hbv)
        .expect("U1 becomes hbv");
    assert_eq!(model.input_water_level().features(), &[p1]);

    model.remove_node(p1).expect("remove P1");
    assert!(model.input_water_level().is_empty());
}

#[test]
fn coordinate_system_reaches_every_surface() {
    let mut model = RunoffModel::new();
    let rd_new = CoordinateSystem::new(28992, "Amersfoort / RD New");
    model.set_coordinate_system(Some(rd_new.clone()));

    assert_eq!(model.input_water_level().coordinate_system(), Some(&rd_new));
    for kind in MeteoKind::ALL {
        assert_eq!(
            model.meteo(kind).features().coordinate_system(),
            Some(&rd_new)
        );
    }
    assert_eq!(model.output_binding().coordinate_system(), Some(&rd_new));
}

#[test]
fn per_feature_dataset_gains_new_catchments() {
    let mut model = RunoffModel::new();
    model.set_distribution(MeteoKind::Temperature, DistributionMode::PerFeature);

    let c1 = model
        .add_catchment(Catchment::new("C1", CatchmentKind::Hbv))
        .expect("add C1");
    assert_eq!(model.meteo(MeteoKind::Temperature).features().features(), &[c1]);
    assert!(model.meteo(MeteoKind::Precipitation).features().is_empty());

    model.remove_node(c1).expect("remove C1");
    assert!(model.meteo(MeteoKind::Temperature).features().is_empty());
}

#[test]
fn unsubscribe_twice_equals_once() {
    let mut basin = DrainageBasin::new("basin");
    let mut observer = GraphChangeObserver::new();
    observer.subscribe(Some(&basin));
    assert!(observer.is_subscribed_to(basin.id()));

    observer.unsubscribe();
    let after_once = observer.subscribed_basin();
    observer.unsubscribe();
    assert_eq!(observer.subscribed_basin(), after_once);
    assert_eq!(after_once, None);

    basin
        .add_catchment(Catchment::new("P1", CatchmentKind::Paved))
        .expect("add P1");
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
}

#[test]
fn area_change_reaches_existing_record() {
    let mut model = RunoffModel::new();
    let p1 = model
        .add_catchment(Catchment::new("P1", CatchmentKind::Paved).with_area(100.0))
        .expect("add P1");
    let polder = model
        .add_catchment(Catchment::new("polder", CatchmentKind::Polder))
        .expect("add polder");
    assert_eq!(
        model.catchment_data(p1).map(|d| d.calculation_area_m2),
        Some(100.0)
    );
    model.take_events();

    model.set_catchment_area(p1, 250.0).expect("resize P1");
    model.set_catchment_area(polder, 80.0).expect("resize polder");

    assert_eq!(
        model.catchment_data(p1).map(|d| d.calculation_area_m2),
        Some(250.0)
    );
    assert!(model.catchment_data(polder).is_none());
    assert!(model.take_events().is_empty());
}
