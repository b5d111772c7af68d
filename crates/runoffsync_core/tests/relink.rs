use runoffsync_core::{
    Boundary, Catchment, CatchmentKind, ConceptKind, DistributionMode, DrainageBasin, LinkState,
    MeteoKind, ModelDataStore, ModelError, ModelEvent, NodeClass, NodeId, RelinkError,
    RunoffModel,
};

const KINDS: [CatchmentKind; 3] = [
    CatchmentKind::Paved,
    CatchmentKind::Unpaved,
    CatchmentKind::Hbv,
];

fn basin_with(kinds: &[CatchmentKind], boundaries: usize) -> DrainageBasin {
    let mut basin = DrainageBasin::new("linked");
    for (index, kind) in kinds.iter().enumerate() {
        basin
            .add_catchment(Catchment::new(format!("C{index}"), *kind))
            .expect("add catchment");
    }
    for index in 0..boundaries {
        basin
            .add_boundary(Boundary::new(format!("B{index}")))
            .expect("add boundary");
    }
    basin
}

fn catchment_ids(basin: &DrainageBasin) -> Vec<NodeId> {
    basin.catchments().iter().map(|c| c.id).collect()
}

fn model_with_three_catchments() -> RunoffModel {
    let mut model = RunoffModel::new();
    model
        .link_basin(basin_with(&KINDS, 1), false)
        .expect("initial link");
    model.take_events();
    model
}

#[test]
fn relink_maps_records_by_position() {
    let mut model = model_with_three_catchments();
    let old_ids = catchment_ids(model.basin());
    let old_boundary = model.basin().boundaries()[0].id;
    model.add_meteo_station("A").expect("add station");
    model
        .assign_meteo_station(old_ids[1], "A")
        .expect("assign station");
    model.take_events();

    let replacement = basin_with(&KINDS, 1);
    let new_ids = catchment_ids(&replacement);
    let new_boundary = replacement.boundaries()[0].id;
    model.link_basin(replacement, true).expect("relink");

    for (position, new_id) in new_ids.iter().enumerate() {
        let data = model
            .catchment_data(*new_id)
            .expect("record re-pointed to new node");
        assert_eq!(
            Some(data.concept_kind()),
            runoffsync_core::model::factory::expected_concept(KINDS[position])
        );
        assert!(model.catchment_data(old_ids[position]).is_none());
    }
    assert_eq!(
        model
            .catchment_data(new_ids[1])
            .expect("unpaved record")
            .meteo_station_name,
        "A"
    );
    assert!(model.boundary_data(new_boundary).is_some());
    assert!(model.boundary_data(old_boundary).is_none());
    assert_eq!(model.store().catchment_records().len(), 3);

    let events = model.take_events();
    assert_eq!(
        events,
        vec![ModelEvent::Relinked {
            catchments: 3,
            boundaries: 1,
        }]
    );
    assert_eq!(model.link_state(), LinkState::Linked);
}

#[test]
fn relink_with_count_mismatch_leaves_registry_untouched() {
    let mut model = model_with_three_catchments();
    let before = model.store().clone();
    let basin_id = model.basin().id();

    let error = model
        .link_basin(basin_with(&KINDS[..2], 1), true)
        .expect_err("count mismatch must fail");

    assert_eq!(
        error,
        ModelError::Relink(RelinkError::CountMismatch {
            class: NodeClass::Catchment,
            expected: 3,
            found: 2,
        })
    );
    assert_eq!(model.store(), &before);
    assert_eq!(model.basin().id(), basin_id);
    assert!(model.requires_reload());
    assert!(model.take_events().is_empty());
}

#[test]
fn boundary_count_mismatch_is_fatal_too() {
    let mut model = model_with_three_catchments();
    let error = model
        .link_basin(basin_with(&KINDS, 2), true)
        .expect_err("boundary mismatch must fail");
    assert!(matches!(
        error,
        ModelError::Relink(RelinkError::CountMismatch {
            class: NodeClass::Boundary,
            expected: 1,
            found: 2,
        })
    ));
}

#[test]
fn fresh_link_recovers_after_rejected_relink() {
    let mut model = model_with_three_catchments();
    let replacement = basin_with(&KINDS[..2], 0);
    model
        .link_basin(replacement.clone(), true)
        .expect_err("mismatch");

    model.link_basin(replacement, false).expect("reload");
    assert_eq!(model.link_state(), LinkState::Linked);
    assert!(!model.requires_reload());
    assert_eq!(model.store().catchment_records().len(), 2);
    assert!(model.store().boundary_records().is_empty());
}

#[test]
fn fresh_link_rebuilds_from_new_basin() {
    let mut model = model_with_three_catchments();
    model.set_distribution(MeteoKind::Precipitation, DistributionMode::PerFeature);
    model.take_events();

    let replacement = basin_with(
        &[CatchmentKind::Nwrw, CatchmentKind::Polder],
        2,
    );
    let nwrw = replacement.catchments()[0].id;
    let previous = model.link_basin(replacement, false).expect("fresh link");
    assert_eq!(previous.catchments().len(), 3);

    assert_eq!(
        model.catchment_data(nwrw).map(|d| d.concept_kind()),
        Some(ConceptKind::Nwrw)
    );
    assert_eq!(model.store().catchment_records().len(), 1);
    assert_eq!(model.store().boundary_records().len(), 2);
    assert_eq!(
        model.meteo(MeteoKind::Precipitation).features().len(),
        2
    );
    assert_eq!(
        model.take_events(),
        vec![ModelEvent::RegistryRebuilt {
            catchment_records: 1,
            boundary_records: 2,
        }]
    );
}

#[test]
fn edits_reach_only_the_linked_basin() {
    let mut model = model_with_three_catchments();
    let mut previous = model
        .link_basin(basin_with(&KINDS, 1), true)
        .expect("relink");

    previous
        .add_catchment(Catchment::new("orphan", CatchmentKind::Paved))
        .expect("edit detached basin");
    assert_eq!(model.store().catchment_records().len(), 3);

    let added = model
        .add_catchment(Catchment::new("C3", CatchmentKind::OpenWater))
        .expect("edit linked basin");
    assert_eq!(
        model.catchment_data(added).map(|d| d.concept_kind()),
        Some(ConceptKind::OpenWater)
    );
}

#[test]
fn unlink_keeps_node_identities_and_records() {
    let mut model = model_with_three_catchments();
    let ids = catchment_ids(model.basin());
    let external_id = model.basin().id();

    let external = model.unlink_basin().expect("unlink");
    assert_eq!(external.id(), external_id);
    assert_ne!(model.basin().id(), external_id);
    assert_eq!(catchment_ids(model.basin()), ids);
    for id in &ids {
        assert!(model.catchment_data(*id).is_some());
    }
    assert_eq!(model.link_state(), LinkState::Linked);
}

#[test]
fn relink_carries_coverages_and_values_to_new_nodes() {
    let mut model = RunoffModel::new();
    model
        .link_basin(
            basin_with(&[CatchmentKind::Paved, CatchmentKind::Unpaved], 0),
            false,
        )
        .expect("initial link");
    model.set_distribution(MeteoKind::Precipitation, DistributionMode::PerFeature);
    let old_ids = catchment_ids(model.basin());
    assert!(model.set_meteo_feature_value(MeteoKind::Precipitation, old_ids[1], 4.5));
    assert!(model.set_input_water_level(old_ids[1], -1.25));

    let replacement = basin_with(&[CatchmentKind::Paved, CatchmentKind::Unpaved], 0);
    let new_ids = catchment_ids(&replacement);
    model.link_basin(replacement, true).expect("relink");

    let precipitation = model.meteo(MeteoKind::Precipitation).features();
    assert_eq!(precipitation.features(), new_ids.as_slice());
    assert_eq!(precipitation.value(new_ids[1]), Some(4.5));
    assert_eq!(precipitation.value(old_ids[1]), None);
    assert_eq!(model.input_water_level().features(), &[new_ids[1]]);
    assert_eq!(model.input_water_level().value(new_ids[1]), Some(-1.25));
}
