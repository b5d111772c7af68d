use runoffsync_core::{
    AggregationOption, Catchment, CatchmentKind, CoordinateSystem, ElementSet, RunoffModel,
};

#[test]
fn binding_reflects_enabled_quantities_and_basin() {
    let mut model = RunoffModel::new();
    let rd_new = CoordinateSystem::new(28992, "Amersfoort / RD New");
    model.set_coordinate_system(Some(rd_new.clone()));
    let h1 = model
        .add_catchment(Catchment::new("H1", CatchmentKind::Hbv))
        .expect("add H1");

    let settings = model.output_settings_mut();
    assert!(settings.set_enabled("Outflow (hbv)", true));
    assert!(settings.set_enabled("Snowfall (hbv)", true));
    assert!(!settings.set_enabled("Outflow (x)", true));
    settings.aggregation = AggregationOption::Maximum;

    let binding = model.output_binding();
    assert_eq!(
        binding.enabled_quantities(CatchmentKind::Hbv),
        vec!["Outflow (hbv)", "Snowfall (hbv)"]
    );
    assert!(binding.enabled_quantities(CatchmentKind::Paved).is_empty());
    assert!(binding.enabled_quantities(CatchmentKind::Polder).is_empty());
    assert_eq!(binding.coordinate_system(), Some(&rd_new));
    assert_eq!(
        binding.catchments().iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![h1]
    );
    assert_eq!(binding.aggregation(), AggregationOption::Maximum);
}

#[test]
fn toggling_element_set_switches_all_its_parameters() {
    let mut model = RunoffModel::new();
    let settings = model.output_settings_mut();
    assert!(!settings.is_output_enabled_for_element_set(ElementSet::Unpaved));

    settings.toggle_element_set(ElementSet::Unpaved, true);
    assert!(settings.is_output_enabled_for_element_set(ElementSet::Unpaved));
    assert_eq!(settings.enabled_quantities(CatchmentKind::Unpaved).len(), 5);

    settings.toggle_element_set(ElementSet::Boundary, false);
    assert!(!settings.is_output_enabled_for_element_set(ElementSet::Boundary));
    assert!(settings.is_output_enabled_for_element_set(ElementSet::Unpaved));
}
