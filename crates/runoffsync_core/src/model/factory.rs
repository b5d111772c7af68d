//! Typed record factory.
//!
//! Maps a catchment kind to its record variant through a fixed lookup table.
//! Kinds missing from the table are pass-through kinds: they get no record,
//! which is not an error.

use crate::model::basin::{Boundary, Catchment, CatchmentKind};
use crate::model::element_data::{
    CatchmentModelData, ConceptData, ConceptKind, RunoffBoundaryData,
};

const CONCEPT_TABLE: [(CatchmentKind, ConceptKind); 7] = [
    (CatchmentKind::Paved, ConceptKind::Paved),
    (CatchmentKind::Unpaved, ConceptKind::Unpaved),
    (CatchmentKind::Greenhouse, ConceptKind::Greenhouse),
    (CatchmentKind::OpenWater, ConceptKind::OpenWater),
    (CatchmentKind::Sacramento, ConceptKind::Sacramento),
    (CatchmentKind::Hbv, ConceptKind::Hbv),
    (CatchmentKind::Nwrw, ConceptKind::Nwrw),
];

/// Returns the record variant expected for a catchment kind.
pub fn expected_concept(kind: CatchmentKind) -> Option<ConceptKind> {
    CONCEPT_TABLE
        .iter()
        .find(|(catchment_kind, _)| *catchment_kind == kind)
        .map(|(_, concept)| *concept)
}

/// Builds the default record for a catchment, or `None` for pass-through kinds.
pub fn create_default(catchment: &Catchment) -> Option<CatchmentModelData> {
    let concept = expected_concept(catchment.kind)?;
    let mut data = CatchmentModelData::new(catchment.id, ConceptData::default_for(concept));
    data.calculation_area_m2 = catchment.area_m2;
    Some(data)
}

/// Builds the default record for a boundary.
pub fn create_boundary_data(boundary: &Boundary) -> RunoffBoundaryData {
    RunoffBoundaryData::new(boundary.id)
}

/// Returns whether an existing record (or its absence) fits the catchment kind.
pub fn is_compatible(catchment: &Catchment, existing: Option<&CatchmentModelData>) -> bool {
    expected_concept(catchment.kind) == existing.map(CatchmentModelData::concept_kind)
}
