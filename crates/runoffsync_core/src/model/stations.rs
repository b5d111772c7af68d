//! External meteo and temperature station lists.
//!
//! # Responsibility
//! - Keep the ordered, unique station names a model offers for assignment.
//! - Report every insertion and removal as a `StationListEvent`.
//!
//! # Invariants
//! - Names are non-blank and unique inside one list.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which external list an event or dataset refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationListKind {
    Meteo,
    Temperature,
}

impl StationListKind {
    /// Stable lowercase name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meteo => "meteo",
            Self::Temperature => "temperature",
        }
    }
}

/// Insertion or removal of one station name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationListEvent {
    Added { list: StationListKind, name: String },
    Removed { list: StationListKind, name: String },
}

/// Station name rejected by a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationListError {
    BlankName,
    DuplicateName(String),
}

impl Display for StationListError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "station name must not be blank"),
            Self::DuplicateName(name) => write!(f, "station already listed: {name}"),
        }
    }
}

impl Error for StationListError {}

/// Ordered, unique station names of one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationList {
    kind: StationListKind,
    names: Vec<String>,
}

impl StationList {
    /// Creates an empty list.
    pub fn new(kind: StationListKind) -> Self {
        Self {
            kind,
            names: Vec::new(),
        }
    }

    /// Which list this is.
    pub fn kind(&self) -> StationListKind {
        self.kind
    }

    /// Station names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of listed stations.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no station is listed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `name` is listed.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Appends a station and returns the matching `Added` event.
    pub fn add(&mut self, name: impl Into<String>) -> Result<StationListEvent, StationListError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StationListError::BlankName);
        }
        if self.contains(&name) {
            return Err(StationListError::DuplicateName(name));
        }
        self.names.push(name.clone());
        Ok(StationListEvent::Added {
            list: self.kind,
            name,
        })
    }

    /// Removes a name; `None` when it was not listed.
    pub fn remove(&mut self, name: &str) -> Option<StationListEvent> {
        let index = self.names.iter().position(|n| n == name)?;
        let name = self.names.remove(index);
        Some(StationListEvent::Removed {
            list: self.kind,
            name,
        })
    }

    /// Replaces the whole list, reporting each removal then each insertion.
    ///
    /// Blank and repeated names in `names` are skipped.
    pub fn replace_all<I, T>(&mut self, names: I) -> Vec<StationListEvent>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut events: Vec<StationListEvent> = std::mem::take(&mut self.names)
            .into_iter()
            .map(|name| StationListEvent::Removed {
                list: self.kind,
                name,
            })
            .collect();
        for name in names {
            if let Ok(event) = self.add(name) {
                events.push(event);
            }
        }
        events
    }
}

/// The two lists owned by one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteoStations {
    pub meteo: StationList,
    pub temperature: StationList,
}

impl Default for MeteoStations {
    fn default() -> Self {
        Self {
            meteo: StationList::new(StationListKind::Meteo),
            temperature: StationList::new(StationListKind::Temperature),
        }
    }
}

impl MeteoStations {
    /// List of `kind`.
    pub fn get(&self, kind: StationListKind) -> &StationList {
        match kind {
            StationListKind::Meteo => &self.meteo,
            StationListKind::Temperature => &self.temperature,
        }
    }

    /// Mutable list of `kind`.
    pub fn get_mut(&mut self, kind: StationListKind) -> &mut StationList {
        match kind {
            StationListKind::Meteo => &mut self.meteo,
            StationListKind::Temperature => &mut self.temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StationList, StationListError, StationListEvent, StationListKind};

    #[test]
    fn add_rejects_blank_and_duplicate_names() {
        let mut list = StationList::new(StationListKind::Meteo);
        list.add("A").expect("add A");

        assert_eq!(list.add("  "), Err(StationListError::BlankName));
        assert_eq!(
            list.add("A"),
            Err(StationListError::DuplicateName("A".to_string()))
        );
        assert_eq!(list.names(), &["A"]);
    }

    #[test]
    fn remove_reports_only_listed_names() {
        let mut list = StationList::new(StationListKind::Temperature);
        list.add("De Bilt").expect("add station");

        assert_eq!(
            list.remove("De Bilt"),
            Some(StationListEvent::Removed {
                list: StationListKind::Temperature,
                name: "De Bilt".to_string(),
            })
        );
        assert_eq!(list.remove("De Bilt"), None);
    }

    #[test]
    fn replace_all_removes_then_adds() {
        let mut list = StationList::new(StationListKind::Meteo);
        list.add("A").expect("add A");

        let events = list.replace_all(["B", "B", "C"]);
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            StationListEvent::Removed { name, .. } if name == "A"
        ));
        assert!(matches!(
            &events[2],
            StationListEvent::Added { name, .. } if name == "C"
        ));
        assert_eq!(list.names(), &["B", "C"]);
    }
}
