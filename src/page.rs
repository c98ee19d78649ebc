use std::collections::BTreeMap;

/// Element carrying the serialized bus records.
pub const BUS_DATA_ELEMENT: &str = "bus-data";
/// `data-*` key under which the records are stored.
pub const BUS_DATA_KEY: &str = "buses";
/// Element the map widget is mounted into.
pub const MAP_ELEMENT: &str = "map";

/// An element of the embedding page, reduced to its id and `data-*` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageElement {
    pub id: String,
    dataset: BTreeMap<String, String>,
}

impl PageElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dataset: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dataset.insert(key.into(), value.into());
        self
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.dataset.get(key).map(String::as_str)
    }

    /// The element holding `payload` as its serialized bus list.
    pub fn bus_data(payload: impl Into<String>) -> Self {
        Self::new(BUS_DATA_ELEMENT).with_data(BUS_DATA_KEY, payload)
    }
}

/// Handle to the element a map view is mounted into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountTarget(pub String);

impl Default for MountTarget {
    fn default() -> Self {
        Self(MAP_ELEMENT.to_owned())
    }
}

impl MountTarget {
    pub fn id(&self) -> &str {
        &self.0
    }
}
