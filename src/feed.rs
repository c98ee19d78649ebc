//! Vehicle positions in the JSON form of a GTFS-realtime feed message.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::error;

use crate::error::LoadError;

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct FeedMessage {
    #[serde(default)]
    pub entity: Vec<FeedEntity>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct FeedEntity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub vehicle: Option<VehiclePosition>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePosition {
    #[serde(default)]
    pub trip: Option<TripDescriptor>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub vehicle: Option<VehicleDescriptor>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TripDescriptor {
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VehicleDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl VehicleDescriptor {
    /// Label if it is set and non-empty, else the id, else `Not Available`.
    pub fn license_plate(descriptor: Option<&VehicleDescriptor>) -> String {
        let label = descriptor
            .and_then(|d| d.label.as_deref())
            .filter(|label| !label.is_empty());
        match label {
            Some(label) => label.to_owned(),
            None => descriptor
                .and_then(|d| d.id.clone())
                .unwrap_or_else(|| "Not Available".to_owned()),
        }
    }
}

pub fn load_feed(path: &Path) -> Result<Vec<FeedEntity>, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::FeedIo {
        path: path.to_owned(),
        source,
    })?;
    let message: FeedMessage = serde_json::from_str(&contents).map_err(|source| LoadError::FeedParse {
        path: path.to_owned(),
        source,
    })?;
    Ok(message.entity)
}

/// Like [`load_feed`], but an unreadable feed yields no vehicles.
pub fn fetch_live_buses(path: &Path) -> Vec<FeedEntity> {
    match load_feed(path) {
        Ok(entities) => entities,
        Err(e) => {
            error!("Error fetching realtime feed: {}", e);
            Vec::new()
        },
    }
}
