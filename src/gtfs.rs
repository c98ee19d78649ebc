use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use itertools::Itertools;
use regex::RegexBuilder;
use serde::Deserialize;
use tracing::info;

use crate::error::{LoadError, SearchError};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Stop {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub route_id: String,
    #[serde(default)]
    pub route_short_name: String,
    #[serde(default)]
    pub route_long_name: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub route_id: String,
    pub trip_id: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
}

pub fn deserialize_from<T: serde::de::DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, csv::Error> {
    csv::Reader::from_reader(reader).deserialize().collect()
}

fn deserialize_into<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    File::open(path)
        .map_err(csv::Error::from)
        .and_then(deserialize_from)
        .map_err(|source| LoadError::Csv {
            path: path.to_owned(),
            source,
        })
}

#[derive(Debug, Default)]
pub struct Timetable {
    pub stops: Vec<Stop>,
    pub routes: HashMap<String, Route>,
    pub trips: Vec<Trip>,
    pub trips_by_stop: HashMap<String, Vec<String>>,
}

impl Timetable {
    pub fn new(stops: Vec<Stop>, routes: Vec<Route>, trips: Vec<Trip>, stop_times: Vec<StopTime>) -> Self {
        let routes = routes
            .into_iter()
            .map(|route| (route.route_id.clone(), route))
            .collect();
        let trips_by_stop = stop_times
            .into_iter()
            .map(|stop_time| (stop_time.stop_id, stop_time.trip_id))
            .into_group_map();
        Self {
            stops,
            routes,
            trips,
            trips_by_stop,
        }
    }

    /// Loads `stops.txt`, `routes.txt`, `trips.txt` and `stop_times.txt` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, LoadError> {
        info!("Processing stops");
        let stops = deserialize_into::<Stop>(&dir.join("stops.txt"))?;

        info!("Processing routes");
        let routes = deserialize_into::<Route>(&dir.join("routes.txt"))?;

        info!("Processing trips");
        let trips = deserialize_into::<Trip>(&dir.join("trips.txt"))?;

        info!("Processing stop_times");
        let stop_times = deserialize_into::<StopTime>(&dir.join("stop_times.txt"))?;

        info!(
            "Loaded {} stops, {} routes, {} trips, {} stop times",
            stops.len(),
            routes.len(),
            trips.len(),
            stop_times.len()
        );
        Ok(Self::new(stops, routes, trips, stop_times))
    }

    /// Short and long name of a route, or `Unknown` for both.
    pub fn route_info(&self, route_id: Option<&str>) -> (String, String) {
        match route_id.and_then(|id| self.routes.get(id)) {
            Some(route) => (route.route_short_name.clone(), route.route_long_name.clone()),
            None => ("Unknown".to_owned(), "Unknown".to_owned()),
        }
    }

    /// First stop whose name matches `pattern`, compared case-insensitively as a regex.
    pub fn find_stop(&self, pattern: &str) -> Result<Option<&Stop>, SearchError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| SearchError::InvalidPattern {
                pattern: pattern.to_owned(),
                source,
            })?;
        Ok(self.stops.iter().find(|stop| regex.is_match(&stop.stop_name)))
    }

    pub fn trips_serving(&self, stop_id: &str) -> HashSet<&str> {
        self.trips_by_stop
            .get(stop_id)
            .map(|trips| trips.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn routes_of_trips(&self, trip_ids: &HashSet<&str>) -> HashSet<&str> {
        self.trips
            .iter()
            .filter(|trip| trip_ids.contains(trip.trip_id.as_str()))
            .map(|trip| trip.route_id.as_str())
            .collect()
    }
}
