use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::feed::{FeedEntity, VehicleDescriptor};
use crate::gtfs::Timetable;
use crate::seats::seat_page_name;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Minutes to cover `dist_km`, rounded to one decimal.
pub fn eta_minutes(dist_km: f64, average_speed_kmh: f64) -> f64 {
    ((dist_km / average_speed_kmh) * 60.0 * 10.0).round() / 10.0
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum MatchType {
    #[serde(rename = "Exact Trip Match")]
    ExactTrip,
    #[serde(rename = "Route Match")]
    Route,
    #[serde(rename = "Nearby Bus")]
    Nearby,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExactTrip => "Exact Trip Match",
            Self::Route => "Route Match",
            Self::Nearby => "Nearby Bus",
        })
    }
}

/// How many seats are left, judged from the load factor.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum SeatStatus {
    Low,
    Medium,
    High,
}

impl SeatStatus {
    pub fn from_load_factor(factor: f64) -> Self {
        if factor > 0.7 {
            Self::Low
        } else if factor > 0.4 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_load_factor(rng.gen())
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A bus found for a search, as written into the results page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bus {
    pub bus_number: String,
    pub bus_name: String,
    pub license_plate: String,
    pub lat: f64,
    pub lon: f64,
    pub eta: String,
    #[serde(rename = "match")]
    pub match_type: MatchType,
    pub seats: SeatStatus,
}

impl Bus {
    /// Seat page linked from the results table.
    pub fn seat_page(&self) -> String {
        seat_page_name(&self.license_plate)
    }
}

/// Finds the live buses relevant to a trip from `source` to `destination`.
///
/// Both names are matched as case-insensitive patterns against stop names. An
/// unknown stop yields no buses.
pub fn search_buses<R: Rng + ?Sized>(
    timetable: &Timetable,
    entities: &[FeedEntity],
    source: &str,
    destination: &str,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<Vec<Bus>, SearchError> {
    let (source_stop, dest_stop) = match (timetable.find_stop(source)?, timetable.find_stop(destination)?) {
        (Some(s), Some(d)) => (s, d),
        _ => {
            info!("no stop matches {:?} or {:?}", source, destination);
            return Ok(Vec::new());
        },
    };

    let trips_with_source = timetable.trips_serving(&source_stop.stop_id);
    let trips_with_dest = timetable.trips_serving(&dest_stop.stop_id);
    let valid_trips: HashSet<&str> = trips_with_source.intersection(&trips_with_dest).copied().collect();
    let valid_routes = timetable.routes_of_trips(&valid_trips);

    info!("Live buses fetched: {}", entities.len());

    let mut buses = Vec::new();
    for entity in entities {
        let Some(vehicle) = &entity.vehicle else {
            continue;
        };
        let Some(pos) = vehicle.position else {
            debug!("skipping vehicle {:?} without position", entity.id);
            continue;
        };

        let trip_id = vehicle.trip.as_ref().and_then(|t| t.trip_id.as_deref());
        let route_id = vehicle.trip.as_ref().and_then(|t| t.route_id.as_deref());

        let (bus_number, bus_name) = timetable.route_info(route_id);
        let license_plate = VehicleDescriptor::license_plate(vehicle.vehicle.as_ref());

        let dist_km = haversine(pos.latitude, pos.longitude, source_stop.stop_lat, source_stop.stop_lon);
        let eta = eta_minutes(dist_km, config.average_speed_kmh);

        let match_type = if trip_id.map_or(false, |id| valid_trips.contains(id)) {
            MatchType::ExactTrip
        } else if route_id.map_or(false, |id| valid_routes.contains(id)) {
            MatchType::Route
        } else if dist_km <= config.nearby_radius_km {
            MatchType::Nearby
        } else {
            continue;
        };

        buses.push(Bus {
            bus_number,
            bus_name,
            license_plate,
            lat: pos.latitude,
            lon: pos.longitude,
            eta: format!("{:.1} min", eta),
            match_type,
            seats: SeatStatus::sample(rng),
        });
    }
    info!("{} buses match {:?} -> {:?}", buses.len(), source, destination);
    Ok(buses)
}
