use std::fmt;

use rand::Rng;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatState {
    Available,
    Booked,
}

impl fmt::Display for SeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Available => "available",
            Self::Booked => "booked",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct Seat {
    pub id: u32,
    pub status: SeatState,
}

/// Seat availability for one bus. There is no booking source yet, so each
/// seat is a coin flip.
pub fn seat_map<R: Rng + ?Sized>(seat_count: u32, rng: &mut R) -> Vec<Seat> {
    (1..=seat_count)
        .map(|id| Seat {
            id,
            status: if rng.gen_bool(0.5) { SeatState::Available } else { SeatState::Booked },
        })
        .collect()
}

/// File name of the seat page for `bus_id`. Only ASCII letters, digits, `-`
/// and `_` survive, so the name never leaves the output directory.
pub fn seat_page_name(bus_id: &str) -> String {
    let stem: String = bus_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("bus_{}.html", stem)
}
