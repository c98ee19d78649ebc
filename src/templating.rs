use askama::Template;
use tracing::debug;

use crate::error::RenderError;
use crate::page::{MountTarget, PageElement};
use crate::render::render_page;
use crate::search::Bus;
use crate::seats::Seat;
use crate::widget::LeafletScript;

/// The serialized bus list together with the script that maps it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MapBlock {
    pub bus_data: String,
    pub map_script: String,
}

impl MapBlock {
    /// Runs the map renderer over `bus_data` exactly as the page will carry it.
    pub fn build(bus_data: String) -> Result<Self, RenderError> {
        let element = PageElement::bus_data(bus_data.as_str());
        let mut widget = LeafletScript::new();
        render_page(&element, MountTarget::default(), &mut widget)?;
        debug!("map script places {} markers", widget.marker_count());
        Ok(Self {
            map_script: widget.script().to_owned(),
            bus_data,
        })
    }
}

#[derive(Clone, Debug, Template)]
#[template(path = "map.html")]
pub(crate) struct MapTemplate {
    pub bus_data: String,
    pub map_script: String,
}

impl From<MapBlock> for MapTemplate {
    fn from(block: MapBlock) -> Self {
        Self {
            bus_data: block.bus_data,
            map_script: block.map_script,
        }
    }
}

#[derive(Clone, Debug, Template)]
#[template(path = "results.html")]
pub(crate) struct ResultsTemplate {
    pub source: String,
    pub destination: String,
    pub buses: Vec<Bus>,
    pub bus_data: String,
    pub map_script: String,
}

impl ResultsTemplate {
    pub fn new(source: String, destination: String, buses: Vec<Bus>, block: MapBlock) -> Self {
        Self {
            source,
            destination,
            buses,
            bus_data: block.bus_data,
            map_script: block.map_script,
        }
    }
}

#[derive(Clone, Debug, Template)]
#[template(path = "bus_seats.html")]
pub(crate) struct BusSeatsTemplate {
    pub bus_id: String,
    pub seats: Vec<Seat>,
}
