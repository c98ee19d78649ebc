use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::data::{Interpolated, Number};
use crate::error::RenderError;
use crate::page::MountTarget;

pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 28.6139,
    lon: 77.2090,
};
pub const DEFAULT_ZOOM: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Converts raw record coordinates, accepting numbers and numeric strings.
    pub fn from_values(lat: Option<&Value>, lon: Option<&Value>) -> Result<Self, RenderError> {
        match (coordinate(lat), coordinate(lon)) {
            (Some(lat), Some(lon)) => Ok(Self::new(lat, lon)),
            _ => Err(RenderError::InvalidLatLng {
                lat: Interpolated(lat).to_string(),
                lon: Interpolated(lon).to_string(),
            }),
        }
    }
}

static DECIMAL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(
    r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)$"
).expect("failed to compile regex"));
static RADIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(
    "^0(?:(?P<hex>[xX][0-9a-fA-F]+)|(?P<oct>[oO][0-7]+)|(?P<bin>[bB][01]+))$"
).expect("failed to compile regex"));

fn coordinate(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => string_to_number(s),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => return None,
    };
    (!number.is_nan()).then_some(number)
}

/// Numeric value of a string under the page's string-to-number rules; `NaN` if it has none.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    if DECIMAL_REGEX.is_match(s) {
        // Rust spells infinity "inf"; only the "Infinity" spelling reaches here
        return match s {
            "Infinity" | "+Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            _ => s.parse().unwrap_or(f64::NAN),
        };
    }
    if let Some(caps) = RADIX_REGEX.captures(s) {
        let (digits, radix) = if let Some(m) = caps.name("hex") {
            (m.as_str(), 16)
        } else if let Some(m) = caps.name("oct") {
            (m.as_str(), 8)
        } else if let Some(m) = caps.name("bin") {
            (m.as_str(), 2)
        } else {
            return f64::NAN;
        };
        return digits[1..]
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    }
    f64::NAN
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
}

impl TileLayer {
    pub fn openstreetmap() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_owned(),
            attribution: "© OpenStreetMap contributors".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub usize);

/// The mapping primitives the renderer draws with.
pub trait MapWidget {
    fn create_view(&mut self, target: &MountTarget, center: LatLng, zoom: u8) -> Result<(), RenderError>;
    fn add_tile_layer(&mut self, layer: &TileLayer) -> Result<(), RenderError>;
    fn add_marker(&mut self, position: LatLng) -> Result<MarkerHandle, RenderError>;
    fn bind_popup(&mut self, marker: MarkerHandle, content: &str) -> Result<(), RenderError>;
}

/// Builds the Leaflet script that draws the map once the page loads.
#[derive(Debug, Default)]
pub struct LeafletScript {
    target: Option<MountTarget>,
    script: String,
    markers: usize,
}

impl LeafletScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_count(&self) -> usize {
        self.markers
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    fn require_view(&self) -> Result<(), RenderError> {
        match self.target {
            Some(_) => Ok(()),
            None => Err(RenderError::NoView),
        }
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        // writing into a String cannot fail
        let _ = self.script.write_fmt(args);
        self.script.push('\n');
    }
}

impl MapWidget for LeafletScript {
    fn create_view(&mut self, target: &MountTarget, center: LatLng, zoom: u8) -> Result<(), RenderError> {
        if let Some(existing) = &self.target {
            return Err(RenderError::AlreadyInitialized {
                target: existing.id().to_owned(),
            });
        }
        self.line(format_args!(
            "const map = L.map({}).setView([{}, {}], {});",
            js_string(target.id()),
            Number(center.lat),
            Number(center.lon),
            zoom,
        ));
        self.target = Some(target.clone());
        Ok(())
    }

    fn add_tile_layer(&mut self, layer: &TileLayer) -> Result<(), RenderError> {
        self.require_view()?;
        self.line(format_args!(
            "L.tileLayer({}, {{ attribution: {} }}).addTo(map);",
            js_string(&layer.url_template),
            js_string(&layer.attribution),
        ));
        Ok(())
    }

    fn add_marker(&mut self, position: LatLng) -> Result<MarkerHandle, RenderError> {
        self.require_view()?;
        let handle = MarkerHandle(self.markers);
        self.line(format_args!(
            "const marker{} = L.marker([{}, {}]).addTo(map);",
            handle.0,
            Number(position.lat),
            Number(position.lon),
        ));
        self.markers += 1;
        Ok(handle)
    }

    fn bind_popup(&mut self, marker: MarkerHandle, content: &str) -> Result<(), RenderError> {
        if marker.0 >= self.markers {
            return Err(RenderError::NoSuchMarker(marker.0));
        }
        self.line(format_args!("marker{}.bindPopup({});", marker.0, js_string(content)));
        Ok(())
    }
}

/// Quotes `s` as a script string literal that is safe inside a `<script>` element.
pub fn js_string(s: &str) -> String {
    Value::String(s.to_owned()).to_string().replace("</", "<\\/")
}
