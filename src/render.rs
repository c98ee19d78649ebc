use tracing::{debug, info};

use crate::data::{BusRecord, Interpolated};
use crate::error::RenderError;
use crate::page::{MountTarget, PageElement, BUS_DATA_KEY};
use crate::widget::{LatLng, MapWidget, TileLayer, DEFAULT_CENTER, DEFAULT_ZOOM};

/// Everything one render needs: the buses to draw and where to draw them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderContext {
    pub buses: Vec<BusRecord>,
    pub target: MountTarget,
}

impl RenderContext {
    pub fn new(buses: Vec<BusRecord>, target: MountTarget) -> Self {
        Self { buses, target }
    }

    /// Decodes the bus list stored on `element`.
    pub fn from_element(element: &PageElement, target: MountTarget) -> Result<Self, RenderError> {
        let payload = element
            .data(BUS_DATA_KEY)
            .ok_or_else(|| RenderError::MissingAttribute {
                element: element.id.clone(),
                attribute: format!("data-{}", BUS_DATA_KEY),
            })?;
        let buses: Vec<BusRecord> = serde_json::from_str(payload)?;
        Ok(Self::new(buses, target))
    }
}

pub fn popup_content(bus: &BusRecord) -> String {
    format!(
        "Bus: {}<br>\n         ETA: {}<br>\n         Seats: {}",
        Interpolated(bus.bus_number.as_ref()),
        Interpolated(bus.eta.as_ref()),
        Interpolated(bus.seats.as_ref()),
    )
}

/// Draws the map and one marker per bus that has coordinates.
///
/// Stops at the first marker the widget rejects; markers placed before it stay.
pub fn render<W: MapWidget>(context: &RenderContext, widget: &mut W) -> Result<(), RenderError> {
    widget.create_view(&context.target, DEFAULT_CENTER, DEFAULT_ZOOM)?;
    widget.add_tile_layer(&TileLayer::openstreetmap())?;

    for bus in &context.buses {
        if !bus.has_coordinates() {
            continue;
        }
        let position = LatLng::from_values(bus.lat.as_ref(), bus.lon.as_ref())?;
        let marker = widget.add_marker(position)?;
        widget.bind_popup(marker, &popup_content(bus))?;
    }
    Ok(())
}

/// Reads the bus list from `element` and renders it into `target`.
pub fn render_page<W: MapWidget>(element: &PageElement, target: MountTarget, widget: &mut W) -> Result<(), RenderError> {
    info!("map renderer loaded");
    let context = RenderContext::from_element(element, target)?;
    debug!("rendering {} buses", context.buses.len());
    render(&context, widget)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::data::BusRecord;
    use crate::error::RenderError;
    use crate::page::{MountTarget, PageElement};
    use crate::widget::{LatLng, LeafletScript, MapWidget, MarkerHandle, TileLayer};

    use super::{popup_content, render, render_page, RenderContext};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        CreateView(String, LatLng, u8),
        AddTileLayer(TileLayer),
        AddMarker(LatLng),
        BindPopup(MarkerHandle, String),
    }

    #[derive(Debug, Default)]
    struct RecordingWidget {
        calls: Vec<Call>,
        markers: usize,
    }

    impl RecordingWidget {
        fn markers(&self) -> Vec<LatLng> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::AddMarker(pos) => Some(*pos),
                    _ => None,
                })
                .collect()
        }

        fn popups(&self) -> Vec<&str> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::BindPopup(_, content) => Some(content.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl MapWidget for RecordingWidget {
        fn create_view(&mut self, target: &MountTarget, center: LatLng, zoom: u8) -> Result<(), RenderError> {
            self.calls.push(Call::CreateView(target.id().to_owned(), center, zoom));
            Ok(())
        }

        fn add_tile_layer(&mut self, layer: &TileLayer) -> Result<(), RenderError> {
            self.calls.push(Call::AddTileLayer(layer.clone()));
            Ok(())
        }

        fn add_marker(&mut self, position: LatLng) -> Result<MarkerHandle, RenderError> {
            self.calls.push(Call::AddMarker(position));
            self.markers += 1;
            Ok(MarkerHandle(self.markers - 1))
        }

        fn bind_popup(&mut self, marker: MarkerHandle, content: &str) -> Result<(), RenderError> {
            self.calls.push(Call::BindPopup(marker, content.to_owned()));
            Ok(())
        }
    }

    fn context(buses: serde_json::Value) -> RenderContext {
        let buses: Vec<BusRecord> = serde_json::from_value(buses).unwrap();
        RenderContext::new(buses, MountTarget::default())
    }

    #[test]
    fn test_empty_input_still_creates_view() {
        let mut widget = RecordingWidget::default();
        render(&context(json!([])), &mut widget).unwrap();

        assert_eq!(
            widget.calls,
            vec![
                Call::CreateView("map".to_owned(), LatLng::new(28.6139, 77.2090), 12),
                Call::AddTileLayer(TileLayer::openstreetmap()),
            ],
        );
    }

    #[test]
    fn test_coordinate_filter() {
        let mut widget = RecordingWidget::default();
        let ctx = context(json!([
            {"bus_number": "1", "lat": 28.6, "lon": 77.2},
            {"bus_number": "2", "lat": null, "lon": 77.2},
            {"bus_number": "3", "lat": 0, "lon": 0},
            {"bus_number": "4", "lon": 77.3},
            {"bus_number": "5", "lat": 28.7, "lon": 77.4},
        ]));
        render(&ctx, &mut widget).unwrap();

        assert_eq!(widget.markers(), vec![LatLng::new(28.6, 77.2), LatLng::new(28.7, 77.4)]);
    }

    #[test]
    fn test_markers_in_input_order() {
        let mut widget = RecordingWidget::default();
        let ctx = context(json!([
            {"bus_number": "c", "lat": 3.0, "lon": 3.0},
            {"bus_number": "a", "lat": 1.0, "lon": 1.0},
            {"bus_number": "b", "lat": 2.0, "lon": 2.0},
        ]));
        render(&ctx, &mut widget).unwrap();

        assert_eq!(
            widget.markers(),
            vec![LatLng::new(3.0, 3.0), LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0)],
        );
        let popups = widget.popups();
        assert!(popups[0].starts_with("Bus: c<br>"));
        assert!(popups[1].starts_with("Bus: a<br>"));
        assert!(popups[2].starts_with("Bus: b<br>"));

        // each popup is bound right after its marker
        for pair in widget.calls[2..].chunks(2) {
            match pair {
                [Call::AddMarker(_), Call::BindPopup(_, _)] => {},
                other => panic!("unexpected call sequence {:?}", other),
            }
        }
    }

    #[test]
    fn test_popup_content() {
        let bus: BusRecord = serde_json::from_value(json!({
            "bus_number": "42A", "eta": "5 min", "seats": 12, "lat": 28.6, "lon": 77.2,
        })).unwrap();
        let content = popup_content(&bus);

        let bus_pos = content.find("Bus: 42A").unwrap();
        let eta_pos = content.find("ETA: 5 min").unwrap();
        let seats_pos = content.find("Seats: 12").unwrap();
        assert!(bus_pos < eta_pos && eta_pos < seats_pos);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_popup_content_is_not_escaped() {
        let bus: BusRecord = serde_json::from_value(json!({
            "bus_number": "<b>7</b>", "eta": 4.5, "seats": "Low",
        })).unwrap();
        assert!(popup_content(&bus).starts_with("Bus: <b>7</b><br>"));
        assert!(popup_content(&bus).contains("ETA: 4.5<br>"));
    }

    #[test]
    fn test_malformed_input_aborts() {
        let mut widget = RecordingWidget::default();
        let element = PageElement::bus_data("[{\"bus_number\": ");
        let err = render_page(&element, MountTarget::default(), &mut widget).unwrap_err();

        assert!(matches!(err, RenderError::MalformedInput(_)));
        assert!(widget.calls.is_empty());
    }

    #[test]
    fn test_non_object_record_is_skipped() {
        let mut widget = RecordingWidget::default();
        let element = PageElement::bus_data(r#"[1, "x", null, {"bus_number": "a", "lat": 1, "lon": 2}]"#);
        render_page(&element, MountTarget::default(), &mut widget).unwrap();

        assert!(matches!(widget.calls[0], Call::CreateView(..)));
        assert_eq!(widget.markers(), vec![LatLng::new(1.0, 2.0)]);
        assert_eq!(widget.popups().len(), 1);
        assert!(widget.popups()[0].starts_with("Bus: a<br>"));
    }

    #[test]
    fn test_repeated_key_uses_last_value() {
        let mut widget = RecordingWidget::default();
        let element = PageElement::bus_data(r#"[{"lat": 1, "lat": 2, "lon": 3}]"#);
        render_page(&element, MountTarget::default(), &mut widget).unwrap();

        assert_eq!(widget.markers(), vec![LatLng::new(2.0, 3.0)]);
    }

    #[test]
    fn test_missing_attribute_aborts() {
        let mut widget = RecordingWidget::default();
        let element = PageElement::new("bus-data");
        let err = render_page(&element, MountTarget::default(), &mut widget).unwrap_err();

        assert!(matches!(err, RenderError::MissingAttribute { .. }));
        assert!(widget.calls.is_empty());
    }

    #[test]
    fn test_invalid_coordinate_stops_iteration() {
        let mut widget = RecordingWidget::default();
        let ctx = context(json!([
            {"bus_number": "1", "lat": 28.6, "lon": 77.2},
            {"bus_number": "2", "lat": "north", "lon": 77.2},
            {"bus_number": "3", "lat": 28.7, "lon": 77.4},
        ]));
        let err = render(&ctx, &mut widget).unwrap_err();

        assert!(matches!(err, RenderError::InvalidLatLng { .. }));
        assert_eq!(widget.markers(), vec![LatLng::new(28.6, 77.2)]);
    }

    #[test]
    fn test_render_page_into_script() {
        let mut widget = LeafletScript::new();
        let element = PageElement::bus_data(
            r#"[{"bus_number": "42A", "eta": "5 min", "seats": 12, "lat": 28.6, "lon": 77.2}]"#,
        );
        render_page(&element, MountTarget::default(), &mut widget).unwrap();

        assert_eq!(widget.marker_count(), 1);
        assert!(widget.script().contains("L.marker([28.6, 77.2]).addTo(map);"));
        assert!(widget.script().contains("bindPopup(\"Bus: 42A<br>\\n         ETA: 5 min<br>\\n         Seats: 12\")"));
    }

    #[test]
    fn test_second_render_keeps_first_output() {
        let mut widget = LeafletScript::new();
        let element = PageElement::bus_data(r#"[{"bus_number": "1", "lat": 1.5, "lon": 2.5}]"#);
        render_page(&element, MountTarget::default(), &mut widget).unwrap();
        let first = widget.script().to_owned();

        let err = render_page(&element, MountTarget::default(), &mut widget).unwrap_err();
        assert!(matches!(err, RenderError::AlreadyInitialized { .. }));
        assert_eq!(widget.script(), first);
        assert_eq!(widget.marker_count(), 1);
    }
}
