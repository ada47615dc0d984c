use clap::ValueEnum;
use serde::Serialize;

use crate::legend::LegendPosition;
use crate::style::ColorToken;

pub const EARTHQUAKE_LAYER: &str = "Earthquakes";
pub const PLATE_LAYER: &str = "Tectonic Plates";

const OSM_ATTRIBUTION: &str =
    "Map data &copy; <a href=\"https://www.openstreetmap.org/\">OpenStreetMap</a> contributors";

/// How a map organizes its layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Earthquakes only, on one OpenStreetMap base map.
    Single,
    /// Earthquakes and plate boundaries as toggleable overlays.
    Layered,
    /// Layered, plus a topographic base map to switch to.
    Switcher,
}

/// A tiled base map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseMap {
    pub name: String,
    pub url_template: String,
    pub attribution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<u8>,
}

impl BaseMap {
    pub fn openstreetmap() -> Self {
        Self {
            name: "OpenStreetMap".to_string(),
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: OSM_ATTRIBUTION.to_string(),
            max_zoom: None,
        }
    }

    pub fn esri_topo() -> Self {
        Self {
            name: "Topographic Map".to_string(),
            url_template:
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Topo_Map/MapServer/tile/{z}/{y}/{x}"
                    .to_string(),
            attribution: "Tiles &copy; Esri".to_string(),
            max_zoom: Some(17),
        }
    }
}

/// Stroke style for plate boundary lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: ColorToken,
    pub weight: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: ColorToken::from_static("#ff0000"),
            weight: 2.0,
        }
    }
}

/// Initial viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct View {
    /// `[lat, lon]`
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Default for View {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            zoom: 2,
        }
    }
}

/// Everything one map instance needs, built once and passed by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub layout: Layout,
    pub view: View,
    pub base_maps: Vec<BaseMap>,
    pub earthquake_layer: String,
    pub plate_layer: Option<String>,
    pub plate_style: LineStyle,
    pub legend_position: LegendPosition,
    /// Whether the front end shows a layer/base-map toggle.
    pub layer_control: bool,
}

impl MapConfig {
    pub fn new(layout: Layout) -> Self {
        let (base_maps, plate_layer, layer_control) = match layout {
            Layout::Single => (vec![BaseMap::openstreetmap()], None, false),
            Layout::Layered => (
                vec![BaseMap::openstreetmap()],
                Some(PLATE_LAYER.to_string()),
                true,
            ),
            Layout::Switcher => (
                vec![BaseMap::openstreetmap(), BaseMap::esri_topo()],
                Some(PLATE_LAYER.to_string()),
                true,
            ),
        };

        Self {
            layout,
            view: View::default(),
            base_maps,
            earthquake_layer: EARTHQUAKE_LAYER.to_string(),
            plate_layer,
            plate_style: LineStyle::default(),
            legend_position: LegendPosition::default(),
            layer_control,
        }
    }

    /// Overlay names in display order.
    pub fn overlays(&self) -> Vec<&str> {
        std::iter::once(self.earthquake_layer.as_str())
            .chain(self.plate_layer.as_deref())
            .collect()
    }
}
