use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use std::path::Path;

use crate::legend::Legend;
use crate::map::{BaseMap, LineStyle, MapConfig, View};
use crate::render::{MapSink, Marker};

#[derive(Debug, Clone)]
enum OverlayStyle {
    Markers,
    Outlines(LineStyle),
}

#[derive(Debug, Clone)]
struct Overlay {
    name: String,
    style: OverlayStyle,
    features: Vec<Feature>,
}

/// Map description written for the web front end: base maps, overlays as
/// GeoJSON, and the depth legend.
#[derive(Debug, Clone)]
pub struct MapDocument {
    view: View,
    base_maps: Vec<BaseMap>,
    layer_control: bool,
    overlays: Vec<Overlay>,
    legend: Legend,
}

impl MapDocument {
    /// An empty document with one overlay per configured layer.
    pub fn new(config: &MapConfig, legend: Legend) -> Self {
        let overlays = config
            .overlays()
            .into_iter()
            .map(|name| Overlay {
                name: name.to_string(),
                style: if config.plate_layer.as_deref() == Some(name) {
                    OverlayStyle::Outlines(config.plate_style.clone())
                } else {
                    OverlayStyle::Markers
                },
                features: Vec::new(),
            })
            .collect();

        Self {
            view: config.view,
            base_maps: config.base_maps.clone(),
            layer_control: config.layer_control,
            overlays,
            legend,
        }
    }

    /// The named overlay, appended as a marker overlay if it does not exist yet.
    fn overlay_mut(&mut self, layer: &str) -> &mut Overlay {
        let index = match self.overlays.iter().position(|o| o.name == layer) {
            Some(index) => index,
            None => {
                self.overlays.push(Overlay {
                    name: layer.to_string(),
                    style: OverlayStyle::Markers,
                    features: Vec::new(),
                });
                self.overlays.len() - 1
            }
        };
        &mut self.overlays[index]
    }

    /// Number of features on an overlay, `None` if the overlay does not exist.
    pub fn feature_count(&self, layer: &str) -> Option<usize> {
        self.overlays
            .iter()
            .find(|o| o.name == layer)
            .map(|o| o.features.len())
    }

    /// Overlays are emitted as an array so the layer control keeps their order.
    pub fn to_json(&self) -> serde_json::Value {
        let mut overlays = Vec::with_capacity(self.overlays.len());
        for overlay in &self.overlays {
            let (kind, style) = match &overlay.style {
                OverlayStyle::Markers => ("markers", serde_json::Value::Null),
                OverlayStyle::Outlines(style) => ("outlines", json!(style)),
            };
            let collection = FeatureCollection {
                bbox: None,
                features: overlay.features.clone(),
                foreign_members: None,
            };
            overlays.push(json!({
                "name": overlay.name,
                "kind": kind,
                "style": style,
                "data": collection,
            }));
        }

        json!({
            "view": self.view,
            "baseMaps": self.base_maps,
            "layerControl": self.layer_control,
            "overlays": overlays,
            "legend": self.legend,
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_json())?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

impl MapSink for MapDocument {
    fn add_marker(&mut self, layer: &str, marker: Marker) {
        let feature = marker_to_feature(&marker);
        self.overlay_mut(layer).features.push(feature);
    }

    fn add_outlines(&mut self, layer: &str, outlines: FeatureCollection, style: &LineStyle) {
        let overlay = self.overlay_mut(layer);
        overlay.style = OverlayStyle::Outlines(style.clone());
        overlay.features.extend(outlines.features);
    }
}

fn marker_to_feature(marker: &Marker) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("radius".to_string(), json!(marker.radius));
    properties.insert("fillColor".to_string(), json!(marker.fill_color));
    properties.insert("color".to_string(), json!(Marker::STROKE_COLOR));
    properties.insert("weight".to_string(), json!(Marker::STROKE_WEIGHT));
    properties.insert("opacity".to_string(), json!(Marker::OPACITY));
    properties.insert("fillOpacity".to_string(), json!(Marker::FILL_OPACITY));
    properties.insert("popup".to_string(), json!(marker.popup.to_string()));
    properties.insert("magnitude".to_string(), json!(marker.popup.magnitude));
    properties.insert("depth".to_string(), json!(marker.popup.depth_km));
    properties.insert("place".to_string(), json!(marker.popup.place));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            marker.longitude,
            marker.latitude,
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
