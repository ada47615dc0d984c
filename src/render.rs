use geojson::FeatureCollection;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

use crate::feed::EarthquakeFeature;
use crate::map::{LineStyle, MapConfig};
use crate::style::{ColorToken, StyleResolver};

/// Popup data for one marker. Markup is the front end's business.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub magnitude: f64,
    pub depth_km: f64,
    pub place: String,
}

impl fmt::Display for Popup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Magnitude: {} / Depth: {} / Location: {}",
            self.magnitude, self.depth_km, self.place
        )
    }
}

/// A circle marker ready to be placed on an overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub fill_color: ColorToken,
    pub popup: Popup,
}

impl Marker {
    pub const STROKE_COLOR: &'static str = "#000";
    pub const STROKE_WEIGHT: f64 = 1.0;
    pub const OPACITY: f64 = 1.0;
    pub const FILL_OPACITY: f64 = 0.8;
}

/// The map library side: receives styled markers and plate outlines.
pub trait MapSink {
    fn add_marker(&mut self, layer: &str, marker: Marker);

    fn add_outlines(&mut self, layer: &str, outlines: FeatureCollection, style: &LineStyle);
}

/// Counts from one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub drawn: usize,
    /// Features whose radius came out non-positive or non-finite.
    pub skipped: usize,
}

/// Styles features and hands them to a [`MapSink`].
pub struct FeatureRenderer<'a> {
    config: &'a MapConfig,
    resolver: &'a StyleResolver,
}

impl<'a> FeatureRenderer<'a> {
    pub fn new(config: &'a MapConfig, resolver: &'a StyleResolver) -> Self {
        Self { config, resolver }
    }

    /// Style a single feature. `None` when there is nothing to draw.
    pub fn marker(&self, feature: &EarthquakeFeature) -> Option<Marker> {
        let style = self.resolver.style(feature);
        if !(style.radius.is_finite() && style.radius > 0.0) {
            return None;
        }
        Some(Marker {
            latitude: feature.latitude(),
            longitude: feature.longitude(),
            radius: style.radius,
            fill_color: style.color,
            popup: Popup {
                magnitude: feature.magnitude,
                depth_km: feature.depth_km,
                place: feature.place.clone(),
            },
        })
    }

    /// Render every earthquake onto the configured earthquake overlay, in order.
    pub fn render_earthquakes(
        &self,
        features: &[EarthquakeFeature],
        sink: &mut dyn MapSink,
        progress: Option<&ProgressBar>,
    ) -> RenderSummary {
        let markers: Vec<Option<Marker>> = features
            .par_iter()
            .map(|feature| {
                let marker = self.marker(feature);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                marker
            })
            .collect();

        let mut summary = RenderSummary::default();
        for marker in markers {
            match marker {
                Some(marker) => {
                    sink.add_marker(&self.config.earthquake_layer, marker);
                    summary.drawn += 1;
                }
                None => summary.skipped += 1,
            }
        }
        summary
    }

    /// Place plate boundaries on the plate overlay. No-op for layouts without one.
    pub fn render_plates(&self, plates: FeatureCollection, sink: &mut dyn MapSink) -> bool {
        match &self.config.plate_layer {
            Some(layer) => {
                sink.add_outlines(layer, plates, &self.config.plate_style);
                true
            }
            None => false,
        }
    }
}
