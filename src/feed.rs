use anyhow::{Context, Result, bail};
use geo::Point;
use geojson::{FeatureCollection, GeoJson, Value};
use std::path::Path;
use tracing::warn;

pub const USGS_ALL_WEEK: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson";

pub const PB2002_PLATES: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_plates.json";

/// A single earthquake from the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeFeature {
    /// `x` is longitude, `y` is latitude.
    pub location: Point<f64>,
    pub depth_km: f64,
    pub magnitude: f64,
    pub place: String,
}

impl EarthquakeFeature {
    pub fn longitude(&self) -> f64 {
        self.location.x()
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }
}

/// Build the HTTP client used for both feeds.
pub fn client() -> Result<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .user_agent("quake-map/0.1 (earthquake map builder)")
        .build()?;
    Ok(client)
}

/// Fetch a feed body. Anything without an http(s) scheme is read from disk.
pub fn fetch_text(client: &reqwest::blocking::Client, source: &str) -> Result<String> {
    if !(source.starts_with("http://") || source.starts_with("https://")) {
        return std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("Failed to read {}", source));
    }

    let response = client.get(source).send()?.error_for_status()?;
    let body = response.text()?;
    Ok(body)
}

/// Fetch and parse the earthquake feed.
pub fn fetch_earthquakes(
    client: &reqwest::blocking::Client,
    source: &str,
) -> Result<Vec<EarthquakeFeature>> {
    let body = fetch_text(client, source)?;
    parse_earthquakes(&body).with_context(|| format!("Failed to parse earthquake feed {}", source))
}

/// Fetch the tectonic plate boundaries as an opaque FeatureCollection.
pub fn fetch_plates(client: &reqwest::blocking::Client, source: &str) -> Result<FeatureCollection> {
    let body = fetch_text(client, source)?;
    parse_collection(&body).with_context(|| format!("Failed to parse plate boundaries {}", source))
}

/// Like [`fetch_earthquakes`], but a feed that cannot be fetched or parsed
/// is logged and yields no earthquakes.
pub fn earthquakes_or_empty(
    client: &reqwest::blocking::Client,
    source: &str,
) -> Vec<EarthquakeFeature> {
    match fetch_earthquakes(client, source) {
        Ok(quakes) => quakes,
        Err(e) => {
            warn!("Earthquake feed unavailable, rendering without markers: {e:#}");
            Vec::new()
        }
    }
}

/// Like [`fetch_plates`], but failures are logged and yield `None`.
pub fn plates_or_none(
    client: &reqwest::blocking::Client,
    source: &str,
) -> Option<FeatureCollection> {
    match fetch_plates(client, source) {
        Ok(plates) => Some(plates),
        Err(e) => {
            warn!("Plate boundaries unavailable, leaving overlay empty: {e:#}");
            None
        }
    }
}

fn parse_collection(json: &str) -> Result<FeatureCollection> {
    match json.parse::<GeoJson>().context("Invalid GeoJSON")? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(_) => bail!("Expected a FeatureCollection, found a Feature"),
        GeoJson::Geometry(_) => bail!("Expected a FeatureCollection, found a Geometry"),
    }
}

/// Parse a USGS summary FeatureCollection.
///
/// Features without a `[lon, lat, depth]` point or a numeric `mag` are
/// skipped; the feed carries `"mag": null` for some events.
pub fn parse_earthquakes(json: &str) -> Result<Vec<EarthquakeFeature>> {
    let collection = parse_collection(json)?;

    let quakes = collection
        .features
        .iter()
        .filter_map(|feature| {
            let Some(Value::Point(coords)) = feature.geometry.as_ref().map(|g| &g.value) else {
                return None;
            };
            let [lon, lat, depth_km, ..] = coords.as_slice() else {
                return None;
            };
            let magnitude = feature.property("mag").and_then(|v| v.as_f64())?;
            let place = feature
                .property("place")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            Some(EarthquakeFeature {
                location: Point::new(*lon, *lat),
                depth_km: *depth_km,
                magnitude,
                place,
            })
        })
        .collect();

    Ok(quakes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_earthquakes_basic() {
        let json = r#"{
            "type": "FeatureCollection",
            "metadata": {"title": "USGS All Earthquakes, Past Week"},
            "features": [
                {
                    "type": "Feature",
                    "properties": {"mag": 4.6, "place": "10 km SSW of Ocotillo, CA"},
                    "geometry": {"type": "Point", "coordinates": [-116.05, 32.65, 12.3]},
                    "id": "ci1"
                },
                {
                    "type": "Feature",
                    "properties": {"mag": 1.2, "place": "5 km N of Anza, CA"},
                    "geometry": {"type": "Point", "coordinates": [-116.67, 33.6, -0.5]},
                    "id": "ci2"
                }
            ]
        }"#;

        let quakes = parse_earthquakes(json).unwrap();
        assert_eq!(quakes.len(), 2);
        assert_eq!(quakes[0].longitude(), -116.05);
        assert_eq!(quakes[0].latitude(), 32.65);
        assert_eq!(quakes[0].depth_km, 12.3);
        assert_eq!(quakes[0].magnitude, 4.6);
        assert_eq!(quakes[0].place, "10 km SSW of Ocotillo, CA");
        assert_eq!(quakes[1].depth_km, -0.5);
    }

    #[test]
    fn parse_earthquakes_skips_incomplete_features() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"mag": null, "place": "no magnitude"},
                    "geometry": {"type": "Point", "coordinates": [1.0, 2.0, 3.0]}
                },
                {
                    "type": "Feature",
                    "properties": {"mag": 2.0, "place": "no depth"},
                    "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}
                },
                {
                    "type": "Feature",
                    "properties": {"mag": 2.0},
                    "geometry": null
                },
                {
                    "type": "Feature",
                    "properties": {"mag": 3.1},
                    "geometry": {"type": "Point", "coordinates": [5.0, 6.0, 7.0]}
                }
            ]
        }"#;

        let quakes = parse_earthquakes(json).unwrap();
        assert_eq!(quakes.len(), 1);
        assert_eq!(quakes[0].magnitude, 3.1);
        assert_eq!(quakes[0].place, "");
    }

    #[test]
    fn parse_earthquakes_empty() {
        let json = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(parse_earthquakes(json).unwrap().is_empty());
    }

    #[test]
    fn parse_earthquakes_rejects_non_collections() {
        let json = r#"{"type": "Point", "coordinates": [1.0, 2.0, 3.0]}"#;
        assert!(parse_earthquakes(json).is_err());
        assert!(parse_earthquakes("not json").is_err());
    }

    #[test]
    fn fetch_reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plates.json");
        std::fs::write(
            &path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"PlateName": "Africa"},
                 "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}}
            ]}"#,
        )
        .unwrap();

        let client = client().unwrap();
        let plates = fetch_plates(&client, path.to_str().unwrap()).unwrap();
        assert_eq!(plates.features.len(), 1);

        assert!(fetch_plates(&client, dir.path().join("missing.json").to_str().unwrap()).is_err());
    }

    #[test]
    fn fetch_earthquakes_reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_week.geojson");
        std::fs::write(
            &path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"mag": 5.2, "place": "Fiji region"},
                 "geometry": {"type": "Point", "coordinates": [-178.1, -17.9, 560.0]}}
            ]}"#,
        )
        .unwrap();

        let client = client().unwrap();
        let quakes = fetch_earthquakes(&client, path.to_str().unwrap()).unwrap();
        assert_eq!(quakes.len(), 1);
        assert_eq!(quakes[0].depth_km, 560.0);
        assert_eq!(earthquakes_or_empty(&client, path.to_str().unwrap()), quakes);
    }

    #[test]
    fn unavailable_feeds_degrade_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.geojson");
        let malformed = dir.path().join("malformed.geojson");
        std::fs::write(&malformed, "{\"type\": \"FeatureCollection\", \"features\": [").unwrap();

        let client = client().unwrap();
        for source in [&missing, &malformed] {
            let source = source.to_str().unwrap();
            assert!(earthquakes_or_empty(&client, source).is_empty());
            assert!(plates_or_none(&client, source).is_none());
        }
    }
}
