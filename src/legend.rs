use serde::Serialize;

use crate::style::{ColorToken, StyleResolver};

pub const DEFAULT_TITLE: &str = "Depth";

/// Screen corner a legend control is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

/// One swatch of the depth legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub color: ColorToken,
    pub label: String,
}

/// Legend content handed to the map front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub position: LegendPosition,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    pub fn new(resolver: &StyleResolver, position: LegendPosition) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            position,
            entries: build_legend(resolver),
        }
    }

    /// Prepend a `< {first bound}` swatch for the scale's `below` color.
    ///
    /// Off by default; the fine scale keeps one swatch per bucket.
    pub fn with_below_swatch(mut self, resolver: &StyleResolver) -> Self {
        if let Some(first) = resolver.scale().buckets().first() {
            let lower = first.lower_bound_km;
            self.entries.insert(
                0,
                LegendEntry {
                    color: resolver.resolve_color(lower - 1.0).clone(),
                    label: format!("< {lower}"),
                },
            );
        }
        self
    }
}

/// Build one legend entry per bucket of the resolver's scale.
///
/// Colors come from `resolve_color` itself, probed one kilometre above each
/// bucket's lower bound, so swatches always agree with marker fills.
///
/// The scale's `below` color has no entry here: on the coarse scale that is
/// everything shallower than 10 km. [`Legend::with_below_swatch`] adds it.
pub fn build_legend(resolver: &StyleResolver) -> Vec<LegendEntry> {
    let buckets = resolver.scale().buckets();
    buckets
        .iter()
        .enumerate()
        .map(|(i, bucket)| {
            let lower = bucket.lower_bound_km;
            let (label, probe) = match buckets.get(i + 1) {
                Some(next) => {
                    let upper = next.lower_bound_km;
                    let probe = if lower + 1.0 < upper {
                        lower + 1.0
                    } else {
                        lower + (upper - lower) / 2.0
                    };
                    (format!("{lower}\u{2013}{upper}"), probe)
                }
                None => (format!("{lower}+"), lower + 1.0),
            };
            LegendEntry {
                color: resolver.resolve_color(probe).clone(),
                label,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{DEFAULT_SCALE_FACTOR, DepthBucket, DepthScale};

    fn labels(entries: &[LegendEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn fine_legend_labels_and_colors() {
        let resolver = StyleResolver::new(DepthScale::fine(), DEFAULT_SCALE_FACTOR);
        let legend = build_legend(&resolver);
        assert_eq!(
            labels(&legend),
            vec!["-10–10", "10–30", "30–50", "50–70", "70–90", "90+"]
        );
        let colors: Vec<&str> = legend.iter().map(|e| e.color.as_str()).collect();
        assert_eq!(
            colors,
            vec!["#33cc33", "#ffff00", "#ffcc00", "#ff9933", "#ff6600", "#ff0000"]
        );
    }

    #[test]
    fn coarse_legend_labels() {
        let resolver = StyleResolver::new(DepthScale::coarse(), DEFAULT_SCALE_FACTOR);
        let legend = build_legend(&resolver);
        assert_eq!(labels(&legend), vec!["10–30", "30–50", "50+"]);
    }

    #[test]
    fn legend_colors_match_marker_colors() {
        for scale in [DepthScale::fine(), DepthScale::coarse()] {
            let resolver = StyleResolver::new(scale, DEFAULT_SCALE_FACTOR);
            let legend = build_legend(&resolver);
            let buckets = resolver.scale().buckets();
            assert_eq!(legend.len(), buckets.len());
            for (entry, bucket) in legend.iter().zip(buckets) {
                assert_eq!(&entry.color, resolver.resolve_color(bucket.lower_bound_km + 1.0));
                assert_eq!(entry.color, bucket.color);
            }
        }
    }

    #[test]
    fn narrow_buckets_probe_inside_the_bucket() {
        let c = |hex: &str| ColorToken::new(hex).unwrap();
        let scale = DepthScale::new(
            "narrow",
            c("#000000"),
            vec![
                DepthBucket {
                    lower_bound_km: 0.0,
                    color: c("#111111"),
                },
                DepthBucket {
                    lower_bound_km: 0.5,
                    color: c("#222222"),
                },
                DepthBucket {
                    lower_bound_km: 1.0,
                    color: c("#333333"),
                },
            ],
        )
        .unwrap();
        let resolver = StyleResolver::new(scale, 1.0);
        let legend = build_legend(&resolver);
        assert_eq!(labels(&legend), vec!["0–0.5", "0.5–1", "1+"]);
        let colors: Vec<&str> = legend.iter().map(|e| e.color.as_str()).collect();
        assert_eq!(colors, vec!["#111111", "#222222", "#333333"]);
    }

    #[test]
    fn below_swatch_covers_shallow_coarse_depths() {
        let resolver = StyleResolver::new(DepthScale::coarse(), DEFAULT_SCALE_FACTOR);
        let legend =
            Legend::new(&resolver, LegendPosition::default()).with_below_swatch(&resolver);
        assert_eq!(
            labels(&legend.entries),
            vec!["< 10", "10–30", "30–50", "50+"]
        );
        assert_eq!(legend.entries[0].color.as_str(), "#00ff00");
        assert_eq!(&legend.entries[0].color, resolver.resolve_color(5.0));
    }

    #[test]
    fn fine_legend_keeps_six_swatches_by_default() {
        let resolver = StyleResolver::new(DepthScale::fine(), DEFAULT_SCALE_FACTOR);
        let legend = Legend::new(&resolver, LegendPosition::default());
        assert_eq!(legend.entries.len(), 6);
        assert!(legend.entries.iter().all(|e| e.color.as_str() != "#00ff00"));
    }

    #[test]
    fn legend_is_idempotent() {
        let resolver = StyleResolver::default();
        assert_eq!(build_legend(&resolver), build_legend(&resolver));
    }

    #[test]
    fn legend_serializes_as_data() {
        let resolver = StyleResolver::new(DepthScale::coarse(), DEFAULT_SCALE_FACTOR);
        let legend = Legend::new(&resolver, LegendPosition::default());
        let value = serde_json::to_value(&legend).unwrap();
        assert_eq!(value["title"], "Depth");
        assert_eq!(value["position"], "bottomright");
        assert_eq!(value["entries"][0]["color"], "#ccff00");
        assert_eq!(value["entries"][2]["label"], "50+");
    }
}
