//! 2x2 diagnostic dashboard: pm25/aqi scatter, PCA view, aqi box plot by
//! cluster and pollutant correlation heatmap.

use crate::analyzers::{CorrelationMatrix, Pca};
use crate::error::{ProcessingError, Result};
use crate::models::{ClusterLabel, LocationTable, Metric};
use crate::processors::ScaledFeatures;
use crate::utils::constants::{CHART_HEIGHT, CHART_WIDTH, PCA_COMPONENTS};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info};

const CLUSTERED: RGBColor = RGBColor(34, 139, 34);
const NOISE: RGBColor = RGBColor(220, 20, 60);
const DARK_RED: RGBColor = RGBColor(139, 0, 0);

const TITLE_FONT: (&str, u32) = ("sans-serif", 22);

#[derive(Debug, Clone, PartialEq)]
pub struct MarkedPoint {
    pub x: f64,
    pub y: f64,
    pub hotspot: bool,
}

#[derive(Debug, Clone)]
pub struct Projection {
    pub points: Vec<MarkedPoint>,
    pub explained_variance: f64,
}

/// Everything the dashboard draws, computed up front
#[derive(Debug, Clone)]
pub struct ChartData {
    /// pm25 vs aqi for rows carrying both
    pub scatter: Vec<MarkedPoint>,
    pub projection: Option<Projection>,
    /// aqi values per cluster label, noise first
    pub aqi_by_cluster: Vec<(ClusterLabel, Vec<f64>)>,
    pub correlations: CorrelationMatrix,
}

impl ChartData {
    pub fn build(table: &LocationTable, features: &ScaledFeatures) -> Self {
        let scatter = table
            .locations
            .iter()
            .filter_map(|l| {
                Some(MarkedPoint {
                    x: l.mean(Metric::Pm25)?,
                    y: l.aqi()?,
                    hotspot: l.is_hotspot(),
                })
            })
            .collect();

        let mut pca = Pca::new(PCA_COMPONENTS);
        let projection = match pca.fit_transform(&features.matrix) {
            Ok(projected) => Some(Projection {
                points: table
                    .locations
                    .iter()
                    .enumerate()
                    .map(|(i, l)| MarkedPoint {
                        x: projected[(i, 0)],
                        y: if projected.ncols() > 1 { projected[(i, 1)] } else { 0.0 },
                        hotspot: l.is_hotspot(),
                    })
                    .collect(),
                explained_variance: pca.cumulative_explained_variance().unwrap_or(0.0),
            }),
            Err(e) => {
                debug!("Skipping PCA view: {}", e);
                None
            }
        };

        let mut groups: BTreeMap<ClusterLabel, Vec<f64>> = BTreeMap::new();
        for location in &table.locations {
            if let (Some(label), Some(aqi)) = (location.cluster, location.aqi()) {
                groups.entry(label).or_default().push(aqi);
            }
        }

        Self {
            scatter,
            projection,
            aqi_by_cluster: groups.into_iter().collect(),
            correlations: CorrelationMatrix::compute(table, &table.pollutants()),
        }
    }
}

/// Ten-vertex star centred on the origin, in pixels
pub fn star_vertices(radius: i32) -> Vec<(i32, i32)> {
    let inner = radius as f64 * 0.4;
    (0..10)
        .map(|k| {
            let r = if k % 2 == 0 { radius as f64 } else { inner };
            let angle = -std::f64::consts::FRAC_PI_2 + k as f64 * std::f64::consts::PI / 5.0;
            ((r * angle.cos()).round() as i32, (r * angle.sin()).round() as i32)
        })
        .collect()
}

/// Diverging blue-white-red scale for values in [-1, 1]
pub fn coolwarm(value: f64) -> RGBColor {
    const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 { (MID, COOL, -v) } else { (MID, WARM, v) };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Axis range covering `values` with 5% padding on each side
fn padded_range<I: Iterator<Item = f64>>(values: I) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad)..(hi + pad)
}

/// Axis for `n` categories; category `i` is centred on the value `i`
fn category_axis(n: usize) -> Range<f64> {
    -0.5..(n as f64 - 0.5)
}

/// Name of the category centred on `value`, blank for tick values
/// between centres
fn category_label<S: AsRef<str>>(names: &[S], value: f64) -> String {
    let index = value.round();
    if (value - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    names
        .get(index as usize)
        .map(|s| s.as_ref().to_string())
        .unwrap_or_default()
}

fn chart_err<E: std::fmt::Display>(e: E) -> ProcessingError {
    ProcessingError::Chart(e.to_string())
}

fn draw_unavailable<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    reason: &str,
) -> Result<()> {
    let inner = area.titled(title, TITLE_FONT).map_err(chart_err)?;
    inner
        .draw(&Text::new(
            format!("not available: {}", reason),
            (20, 40),
            ("sans-serif", 16).into_font().color(&BLACK),
        ))
        .map_err(chart_err)?;
    Ok(())
}

fn draw_marked_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    axes: (&str, &str),
    points: &[MarkedPoint],
    with_legend: bool,
) -> Result<()> {
    let x_range = padded_range(points.iter().map(|p| p.x));
    let y_range = padded_range(points.iter().map(|p| p.y));

    let mut chart = ChartBuilder::on(area)
        .caption(title, TITLE_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc(axes.0)
        .y_desc(axes.1)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(points.iter().map(|p| {
            let color = if p.hotspot { NOISE } else { CLUSTERED };
            Circle::new((p.x, p.y), 6, color.mix(0.7).filled())
        }))
        .map_err(chart_err)?;

    let stars = chart
        .draw_series(
            points
                .iter()
                .filter(|p| p.hotspot)
                .map(|p| EmptyElement::at((p.x, p.y)) + Polygon::new(star_vertices(14), DARK_RED.filled())),
        )
        .map_err(chart_err)?;

    if with_legend && points.iter().any(|p| p.hotspot) {
        stars
            .label("Hotspots")
            .legend(|(x, y)| EmptyElement::at((x, y)) + Polygon::new(star_vertices(7), DARK_RED.filled()));
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_err)?;
    }

    Ok(())
}

fn draw_cluster_boxplot<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    groups: &[(ClusterLabel, Vec<f64>)],
) -> Result<()> {
    let title = "AQI by Cluster";
    if groups.is_empty() {
        return draw_unavailable(area, title, "no aqi values");
    }

    let n = groups.len();
    let y = padded_range(groups.iter().flat_map(|(_, v)| v.iter().copied()));
    let y_range = (y.start as f32)..(y.end as f32);
    let labels: Vec<String> = groups.iter().map(|(label, _)| label.to_string()).collect();
    let label_of = |v: &f64| category_label(&labels, *v);

    let mut chart = ChartBuilder::on(area)
        .caption(title, TITLE_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(category_axis(n), y_range)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_desc("cluster")
        .y_desc("AQI")
        .x_label_formatter(&label_of)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(groups.iter().enumerate().map(|(i, (label, values))| {
            let quartiles = Quartiles::new(values);
            let color = if *label < 0 { NOISE } else { CLUSTERED };
            Boxplot::new_vertical(i as f64, &quartiles)
                .width(40)
                .whisker_width(0.5)
                .style(color)
        }))
        .map_err(chart_err)?;

    Ok(())
}

fn draw_correlation_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    corr: &CorrelationMatrix,
) -> Result<()> {
    let title = "Pollutant Correlations";
    if corr.is_empty() {
        return draw_unavailable(area, title, "no pollutant columns");
    }

    let n = corr.len();
    let x_names: Vec<&str> = corr.metrics.iter().map(|m| m.display_name()).collect();
    // first metric on the top row
    let y_names: Vec<&str> = x_names.iter().rev().copied().collect();
    let x_label = |v: &f64| category_label(&x_names, *v);
    let y_label = |v: &f64| category_label(&y_names, *v);

    let mut chart = ChartBuilder::on(area)
        .caption(title, TITLE_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(category_axis(n), category_axis(n))
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .draw()
        .map_err(chart_err)?;

    let cells: Vec<(f64, f64, Option<f64>)> = (0..n)
        .flat_map(|i| (0..n).map(move |j| (j as f64, (n - 1 - i) as f64, i, j)))
        .map(|(x, y, i, j)| (x, y, corr.values[i][j]))
        .collect();

    chart
        .draw_series(cells.iter().map(|&(x, y, v)| {
            let fill = v.map_or(RGBColor(240, 240, 240), coolwarm);
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], fill.filled())
        }))
        .map_err(chart_err)?;

    let centered = TextStyle::from(("sans-serif", 14).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    chart
        .draw_series(cells.iter().map(|&(x, y, v)| {
            let text = v.map_or_else(|| "n/a".to_string(), |r| format!("{:.2}", r));
            Text::new(text, (x, y), centered.clone())
        }))
        .map_err(chart_err)?;

    Ok(())
}

fn draw_dashboard<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, data: &ChartData) -> Result<()> {
    root.fill(&WHITE).map_err(chart_err)?;
    let panels = root.split_evenly((2, 2));

    let scatter_title = "DBSCAN Hotspots (Red Stars)";
    if data.scatter.is_empty() {
        draw_unavailable(&panels[0], scatter_title, "pm25 and aqi required")?;
    } else {
        draw_marked_scatter(&panels[0], scatter_title, ("PM2.5", "AQI"), &data.scatter, true)?;
    }

    match &data.projection {
        Some(p) => {
            let title = format!("PCA View ({:.1}% variance)", p.explained_variance * 100.0);
            draw_marked_scatter(&panels[1], &title, ("PC1", "PC2"), &p.points, false)?;
        }
        None => draw_unavailable(&panels[1], "PCA View", "fewer than two locations")?,
    }

    draw_cluster_boxplot(&panels[2], &data.aqi_by_cluster)?;
    draw_correlation_heatmap(&panels[3], &data.correlations)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Renders [`ChartData`] to an image; `.png` paths get a bitmap, anything
/// else SVG
pub struct ChartWriter {
    size: (u32, u32),
}

impl ChartWriter {
    pub fn new() -> Self {
        Self {
            size: (CHART_WIDTH, CHART_HEIGHT),
        }
    }

    pub fn write(&self, data: &ChartData, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));

        if is_png {
            let root = BitMapBackend::new(path, self.size).into_drawing_area();
            draw_dashboard(&root, data)?;
        } else {
            let root = SVGBackend::new(path, self.size).into_drawing_area();
            draw_dashboard(&root, data)?;
        }

        info!("Chart saved to {}", path.display());
        Ok(())
    }
}

impl Default for ChartWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationSummary;
    use crate::processors::FeatureScaler;
    use tempfile::TempDir;

    fn table() -> LocationTable {
        let rows = [
            ("A", 100.0, 200.0, 0),
            ("B", 110.0, 210.0, 0),
            ("C", 400.0, 480.0, -1),
            ("D", 120.0, 190.0, 0),
        ];
        let locations = rows
            .iter()
            .map(|(id, pm25, aqi, cluster)| {
                let mut l = LocationSummary::new("Delhi".into(), id.to_string())
                    .with_mean(Metric::Pm25, *pm25)
                    .with_mean(Metric::Aqi, *aqi);
                l.cluster = Some(*cluster);
                l
            })
            .collect();
        LocationTable::new(locations, vec![Metric::Pm25, Metric::Aqi])
    }

    #[test]
    fn test_chart_data_panels() -> Result<()> {
        let t = table();
        let features = FeatureScaler::new().scale(&t)?;
        let data = ChartData::build(&t, &features);

        assert_eq!(data.scatter.len(), 4);
        assert_eq!(data.scatter.iter().filter(|p| p.hotspot).count(), 1);

        let projection = data.projection.expect("four rows support PCA");
        assert_eq!(projection.points.len(), 4);
        assert!(projection.explained_variance > 0.0 && projection.explained_variance <= 1.0 + 1e-9);

        let labels: Vec<ClusterLabel> = data.aqi_by_cluster.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec![-1, 0]);
        assert_eq!(data.aqi_by_cluster[1].1.len(), 3);

        assert_eq!(data.correlations.metrics, vec![Metric::Pm25, Metric::Aqi]);
        Ok(())
    }

    #[test]
    fn test_single_location_has_no_projection() -> Result<()> {
        let mut t = table();
        t.locations.truncate(1);
        let features = FeatureScaler::new().scale(&t)?;
        let data = ChartData::build(&t, &features);
        assert!(data.projection.is_none());
        Ok(())
    }

    #[test]
    fn test_star_vertices_alternate_radius() {
        let v = star_vertices(10);
        assert_eq!(v.len(), 10);
        assert_eq!(v[0], (0, -10));
        let r1 = ((v[1].0.pow(2) + v[1].1.pow(2)) as f64).sqrt();
        assert!((r1 - 4.0).abs() < 1.0);
    }

    #[test]
    fn test_coolwarm_endpoints() {
        assert_eq!(coolwarm(0.0), RGBColor(221, 221, 221));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(-1.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(5.0), coolwarm(1.0));
    }

    #[test]
    fn test_padded_range() {
        let r = padded_range([10.0, 20.0].into_iter());
        assert!((r.start - 9.5).abs() < 1e-12 && (r.end - 20.5).abs() < 1e-12);
        let flat = padded_range([3.0].into_iter());
        assert_eq!(flat, 2.0..4.0);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
    }

    #[test]
    fn test_category_labels_on_centres_only() {
        let names = ["-1", "0", "1"];
        assert_eq!(category_label(&names, 0.0), "-1");
        assert_eq!(category_label(&names, 2.0), "1");
        assert_eq!(category_label(&names, 1.5), "");
        assert_eq!(category_label(&names, -1.0), "");
        assert_eq!(category_label(&names, 3.0), "");
        assert_eq!(category_axis(3), -0.5..2.5);
    }

    #[test]
    fn test_write_svg_dashboard() -> Result<()> {
        let t = table();
        let features = FeatureScaler::new().scale(&t)?;
        let data = ChartData::build(&t, &features);

        let dir = TempDir::new()?;
        let path = dir.path().join("charts").join("hotspots.svg");
        ChartWriter::new().write(&data, &path)?;

        let svg = std::fs::read_to_string(&path)?;
        assert!(svg.contains("DBSCAN Hotspots (Red Stars)"));
        assert!(svg.contains("PCA View ("));
        assert!(svg.contains("AQI by Cluster"));
        assert!(svg.contains("Pollutant Correlations"));
        assert!(!svg.contains("not available"));
        Ok(())
    }

    #[test]
    fn test_write_svg_without_aqi_marks_panels_unavailable() -> Result<()> {
        let mut t = table();
        for location in &mut t.locations {
            location.set_mean(Metric::Aqi, None);
        }
        let t = LocationTable::new(t.locations, vec![Metric::Pm25]);
        let features = FeatureScaler::new().scale(&t)?;
        let data = ChartData::build(&t, &features);
        assert!(data.scatter.is_empty());
        assert!(data.aqi_by_cluster.is_empty());

        let dir = TempDir::new()?;
        let path = dir.path().join("no_aqi.svg");
        ChartWriter::new().write(&data, &path)?;

        let svg = std::fs::read_to_string(&path)?;
        assert_eq!(svg.matches("not available").count(), 2);
        assert!(svg.contains("PCA View ("));
        assert!(svg.contains("Pollutant Correlations"));
        Ok(())
    }
}
