use crate::models::{LocationSummary, LocationTable, Metric};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize)]
pub struct HotspotEntry {
    pub city: String,
    pub location_id: String,
    pub aqi: Option<f64>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
}

impl HotspotEntry {
    fn from_location(location: &LocationSummary) -> Self {
        Self {
            city: location.city.clone(),
            location_id: location.location_id.clone(),
            aqi: location.aqi().map(round2),
            pm25: location.mean(Metric::Pm25).map(round2),
            pm10: location.mean(Metric::Pm10).map(round2),
        }
    }
}

/// Machine-readable form of the console summary
#[derive(Debug, Clone, Serialize)]
pub struct HotspotSummary {
    pub total_locations: usize,
    pub hotspot_count: usize,
    pub hotspot_percentage: f64,
    pub cluster_count: usize,
    pub top_hotspots: Vec<HotspotEntry>,
}

/// Noise-labelled locations ranked by air-quality index
#[derive(Debug, Clone)]
pub struct HotspotReport {
    total_locations: usize,
    cluster_count: usize,
    hotspots: Vec<LocationSummary>,
    top_n: usize,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Descending by aqi; rows without aqi sort last
fn by_aqi_desc(a: &LocationSummary, b: &LocationSummary) -> Ordering {
    match (a.aqi(), b.aqi()) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl HotspotReport {
    pub fn from_table(table: &LocationTable, top_n: usize) -> Self {
        let mut hotspots: Vec<LocationSummary> = table
            .locations
            .iter()
            .filter(|l| l.is_hotspot())
            .cloned()
            .collect();
        hotspots.sort_by(by_aqi_desc);

        Self {
            total_locations: table.len(),
            cluster_count: table.cluster_ids().len(),
            hotspots,
            top_n,
        }
    }

    pub fn hotspots(&self) -> &[LocationSummary] {
        &self.hotspots
    }

    pub fn hotspot_count(&self) -> usize {
        self.hotspots.len()
    }

    pub fn total_locations(&self) -> usize {
        self.total_locations
    }

    pub fn hotspot_percentage(&self) -> f64 {
        if self.total_locations == 0 {
            0.0
        } else {
            self.hotspots.len() as f64 / self.total_locations as f64 * 100.0
        }
    }

    /// Hotspots as a location table for export, same column set as `table`
    pub fn to_table(&self, table: &LocationTable) -> LocationTable {
        LocationTable::new(self.hotspots.clone(), table.available.clone())
    }

    pub fn top_entries(&self) -> Vec<HotspotEntry> {
        self.hotspots
            .iter()
            .take(self.top_n)
            .map(HotspotEntry::from_location)
            .collect()
    }

    pub fn to_summary(&self) -> HotspotSummary {
        HotspotSummary {
            total_locations: self.total_locations,
            hotspot_count: self.hotspot_count(),
            hotspot_percentage: self.hotspot_percentage(),
            cluster_count: self.cluster_count,
            top_hotspots: self.top_entries(),
        }
    }

    /// Top-N table, or the no-outlier notice
    pub fn hotspot_table(&self) -> String {
        if self.hotspots.is_empty() {
            return "No outliers detected - all locations form dense clusters".to_string();
        }

        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |x| format!("{:.2}", x));
        let entries = self.top_entries();
        let city_w = entries.iter().map(|e| e.city.len()).max().unwrap_or(0).max(4);
        let loc_w = entries
            .iter()
            .map(|e| e.location_id.len())
            .max()
            .unwrap_or(0)
            .max(11);

        let mut out = format!(
            "{:<city_w$}  {:<loc_w$}  {:>10}  {:>10}  {:>10}\n",
            "city", "location_id", "aqi", "pm25", "pm10"
        );
        for e in &entries {
            out.push_str(&format!(
                "{:<city_w$}  {:<loc_w$}  {:>10}  {:>10}  {:>10}\n",
                e.city,
                e.location_id,
                fmt(e.aqi),
                fmt(e.pm25),
                fmt(e.pm10)
            ));
        }
        out
    }

    pub fn summary(&self) -> String {
        format!(
            "SUMMARY:\n\
            Total locations: {}\n\
            Dense clusters: {}\n\
            Hotspots found: {} ({:.1}%)",
            self.total_locations,
            self.cluster_count,
            self.hotspot_count(),
            self.hotspot_percentage()
        )
    }

    pub fn detailed_summary(&self) -> String {
        let rule = "=".repeat(60);
        format!(
            "{rule}\nWINTER POLLUTION HOTSPOTS\n{rule}\n{}\n\n{}",
            self.hotspot_table().trim_end(),
            self.summary()
        )
    }
}
