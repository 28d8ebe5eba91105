use crate::models::MeasurementTable;
use crate::utils::constants::WINTER_MONTHS;
use tracing::info;

/// Keeps measurements whose calendar month is in a fixed set
pub struct SeasonFilter {
    months: Vec<u32>,
}

impl SeasonFilter {
    pub fn new(months: &[u32]) -> Self {
        Self {
            months: months.to_vec(),
        }
    }

    /// December, January and February
    pub fn winter() -> Self {
        Self::new(&WINTER_MONTHS)
    }

    pub fn months(&self) -> &[u32] {
        &self.months
    }

    pub fn matches_month(&self, month: u32) -> bool {
        self.months.contains(&month)
    }

    pub fn apply(&self, table: &MeasurementTable) -> MeasurementTable {
        let filtered = table.retain_rows(|r| self.matches_month(r.month()));
        info!(
            "Seasonal filter kept {} of {} rows (months {:?})",
            filtered.len(),
            table.len(),
            self.months
        );
        filtered
    }
}

impl Default for SeasonFilter {
    fn default() -> Self {
        Self::winter()
    }
}
