use serde::{Deserialize, Serialize};

/// Numeric columns the pipeline knows how to aggregate.
///
/// The first seven are pollutant readings and feed the clustering
/// features; the remaining five are weather context carried through to
/// the exported tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Pm25,
    Pm10,
    No2,
    So2,
    O3,
    Co,
    Aqi,
    Temperature,
    Humidity,
    Pressure,
    WindSpeed,
    WindDirection,
}

pub const METRIC_COUNT: usize = 12;

impl Metric {
    pub const ALL: [Metric; METRIC_COUNT] = [
        Metric::Pm25,
        Metric::Pm10,
        Metric::No2,
        Metric::So2,
        Metric::O3,
        Metric::Co,
        Metric::Aqi,
        Metric::Temperature,
        Metric::Humidity,
        Metric::Pressure,
        Metric::WindSpeed,
        Metric::WindDirection,
    ];

    pub const POLLUTANTS: [Metric; 7] = [
        Metric::Pm25,
        Metric::Pm10,
        Metric::No2,
        Metric::So2,
        Metric::O3,
        Metric::Co,
        Metric::Aqi,
    ];

    pub const WEATHER: [Metric; 5] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::Pressure,
        Metric::WindSpeed,
        Metric::WindDirection,
    ];

    /// Column name as it appears in input and output headers
    pub fn column_name(&self) -> &'static str {
        match self {
            Metric::Pm25 => "pm25",
            Metric::Pm10 => "pm10",
            Metric::No2 => "no2",
            Metric::So2 => "so2",
            Metric::O3 => "o3",
            Metric::Co => "co",
            Metric::Aqi => "aqi",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Pressure => "pressure",
            Metric::WindSpeed => "wind_speed",
            Metric::WindDirection => "wind_direction",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.column_name() == name.trim())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::Pm25 => "PM2.5",
            Metric::Pm10 => "PM10",
            Metric::No2 => "NO2",
            Metric::So2 => "SO2",
            Metric::O3 => "O3",
            Metric::Co => "CO",
            Metric::Aqi => "AQI",
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::Pressure => "Pressure",
            Metric::WindSpeed => "Wind Speed",
            Metric::WindDirection => "Wind Direction",
        }
    }

    pub fn is_pollutant(&self) -> bool {
        Self::POLLUTANTS.contains(self)
    }

    /// Slot in fixed-size reading arrays
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}
