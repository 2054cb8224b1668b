pub mod analyzer;
pub mod config;
pub mod feed;
pub mod ledger;
pub mod pipeline;
pub mod server;
pub mod signal;
pub mod simulator;
pub mod storage;

/// Common types used across modules
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Serialize, Serializer};

    /// Display format for every timestamp leaving the process
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

    /// A catalog product and its current stock level
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Product {
        pub id: u32,
        pub name: String,
        pub stock: u32,
        pub reorder_point: u32,
    }

    /// A simulated sale. Immutable once created.
    #[derive(Debug, Clone, Serialize)]
    pub struct Transaction {
        pub id: String,
        pub product_id: u32,
        #[serde(rename = "product")]
        pub product_name: String,
        pub quantity: u32,
        #[serde(serialize_with = "round_2dp")]
        pub z_score: f64,
        pub is_anomaly: bool,
        #[serde(serialize_with = "utc_display")]
        pub timestamp: DateTime<Utc>,
    }

    /// Current weather and the demand multiplier derived from it
    #[derive(Debug, Clone, Serialize)]
    pub struct WeatherSignal {
        pub location: String,
        pub temperature_c: f64,
        pub wind_kph: f64,
        pub precipitation_mm: f64,
        pub influence_factor: f64,
        #[serde(serialize_with = "utc_display")]
        pub last_updated: DateTime<Utc>,
    }

    /// One labelled point of a demand series
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct DemandPoint {
        pub day: String,
        pub demand: u32,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct ForecastSeries {
        pub historical: Vec<DemandPoint>,
        pub forecast: Vec<DemandPoint>,
    }

    impl ForecastSeries {
        pub fn forecast_total(&self) -> u32 {
            self.forecast.iter().map(|p| p.demand).sum()
        }
    }

    /// Replenishment urgency, most severe first
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum StockStatus {
        Critical,
        Low,
        Healthy,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct Recommendation {
        pub product: String,
        pub current_stock: u32,
        pub reorder_qty: u32,
        pub status: StockStatus,
        pub anomaly_hits: u32,
    }

    impl std::fmt::Display for StockStatus {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                StockStatus::Critical => write!(f, "critical"),
                StockStatus::Low => write!(f, "low"),
                StockStatus::Healthy => write!(f, "healthy"),
            }
        }
    }

    /// Round to `places` decimal digits
    pub fn round_to(value: f64, places: i32) -> f64 {
        let scale = 10f64.powi(places);
        (value * scale).round() / scale
    }

    fn round_2dp<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(round_to(*value, 2))
    }

    fn utc_display<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::TimeZone;

        #[test]
        fn transaction_serializes_display_fields() {
            let tx = Transaction {
                id: "TX-10001".into(),
                product_id: 3,
                product_name: "Gaming Mice".into(),
                quantity: 61,
                z_score: 1.23456,
                is_anomaly: true,
                timestamp: Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap(),
            };
            let value = serde_json::to_value(&tx).unwrap();
            assert_eq!(value["product"], "Gaming Mice");
            assert_eq!(value["z_score"], 1.23);
            assert_eq!(value["timestamp"], "2026-03-04 05:06:07 UTC");
            assert!(value.get("product_name").is_none());
        }

        #[test]
        fn status_orders_by_severity() {
            let mut statuses = vec![StockStatus::Healthy, StockStatus::Critical, StockStatus::Low];
            statuses.sort();
            assert_eq!(statuses, vec![StockStatus::Critical, StockStatus::Low, StockStatus::Healthy]);
            assert_eq!(serde_json::to_value(StockStatus::Low).unwrap(), "low");
        }
    }
}
