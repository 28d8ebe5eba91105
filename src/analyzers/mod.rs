pub mod correlation;
pub mod dbscan;
pub mod hotspot_report;
pub mod pca;

pub use correlation::CorrelationMatrix;
pub use dbscan::Dbscan;
pub use hotspot_report::{HotspotEntry, HotspotReport, HotspotSummary};
pub use pca::Pca;
