pub mod feature_scaler;
pub mod location_aggregator;
pub mod pipeline;
pub mod season_filter;

pub use feature_scaler::{FeatureScaler, RobustScaler, ScaledFeatures};
pub use location_aggregator::LocationAggregator;
pub use pipeline::{HotspotPipeline, PipelineOutcome};
pub use season_filter::SeasonFilter;
