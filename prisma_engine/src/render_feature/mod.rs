//! Pluggable render features run at named events around the core passes

mod render_feature;
mod render_feature_manager;
pub mod features;

pub use render_feature::{RenderFeature, RenderPassEvent, require_pipelines};
pub use render_feature_manager::{RenderFeatureManager, FeatureState, EventStats};
pub use features::{default_features, high_quality_features, mobile_features};
