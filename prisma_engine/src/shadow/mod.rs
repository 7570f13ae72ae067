//! Shadow configuration, cascade math and shadow-map atlas allocation

mod shadow_settings;
mod cascade;
mod shadow_atlas;

pub use shadow_settings::{
    ShadowType, ShadowResolution, SplitScheme, CascadedShadowSettings,
    FilterType, ShadowFilterSettings, ShadowSettings, PSEUDO_LOG_LAMBDA,
};
pub use cascade::{
    CascadeMatrices, frustum_slice_corners, calculate_cascade_projection,
    shadow_bias_matrix, apply_depth_bias, normal_offset,
    spot_light_matrices, point_light_face_matrices,
};
pub use shadow_atlas::{ShadowAtlas, AtlasRect};
