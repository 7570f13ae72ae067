/// Shadow settings and cascade split computation

use crate::error::{Error, Result};

/// Weight of the logarithmic term in `SplitScheme::PseudoLogarithmic`
pub const PSEUDO_LOG_LAMBDA: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowType {
    None,
    Hard,
    Soft,
    HighQualitySoft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowResolution {
    Low,
    Medium,
    High,
    Ultra,
}

impl ShadowResolution {
    /// Edge length of a square shadow map
    pub fn pixels(&self) -> u32 {
        match self {
            ShadowResolution::Low => 512,
            ShadowResolution::Medium => 1024,
            ShadowResolution::High => 2048,
            ShadowResolution::Ultra => 4096,
        }
    }
}

/// How the camera depth range is divided between cascades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitScheme {
    /// Equal linear spans
    Uniform,
    /// Geometric spans
    Logarithmic,
    /// Caller-supplied split ratios (`manual_splits`)
    Manual,
    /// Blend of uniform and logarithmic, weighted by `PSEUDO_LOG_LAMBDA`
    PseudoLogarithmic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CascadedShadowSettings {
    pub cascade_count: u32,
    pub split_scheme: SplitScheme,
    /// `cascade_count - 1` ratios in (0, 1), strictly increasing
    pub manual_splits: Vec<f32>,
    pub resolution: ShadowResolution,
    /// Blend band between cascades, as a fraction of the cascade span
    pub transition_size: f32,
    pub enable_cascade_blending: bool,
}

impl Default for CascadedShadowSettings {
    fn default() -> Self {
        Self {
            cascade_count: 4,
            split_scheme: SplitScheme::PseudoLogarithmic,
            manual_splits: Vec::new(),
            resolution: ShadowResolution::Medium,
            transition_size: 0.1,
            enable_cascade_blending: true,
        }
    }
}

impl CascadedShadowSettings {
    /// Split the view depth range `[near, far]` between cascades
    ///
    /// Returns `cascade_count + 1` strictly increasing distances, the first
    /// equal to `near` and the last equal to `far`.
    ///
    /// # Errors
    ///
    /// `InvalidResource` for a zero cascade count, a range that is not
    /// `0 < near < far`, or manual splits of the wrong length or order.
    pub fn calculate_split_distances(&self, near: f32, far: f32) -> Result<Vec<f32>> {
        let count = self.cascade_count;
        if count == 0 {
            return Err(Error::InvalidResource("cascade count must be at least 1".to_string()));
        }
        if !(near > 0.0 && far > near && far.is_finite()) {
            return Err(Error::InvalidResource(format!(
                "invalid cascade depth range [{}, {}]", near, far
            )));
        }

        let uniform = |i: u32| near + (far - near) * (i as f32 / count as f32);
        let logarithmic = |i: u32| near * (far / near).powf(i as f32 / count as f32);

        let mut splits = Vec::with_capacity(count as usize + 1);
        splits.push(near);
        for i in 1..count {
            let split = match self.split_scheme {
                SplitScheme::Uniform => uniform(i),
                SplitScheme::Logarithmic => logarithmic(i),
                SplitScheme::PseudoLogarithmic => {
                    PSEUDO_LOG_LAMBDA * logarithmic(i) + (1.0 - PSEUDO_LOG_LAMBDA) * uniform(i)
                }
                SplitScheme::Manual => near + (far - near) * self.manual_ratio(i)?,
            };
            splits.push(split);
        }
        splits.push(far);

        if self.split_scheme == SplitScheme::Manual && self.manual_splits.len() != count as usize - 1 {
            return Err(Error::InvalidResource(format!(
                "{} manual splits given, {} expected",
                self.manual_splits.len(),
                count - 1
            )));
        }
        Ok(splits)
    }

    fn manual_ratio(&self, i: u32) -> Result<f32> {
        let index = i as usize - 1;
        let ratio = *self.manual_splits.get(index).ok_or_else(|| {
            Error::InvalidResource(format!(
                "{} manual splits given, {} expected",
                self.manual_splits.len(),
                self.cascade_count - 1
            ))
        })?;
        let previous = if index == 0 { 0.0 } else { self.manual_splits[index - 1] };
        if !(ratio > previous && ratio < 1.0) {
            return Err(Error::InvalidResource(format!(
                "manual split {} ({}) must lie in ({}, 1)", index, ratio, previous
            )));
        }
        Ok(ratio)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    None,
    Pcf2x2,
    Pcf3x3,
    Pcf4x4,
    Pcf5x5,
    Poisson,
    Pcss,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFilterSettings {
    pub filter_type: FilterType,
    /// Radius in texels
    pub sample_radius: f32,
    pub sample_count: u32,
}

impl Default for ShadowFilterSettings {
    fn default() -> Self {
        Self { filter_type: FilterType::Pcf2x2, sample_radius: 1.0, sample_count: 4 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowSettings {
    pub enable_shadows: bool,
    pub default_shadow_type: ShadowType,
    pub max_shadow_maps: u32,
    /// Layers in the shadow-map array
    pub shadow_map_array_size: u32,
    /// View distance past which shadows are gone
    pub shadow_distance: f32,
    /// Width of the fade band ending at `shadow_distance`
    pub shadow_fade_distance: f32,
    pub enable_cascaded_shadows: bool,
    pub cascaded: CascadedShadowSettings,
    pub filter: ShadowFilterSettings,
    /// Lights past this index (in scene order) render unshadowed
    pub max_shadow_casting_lights_per_frame: u32,
    /// Rasterizer depth bias used while rendering casters
    pub depth_bias_constant: f32,
    pub depth_bias_slope: f32,
    /// Multiplier of each light's own `shadow_bias`
    pub depth_bias_scale: f32,
    /// Multiplier of each light's own `shadow_normal_bias`
    pub normal_bias_scale: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enable_shadows: true,
            default_shadow_type: ShadowType::Soft,
            max_shadow_maps: 16,
            shadow_map_array_size: 8,
            shadow_distance: 50.0,
            shadow_fade_distance: 10.0,
            enable_cascaded_shadows: true,
            cascaded: CascadedShadowSettings::default(),
            filter: ShadowFilterSettings::default(),
            max_shadow_casting_lights_per_frame: 4,
            depth_bias_constant: 1.25,
            depth_bias_slope: 1.75,
            depth_bias_scale: 1.0,
            normal_bias_scale: 1.0,
        }
    }
}

impl ShadowSettings {
    /// Single hard-shadowed light, no cascades
    pub fn mobile() -> Self {
        Self {
            default_shadow_type: ShadowType::Hard,
            max_shadow_maps: 4,
            shadow_map_array_size: 4,
            shadow_distance: 30.0,
            shadow_fade_distance: 5.0,
            enable_cascaded_shadows: false,
            cascaded: CascadedShadowSettings { cascade_count: 1, ..Default::default() },
            filter: ShadowFilterSettings { filter_type: FilterType::None, ..Default::default() },
            max_shadow_casting_lights_per_frame: 1,
            ..Default::default()
        }
    }

    pub fn high_quality() -> Self {
        Self {
            default_shadow_type: ShadowType::HighQualitySoft,
            max_shadow_maps: 32,
            shadow_map_array_size: 16,
            shadow_distance: 100.0,
            cascaded: CascadedShadowSettings {
                resolution: ShadowResolution::High,
                ..Default::default()
            },
            filter: ShadowFilterSettings {
                filter_type: FilterType::Poisson,
                sample_count: 32,
                ..Default::default()
            },
            max_shadow_casting_lights_per_frame: 8,
            ..Default::default()
        }
    }

    /// Whether the shadow caster at `light_index` (scene order) gets a map
    pub fn should_render_shadow(&self, light_index: usize) -> bool {
        self.enable_shadows && light_index < self.max_shadow_casting_lights_per_frame as usize
    }

    /// Shadow strength factor at a view distance: 1 before the fade band,
    /// 0 from `shadow_distance` on, linear in between
    pub fn calculate_shadow_fade(&self, distance: f32) -> f32 {
        if distance >= self.shadow_distance {
            return 0.0;
        }
        let fade_start = self.shadow_distance - self.shadow_fade_distance;
        if distance <= fade_start {
            return 1.0;
        }
        1.0 - (distance - fade_start) / self.shadow_fade_distance
    }

    /// Cascades used per directional light
    pub fn effective_cascade_count(&self) -> u32 {
        if self.enable_cascaded_shadows {
            self.cascaded.cascade_count.max(1)
        } else {
            1
        }
    }
}

#[cfg(test)]
#[path = "shadow_settings_tests.rs"]
mod tests;
