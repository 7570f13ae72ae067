/// Light descriptions and the scene-wide lighting set

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    Directional,
    Point,
    Spot,
    /// Carried for completeness; no direct lighting or shadows
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttenuationType {
    Linear,
    InverseSquare,
    Custom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightData {
    pub light_type: LightType,
    pub color: Vec3,
    pub intensity: f32,
    /// Influence radius (point/spot)
    pub range: f32,
    /// Normalized travel direction (directional/spot)
    pub direction: Vec3,
    pub position: Vec3,
    pub attenuation: AttenuationType,
    /// Spot cone angles in degrees
    pub inner_angle: f32,
    pub outer_angle: f32,
    pub cast_shadows: bool,
    pub shadow_strength: f32,
    pub shadow_bias: f32,
    pub shadow_normal_bias: f32,
    pub shadow_near_plane: f32,
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            color: Vec3::ONE,
            intensity: 1.0,
            range: 10.0,
            direction: Vec3::NEG_Y,
            position: Vec3::ZERO,
            attenuation: AttenuationType::InverseSquare,
            inner_angle: 15.0,
            outer_angle: 30.0,
            cast_shadows: false,
            shadow_strength: 1.0,
            shadow_bias: 0.005,
            shadow_normal_bias: 0.1,
            shadow_near_plane: 0.1,
        }
    }
}

impl LightData {
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
            color,
            intensity,
            ..Default::default()
        }
    }

    pub fn point(position: Vec3, range: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Point,
            position,
            range,
            color,
            intensity,
            attenuation: AttenuationType::InverseSquare,
            ..Default::default()
        }
    }

    pub fn spot(
        position: Vec3,
        direction: Vec3,
        inner_angle: f32,
        outer_angle: f32,
        range: f32,
        color: Vec3,
        intensity: f32,
    ) -> Self {
        Self {
            light_type: LightType::Spot,
            position,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
            inner_angle,
            outer_angle,
            range,
            color,
            intensity,
            ..Default::default()
        }
    }

    pub fn with_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    /// Distance falloff in [0, 1]; directional lights do not attenuate
    pub fn calculate_attenuation(&self, distance: f32) -> f32 {
        if self.light_type == LightType::Directional {
            return 1.0;
        }
        if distance >= self.range {
            return 0.0;
        }
        match self.attenuation {
            AttenuationType::Linear | AttenuationType::Custom => 1.0 - distance / self.range,
            AttenuationType::InverseSquare => {
                let d = distance / self.range;
                1.0 / (1.0 + d * d)
            }
        }
    }

    /// Whether this light can own a shadow map
    pub fn casts_shadow_map(&self) -> bool {
        self.cast_shadows && self.light_type != LightType::Area
    }
}

/// Lights in scene order plus ambient terms
#[derive(Debug, Clone, PartialEq)]
pub struct LightingData {
    lights: Vec<LightData>,
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
}

impl Default for LightingData {
    fn default() -> Self {
        Self {
            lights: Vec::new(),
            ambient_color: Vec3::new(0.1, 0.1, 0.15),
            ambient_intensity: 0.3,
        }
    }
}

impl LightingData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_light(&mut self, light: LightData) {
        self.lights.push(light);
    }

    pub fn clear(&mut self) {
        self.lights.clear();
    }

    pub fn lights(&self) -> &[LightData] {
        &self.lights
    }

    pub fn directional_lights(&self) -> impl Iterator<Item = &LightData> {
        self.of_type(LightType::Directional)
    }

    pub fn point_lights(&self) -> impl Iterator<Item = &LightData> {
        self.of_type(LightType::Point)
    }

    pub fn spot_lights(&self) -> impl Iterator<Item = &LightData> {
        self.of_type(LightType::Spot)
    }

    /// Shadow casters in scene order
    pub fn shadow_casting_lights(&self) -> impl Iterator<Item = &LightData> {
        self.lights.iter().filter(|l| l.casts_shadow_map())
    }

    /// Brightest directional light; the first one wins ties
    pub fn main_light(&self) -> Option<&LightData> {
        self.directional_lights().fold(None, |best: Option<&LightData>, light| match best {
            Some(b) if b.intensity >= light.intensity => Some(b),
            _ => Some(light),
        })
    }

    /// Ambient color premultiplied by its intensity
    pub fn ambient(&self) -> Vec3 {
        self.ambient_color * self.ambient_intensity
    }

    fn of_type(&self, light_type: LightType) -> impl Iterator<Item = &LightData> {
        self.lights.iter().filter(move |l| l.light_type == light_type)
    }
}

#[cfg(test)]
#[path = "lighting_tests.rs"]
mod tests;
