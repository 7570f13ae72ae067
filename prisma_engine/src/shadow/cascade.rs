/// Light-space matrices for cascaded, spot and point shadow maps
///
/// Clip depth follows the [0, 1] convention of `Mat4::orthographic_rh` and
/// `Mat4::perspective_rh`.

use glam::{Mat4, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
}

impl CascadeMatrices {
    fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection, view_projection: projection * view }
    }

    /// World → shadow-map UV + depth
    pub fn shadow_matrix(&self) -> Mat4 {
        shadow_bias_matrix() * self.view_projection
    }
}

/// World-space corners of the camera frustum between two view depths
///
/// `near`/`far` are the depths baked into `projection`. The first four
/// corners lie on the `slice_near` plane, the last four on `slice_far`.
pub fn frustum_slice_corners(
    view: &Mat4,
    projection: &Mat4,
    near: f32,
    far: f32,
    slice_near: f32,
    slice_far: f32,
) -> [Vec3; 8] {
    let inverse = (*projection * *view).inverse();
    let unproject = |x: f32, y: f32, z: f32| inverse.project_point3(Vec3::new(x, y, z));

    let edges = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    let t_near = (slice_near - near) / (far - near);
    let t_far = (slice_far - near) / (far - near);

    let mut corners = [Vec3::ZERO; 8];
    for (i, (x, y)) in edges.iter().enumerate() {
        let on_near = unproject(*x, *y, 0.0);
        let on_far = unproject(*x, *y, 1.0);
        corners[i] = on_near.lerp(on_far, t_near);
        corners[i + 4] = on_near.lerp(on_far, t_far);
    }
    corners
}

/// Orthographic light matrices bounding a frustum slice on a `resolution`
/// texel map
///
/// The bounds are a square around the slice's bounding sphere, so their
/// size does not change as the camera turns. The center is snapped to the
/// texel grid of the light's rotation, so a moving camera shifts the map by
/// whole texels and shadow edges stay put. The near plane is pulled toward
/// the light by the slice radius so casters just outside the slice still
/// land in the map.
pub fn calculate_cascade_projection(light_direction: Vec3, corners: &[Vec3; 8], resolution: u32) -> CascadeMatrices {
    let direction = light_direction.try_normalize().unwrap_or(Vec3::NEG_Y);
    let center = corners.iter().copied().sum::<Vec3>() / 8.0;
    let radius = corners.iter().map(|c| c.distance(center)).fold(0.0_f32, f32::max);
    // Quantized so float noise in the corners cannot resize the map
    let radius = (radius * 16.0).ceil() / 16.0;

    let up = if direction.abs().dot(Vec3::Y) > 0.99 { Vec3::Z } else { Vec3::Y };

    // One texel of margin absorbs the snap offset
    let texels = resolution.max(4) as f32;
    let half_extent = radius * texels / (texels - 2.0);
    let world_units_per_texel = 2.0 * half_extent / texels;

    let rotation = Mat4::look_at_rh(Vec3::ZERO, direction, up);
    let mut light_space_center = rotation.transform_point3(center);
    if world_units_per_texel > 0.0 {
        light_space_center.x = (light_space_center.x / world_units_per_texel).floor() * world_units_per_texel;
        light_space_center.y = (light_space_center.y / world_units_per_texel).floor() * world_units_per_texel;
    }
    let center = rotation.inverse().transform_point3(light_space_center);

    let eye = center - direction * (2.0 * radius + 1.0);
    let view = Mat4::look_at_rh(eye, center, up);

    let mut min_z = f32::MAX;
    let mut max_z = f32::MIN;
    for corner in corners {
        let z = view.transform_point3(*corner).z;
        min_z = min_z.min(z);
        max_z = max_z.max(z);
    }

    // View space looks down -Z: the nearest corner has the largest z
    let z_near = (-max_z - radius).max(0.0);
    let z_far = -min_z;
    let projection = Mat4::orthographic_rh(-half_extent, half_extent, -half_extent, half_extent, z_near, z_far);
    CascadeMatrices::new(view, projection)
}

/// Clip space → [0, 1] shadow-map UV, depth unchanged
pub fn shadow_bias_matrix() -> Mat4 {
    Mat4::from_cols(
        Vec4::new(0.5, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 0.5, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(0.5, 0.5, 0.0, 1.0),
    )
}

/// Offset clip depth by `constant` and scale it by `1 + slope`
///
/// Pushes stored depth away from the light to suppress acne.
pub fn apply_depth_bias(projection: &Mat4, constant: f32, slope: f32) -> Mat4 {
    let bias = Mat4::from_cols(
        Vec4::X,
        Vec4::Y,
        Vec4::new(0.0, 0.0, 1.0 + slope, 0.0),
        Vec4::new(0.0, 0.0, constant, 1.0),
    );
    bias * *projection
}

/// Shift a sampled position along its surface normal
///
/// `texel_size` is the world size of one shadow-map texel at the position.
pub fn normal_offset(position: Vec3, normal: Vec3, normal_bias: f32, texel_size: f32) -> Vec3 {
    position + normal.normalize_or_zero() * normal_bias * texel_size
}

/// Perspective matrices covering a spot light cone
///
/// `outer_angle_degrees` is the half-angle of the cone.
pub fn spot_light_matrices(
    position: Vec3,
    direction: Vec3,
    outer_angle_degrees: f32,
    near: f32,
    range: f32,
) -> CascadeMatrices {
    let direction = direction.try_normalize().unwrap_or(Vec3::NEG_Y);
    let up = if direction.abs().dot(Vec3::Y) > 0.99 { Vec3::Z } else { Vec3::Y };
    let view = Mat4::look_at_rh(position, position + direction, up);
    let fov = (outer_angle_degrees * 2.0).clamp(1.0, 179.0).to_radians();
    let projection = Mat4::perspective_rh(fov, 1.0, near, range.max(near + 1e-3));
    CascadeMatrices::new(view, projection)
}

/// Six 90° face matrices of a point light cube map (+X, -X, +Y, -Y, +Z, -Z)
pub fn point_light_face_matrices(position: Vec3, near: f32, range: f32) -> [CascadeMatrices; 6] {
    let faces = [
        (Vec3::X, Vec3::NEG_Y),
        (Vec3::NEG_X, Vec3::NEG_Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Y, Vec3::NEG_Z),
        (Vec3::Z, Vec3::NEG_Y),
        (Vec3::NEG_Z, Vec3::NEG_Y),
    ];
    let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, near, range.max(near + 1e-3));
    faces.map(|(forward, up)| {
        CascadeMatrices::new(Mat4::look_at_rh(position, position + forward, up), projection)
    })
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;
