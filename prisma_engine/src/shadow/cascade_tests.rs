use super::*;

const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

fn camera() -> (Mat4, Mat4) {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 2.0, 10.0), Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
    let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, NEAR, FAR);
    (view, projection)
}

fn in_clip_volume(matrix: &Mat4, point: Vec3) -> bool {
    let p = matrix.project_point3(point);
    let eps = 1e-3;
    p.x >= -1.0 - eps && p.x <= 1.0 + eps
        && p.y >= -1.0 - eps && p.y <= 1.0 + eps
        && p.z >= -eps && p.z <= 1.0 + eps
}

// ============================================================================
// Frustum slices
// ============================================================================

#[test]
fn test_slice_corners_lie_on_slice_planes() {
    let (view, projection) = camera();
    let corners = frustum_slice_corners(&view, &projection, NEAR, FAR, 5.0, 20.0);
    for (i, corner) in corners.iter().enumerate() {
        let depth = -view.transform_point3(*corner).z;
        let expected = if i < 4 { 5.0 } else { 20.0 };
        assert!((depth - expected).abs() < 1e-2, "corner {} at depth {}", i, depth);
    }
}

#[test]
fn test_full_slice_matches_frustum() {
    let (view, projection) = camera();
    let corners = frustum_slice_corners(&view, &projection, NEAR, FAR, NEAR, FAR);
    let vp = projection * view;
    for corner in &corners {
        assert!(in_clip_volume(&vp, *corner));
    }
}

// ============================================================================
// Cascade projection
// ============================================================================

#[test]
fn test_cascade_projection_bounds_every_corner() {
    let (view, projection) = camera();
    let splits = [NEAR, 10.0, 30.0, FAR];
    for light_dir in [Vec3::new(-0.3, -1.0, -0.2), Vec3::NEG_Y, Vec3::new(1.0, -0.1, 0.0)] {
        for pair in splits.windows(2) {
            let corners = frustum_slice_corners(&view, &projection, NEAR, FAR, pair[0], pair[1]);
            let cascade = calculate_cascade_projection(light_dir, &corners, 2048);
            for corner in &corners {
                assert!(
                    in_clip_volume(&cascade.view_projection, *corner),
                    "{:?} outside cascade for {:?}", corner, light_dir
                );
            }
        }
    }
}

#[test]
fn test_cascade_projection_covers_slice_with_small_margin() {
    let (view, projection) = camera();
    let corners = frustum_slice_corners(&view, &projection, NEAR, FAR, 1.0, 10.0);
    let cascade = calculate_cascade_projection(Vec3::NEG_Y, &corners, 1024);
    let mut extent = 0.0_f32;
    for corner in &corners {
        let p = cascade.view_projection.project_point3(*corner);
        extent = extent.max(p.x.abs()).max(p.y.abs());
    }
    // The bounding sphere is fitted, not a loose box
    assert!(extent > 0.5 && extent <= 1.0, "extent {}", extent);
}

/// Texel coordinates of `point` on a `resolution` map
fn texel_position(cascade: &CascadeMatrices, point: Vec3, resolution: u32) -> Vec3 {
    cascade.shadow_matrix().project_point3(point) * resolution as f32
}

#[test]
fn test_cascade_snaps_to_texel_grid_as_camera_moves() {
    const RESOLUTION: u32 = 1024;
    let (view, projection) = camera();
    let light_dir = Vec3::new(-0.4, -1.0, -0.3);
    let corners = frustum_slice_corners(&view, &projection, NEAR, FAR, 1.0, 10.0);
    let still = calculate_cascade_projection(light_dir, &corners, RESOLUTION);

    for offset in [Vec3::new(0.013, 0.0, 0.0), Vec3::new(0.37, 0.05, -0.21), Vec3::new(-2.5, 0.0, 1.7)] {
        let moved_corners = corners.map(|c| c + offset);
        let moved = calculate_cascade_projection(light_dir, &moved_corners, RESOLUTION);

        // A fixed world point moves by whole texels only
        let shift = texel_position(&moved, Vec3::ZERO, RESOLUTION) - texel_position(&still, Vec3::ZERO, RESOLUTION);
        assert!((shift.x - shift.x.round()).abs() < 0.02, "x shift {} for {:?}", shift.x, offset);
        assert!((shift.y - shift.y.round()).abs() < 0.02, "y shift {} for {:?}", shift.y, offset);
        // Translation keeps the map size
        assert!(moved.projection.abs_diff_eq(still.projection, 1e-4));
    }
}

#[test]
fn test_view_projection_is_product() {
    let (view, projection) = camera();
    let corners = frustum_slice_corners(&view, &projection, NEAR, FAR, 1.0, 10.0);
    let cascade = calculate_cascade_projection(Vec3::NEG_Y, &corners, 1024);
    assert!(cascade.view_projection.abs_diff_eq(cascade.projection * cascade.view, 1e-5));
}

// ============================================================================
// Bias
// ============================================================================

#[test]
fn test_shadow_bias_matrix_maps_clip_to_uv() {
    let bias = shadow_bias_matrix();
    assert!(bias.transform_point3(Vec3::new(-1.0, -1.0, 0.25)).abs_diff_eq(Vec3::new(0.0, 0.0, 0.25), 1e-6));
    assert!(bias.transform_point3(Vec3::new(1.0, 1.0, 1.0)).abs_diff_eq(Vec3::new(1.0, 1.0, 1.0), 1e-6));
    assert!(bias.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::new(0.5, 0.5, 0.0), 1e-6));
}

#[test]
fn test_depth_bias_pushes_depth_only() {
    let projection = Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);
    let biased = apply_depth_bias(&projection, 0.01, 0.0);
    let p = Vec3::new(0.3, -0.2, -5.0);
    let a = projection.project_point3(p);
    let b = biased.project_point3(p);
    assert!((a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);
    assert!((b.z - a.z - 0.01).abs() < 1e-5);

    let sloped = apply_depth_bias(&projection, 0.0, 0.1);
    let c = sloped.project_point3(p);
    assert!((c.z - a.z * 1.1).abs() < 1e-5);
}

#[test]
fn test_normal_offset() {
    let moved = normal_offset(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), 0.5, 0.1);
    assert!(moved.abs_diff_eq(Vec3::new(0.0, 0.05, 0.0), 1e-6));
    assert_eq!(normal_offset(Vec3::ONE, Vec3::ZERO, 1.0, 1.0), Vec3::ONE);
}

// ============================================================================
// Spot and point lights
// ============================================================================

#[test]
fn test_spot_light_sees_along_direction() {
    let m = spot_light_matrices(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 30.0, 0.1, 20.0);
    assert!(in_clip_volume(&m.view_projection, Vec3::ZERO));
    assert!(!in_clip_volume(&m.view_projection, Vec3::new(0.0, 10.0, 0.0)));
    assert!(!in_clip_volume(&m.view_projection, Vec3::new(10.0, 4.0, 0.0)));
}

#[test]
fn test_point_light_faces_cover_axes() {
    let position = Vec3::new(1.0, 1.0, 1.0);
    let faces = point_light_face_matrices(position, 0.1, 10.0);
    let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
    for (face, axis) in faces.iter().zip(axes) {
        assert!(in_clip_volume(&face.view_projection, position + axis * 5.0));
        assert!(!in_clip_volume(&face.view_projection, position - axis * 5.0));
    }
}
