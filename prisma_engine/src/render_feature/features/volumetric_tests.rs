/// Tests for the volumetric features

use super::*;
use crate::passes::test_support::PassFixture;

fn initialized<F: RenderFeature>(f: &mut PassFixture, feature: &mut F, pipelines: &[&str]) {
    for name in pipelines {
        f.pipeline(name);
    }
    let caps = f.device.capabilities();
    assert!(feature.initialize(&mut f.setup(caps)));
}

// ============================================================================
// VolumetricLightFeature
// ============================================================================

#[test]
fn test_light_defaults() {
    let light = VolumetricLightFeature::new();
    assert_eq!(light.light_position(), Vec3::new(0.0, 10.0, 0.0));
    assert_eq!(light.intensity(), 0.5);
    assert_eq!(light.samples(), 64);
}

#[test]
fn test_light_screen_uv() {
    let f = PassFixture::new();
    let mut light = VolumetricLightFeature::new();

    // The camera looks at the origin
    light.set_light_position(Vec3::ZERO);
    let uv = light.light_screen_uv(&f.rendering_data).unwrap();
    assert!((uv - Vec2::splat(0.5)).length() < 1e-4);

    // Behind the camera at (0, 2, 10)
    light.set_light_position(Vec3::new(0.0, 2.0, 20.0));
    assert!(light.light_screen_uv(&f.rendering_data).is_none());
}

#[test]
fn test_light_traces_at_half_resolution() {
    let mut f = PassFixture::new();
    let mut light = VolumetricLightFeature::new();
    initialized(&mut f, &mut light, &["volumetric_light", "volumetric_light_composite"]);
    light.set_light_position(Vec3::ZERO);

    let data = f.rendering_data.clone();
    f.with_context(|ctx, _| light.execute(ctx, &data)).unwrap();

    assert_eq!(f.device.count_events("create_texture 160x120 R16G16B16A16_SFLOAT"), 1);
    assert_eq!(f.cmd.count("bind_pipeline volumetric_light"), 2);
    assert_eq!(f.cmd.count("bind_pipeline volumetric_light_composite"), 1);
    assert_eq!(f.pool.in_use(), 0);
}

#[test]
fn test_light_behind_camera_draws_nothing() {
    let mut f = PassFixture::new();
    let mut light = VolumetricLightFeature::new();
    initialized(&mut f, &mut light, &["volumetric_light", "volumetric_light_composite"]);
    light.set_light_position(Vec3::new(0.0, 2.0, 50.0));

    let data = f.rendering_data.clone();
    f.with_context(|ctx, _| light.execute(ctx, &data)).unwrap();
    assert_eq!(f.cmd.count("draw"), 0);
}

// ============================================================================
// VolumetricFogFeature
// ============================================================================

#[test]
fn test_fog_defaults_and_setters() {
    let mut fog = VolumetricFogFeature::new();
    assert_eq!(fog.density(), 0.01);
    assert_eq!(fog.height(), 50.0);
    assert_eq!(fog.height_falloff(), 0.1);
    assert_eq!(fog.pass_event(), RenderPassEvent::AfterRenderingSkybox);

    fog.set_density(-1.0);
    assert_eq!(fog.density(), 0.0);
}

#[test]
fn test_fog_single_full_screen_draw() {
    let mut f = PassFixture::new();
    let mut fog = VolumetricFogFeature::new();
    initialized(&mut f, &mut fog, &["volumetric_fog"]);

    let data = f.rendering_data.clone();
    f.with_context(|ctx, _| fog.execute(ctx, &data)).unwrap();
    assert_eq!(f.cmd.count("draw 3"), 1);
    assert_eq!(f.cmd.count("push_constants 0+96"), 1);

    fog.set_density(0.0);
    f.cmd.commands.clear();
    f.with_context(|ctx, _| fog.execute(ctx, &data)).unwrap();
    assert_eq!(f.cmd.count("draw"), 0);
}

// ============================================================================
// VolumetricCloudFeature
// ============================================================================

#[test]
fn test_cloud_defaults() {
    let clouds = VolumetricCloudFeature::new();
    assert_eq!(clouds.coverage(), 0.5);
    assert_eq!(clouds.density(), 0.8);
    assert_eq!(clouds.height(), 1500.0);
    assert!(clouds.order() < VolumetricFogFeature::new().order());
}

#[test]
fn test_cloud_missing_composite_fails_initialize() {
    let mut f = PassFixture::new();
    f.pipeline("volumetric_clouds");
    let caps = f.device.capabilities();
    let mut clouds = VolumetricCloudFeature::new();
    assert!(!clouds.initialize(&mut f.setup(caps)));
}

#[test]
fn test_cloud_releases_temporary() {
    let mut f = PassFixture::new();
    let mut clouds = VolumetricCloudFeature::new();
    initialized(&mut f, &mut clouds, &["volumetric_clouds", "volumetric_clouds_composite"]);

    let data = f.rendering_data.clone();
    f.with_context(|ctx, _| clouds.execute(ctx, &data)).unwrap();
    assert_eq!(f.cmd.count("draw 3"), 2);
    assert_eq!(f.pool.in_use(), 0);
    assert_eq!(f.pool.allocated(), 1);
}
