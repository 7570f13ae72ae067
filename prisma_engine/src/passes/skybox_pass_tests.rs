/// Tests for SkyboxPass

use super::*;
use crate::passes::test_support::PassFixture;

fn fixture_with_sky_pipelines() -> PassFixture {
    let mut f = PassFixture::new();
    f.pipeline("skybox_cubemap");
    f.pipeline("skybox_procedural");
    f
}

#[test]
fn test_constants_fit_push_constant_budget() {
    assert_eq!(std::mem::size_of::<SkyboxConstants>(), 128);
}

#[test]
fn test_defaults() {
    let pass = SkyboxPass::default();
    assert_eq!(pass.mode(), SkyboxMode::Cubemap);
    assert_eq!(pass.gradient().top, Vec3::new(0.1, 0.4, 0.8));
    assert_eq!(pass.atmosphere().mie_g, 0.8);
    assert_eq!(pass.atmosphere().atmosphere_height, 1000.0);
}

#[test]
fn test_missing_pipeline_for_mode_is_not_ready() {
    let mut f = fixture_with_sky_pipelines();
    let mut pass = SkyboxPass::new(SkyboxMode::AtmosphericScattering);
    assert!(matches!(f.initialize(&mut pass), Err(Error::InvalidResource(_))));
    assert!(!pass.is_ready());

    // switching to a mode with a pipeline needs no re-initialization
    pass.set_mode(SkyboxMode::Procedural);
    assert!(pass.is_ready());
}

#[test]
fn test_none_mode_is_never_ready() {
    let mut f = fixture_with_sky_pipelines();
    let mut pass = SkyboxPass::new(SkyboxMode::None);
    f.initialize(&mut pass).unwrap();
    assert!(!pass.is_ready());

    let stats = f.execute(&mut pass).unwrap();
    assert_eq!(stats.draw_calls, 0);
    assert_eq!(f.cmd.count("draw"), 0);
}

#[test]
fn test_draws_cube_with_skybox_depth_state() {
    let mut f = fixture_with_sky_pipelines();
    let mut pass = SkyboxPass::new(SkyboxMode::Procedural);
    f.initialize(&mut pass).unwrap();

    let stats = f.execute(&mut pass).unwrap();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(f.cmd.count("set_depth_state test=true write=false LessEqual"), 1);
    assert_eq!(f.cmd.count("bind_pipeline skybox_procedural"), 1);
    assert_eq!(f.cmd.count("push_constants 0+128"), 1);
    assert_eq!(f.cmd.count("draw 36"), 1);
}

#[test]
fn test_no_depth_state_without_capability() {
    let mut f = fixture_with_sky_pipelines();
    f.device.set_capabilities(RendererCapabilities::empty());
    let mut pass = SkyboxPass::new(SkyboxMode::Cubemap);
    f.initialize(&mut pass).unwrap();
    f.execute(&mut pass).unwrap();

    assert_eq!(f.cmd.count("set_depth_state"), 0);
    assert_eq!(f.cmd.count("draw 36"), 1);
}

#[test]
fn test_constants_per_mode() {
    let mut pass = SkyboxPass::new(SkyboxMode::Procedural);
    let c = pass.constants(Mat4::IDENTITY, Vec3::new(1.0, 2.0, 3.0), 4.0);
    assert_eq!(c.camera, [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(c.params[2], [0.8, 0.85, 0.95, 1.0]);

    pass.set_mode(SkyboxMode::AtmosphericScattering);
    let c = pass.constants(Mat4::IDENTITY, Vec3::ZERO, 0.0);
    assert_eq!(c.params[0], [0.005, 0.002, 0.8, 1000.0]);
    let sun = Vec3::from_slice(&c.params[1][..3]);
    assert!((sun.length() - 1.0).abs() < 1e-5);
    assert_eq!(c.params[1][3], 1.0);
}
