/// Tests for SsaoFeature and SsrFeature

use super::*;
use crate::passes::test_support::PassFixture;

fn ssao_fixture(ssao: &mut SsaoFeature) -> PassFixture {
    let mut f = PassFixture::new();
    for name in ["ssao", "ssao_blur", "ssao_apply"] {
        f.pipeline(name);
    }
    let caps = f.device.capabilities();
    assert!(ssao.initialize(&mut f.setup(caps)));
    f
}

// ============================================================================
// SSAO
// ============================================================================

#[test]
fn test_ssao_defaults_and_clamping() {
    let mut ssao = SsaoFeature::default();
    assert_eq!(ssao.sample_count(), 64);
    assert_eq!(ssao.radius(), 0.5);
    assert_eq!(ssao.intensity(), 1.0);
    assert_eq!(ssao.pass_event(), RenderPassEvent::AfterRenderingOpaques);

    ssao.set_sample_count(0);
    assert_eq!(ssao.sample_count(), 1);
    ssao.set_sample_count(10_000);
    assert_eq!(ssao.sample_count(), SsaoFeature::MAX_SAMPLES);
    ssao.set_radius(-2.0);
    assert_eq!(ssao.radius(), 0.0);
}

#[test]
fn test_ssao_needs_all_pipelines() {
    let mut f = PassFixture::new();
    f.pipeline("ssao");
    f.pipeline("ssao_apply");
    let caps = f.device.capabilities();
    let mut ssao = SsaoFeature::new();
    assert!(!ssao.initialize(&mut f.setup(caps)));

    // Not ready: executing is a no-op
    let data = f.rendering_data.clone();
    f.with_context(|ctx, _| ssao.execute(ctx, &data)).unwrap();
    assert_eq!(f.cmd.count("draw"), 0);
}

#[test]
fn test_ssao_half_res_chain() {
    let mut ssao = SsaoFeature::new();
    let mut f = ssao_fixture(&mut ssao);

    let data = f.rendering_data.clone();
    f.with_context(|ctx, _| ssao.execute(ctx, &data)).unwrap();

    assert_eq!(f.device.count_events("create_texture 160x120 R32_SFLOAT"), 2);
    assert_eq!(f.cmd.count("draw 3"), 3);
    assert_eq!(f.cmd.count("push_constants 0+80"), 1);
    // Two offscreen passes and the camera pass for the apply step
    assert_eq!(f.cmd.count("begin_render_pass"), 3);
    assert_eq!(f.pool.in_use(), 0);
}

#[test]
fn test_ssao_reuses_temporaries_next_frame() {
    let mut ssao = SsaoFeature::new();
    let mut f = ssao_fixture(&mut ssao);
    let data = f.rendering_data.clone();

    f.with_context(|ctx, _| ssao.execute(ctx, &data)).unwrap();
    f.with_context(|ctx, _| ssao.execute(ctx, &data)).unwrap();

    assert_eq!(f.pool.allocated(), 2);
    assert_eq!(f.device.count_events("create_texture 160x120 R32_SFLOAT"), 2);
}

#[test]
fn test_ssao_allocation_failure_releases_first_target() {
    let mut ssao = SsaoFeature::new();
    let mut f = ssao_fixture(&mut ssao);
    let data = f.rendering_data.clone();

    // Warm one entry so the second request has to allocate
    f.with_context(|ctx, _| {
        let desc = scaled_target(ctx.render_target_size(), 2, TextureFormat::R32_SFLOAT);
        let temp = ctx.create_temporary_texture(&desc).unwrap();
        ctx.release_temporary_texture(temp.texture).unwrap();
    });
    f.device.fail_on("create_texture");

    let result = f.with_context(|ctx, _| ssao.execute(ctx, &data));
    assert!(matches!(result, Err(crate::error::Error::OutOfMemory)));
    assert_eq!(f.pool.in_use(), 0);
}

// ============================================================================
// SSR
// ============================================================================

#[test]
fn test_ssr_runs_before_transparents() {
    let ssr = SsrFeature::new();
    assert_eq!(ssr.pass_event(), RenderPassEvent::BeforeRenderingTransparents);
    assert_eq!(ssr.max_iterations(), 128);
    assert_eq!(ssr.thickness(), 0.01);
}

#[test]
fn test_ssr_trace_then_composite() {
    let mut f = PassFixture::new();
    f.pipeline("ssr");
    f.pipeline("ssr_composite");
    let caps = f.device.capabilities();
    let mut ssr = SsrFeature::new();
    assert!(ssr.initialize(&mut f.setup(caps)));
    f.device.clear_events();

    let data = f.rendering_data.clone();
    f.with_context(|ctx, _| ssr.execute(ctx, &data)).unwrap();

    assert_eq!(f.device.count_events("create_texture 320x240 R16G16B16A16_SFLOAT"), 1);
    let trace = f.cmd.commands.iter().position(|c| c == "bind_pipeline ssr").unwrap();
    let composite = f.cmd.commands.iter().position(|c| c == "bind_pipeline ssr_composite").unwrap();
    assert!(trace < composite);
    assert_eq!(f.pool.in_use(), 0);
}

#[test]
fn test_cleanup_drops_pipelines() {
    let mut ssao = SsaoFeature::new();
    let mut f = ssao_fixture(&mut ssao);
    ssao.cleanup(&mut f.device);

    let data = f.rendering_data.clone();
    f.with_context(|ctx, _| ssao.execute(ctx, &data)).unwrap();
    assert_eq!(f.cmd.count("draw"), 0);
}
