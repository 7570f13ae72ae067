/// UI overlay: screen-space quads drawn on top of the finished image

use std::any::Any;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};
use crate::error::Result;
use crate::graphics_device::{Extent2D, GraphicsDevice, PipelineKey};
use crate::renderer::{RenderContext, SetupContext};
use crate::rendering::RenderingData;
use crate::render_feature::{require_pipelines, RenderFeature, RenderPassEvent};

/// Axis-aligned rectangle in pixels, origin top-left
#[derive(Debug, Clone, PartialEq)]
pub struct UiElement {
    pub position: Vec2,
    pub size: Vec2,
    pub color: Vec4,
    /// Higher layers draw later
    pub layer: i32,
    pub visible: bool,
}

impl UiElement {
    pub fn new(position: Vec2, size: Vec2, color: Vec4) -> Self {
        Self { position, size, color, layer: 0, visible: true }
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Rectangle in normalized device coordinates: min xy, max xy
    fn ndc_rect(&self, screen: Extent2D) -> Vec4 {
        let scale = Vec2::new(2.0 / screen.width.max(1) as f32, 2.0 / screen.height.max(1) as f32);
        let min = self.position * scale - Vec2::ONE;
        let max = (self.position + self.size) * scale - Vec2::ONE;
        Vec4::new(min.x, min.y, max.x, max.y)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct QuadConstants {
    rect: [f32; 4],
    color: [f32; 4],
}

pub struct UiFeature {
    elements: Vec<UiElement>,
    pipeline: Option<PipelineKey>,
}

impl UiFeature {
    pub const NAME: &'static str = "UI";
    const QUAD_VERTICES: u32 = 6;

    pub fn new() -> Self {
        Self { elements: Vec::new(), pipeline: None }
    }

    /// Returns the element's index
    pub fn add_element(&mut self, element: UiElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut UiElement> {
        self.elements.get_mut(index)
    }

    pub fn elements(&self) -> &[UiElement] {
        &self.elements
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Visible elements with a non-empty area, by layer then insertion order
    fn draw_list(&self) -> Vec<&UiElement> {
        let mut list: Vec<&UiElement> = self
            .elements
            .iter()
            .filter(|e| e.visible && e.size.x > 0.0 && e.size.y > 0.0)
            .collect();
        list.sort_by_key(|e| e.layer);
        list
    }
}

impl Default for UiFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderFeature for UiFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRendering
    }

    /// After every post-processing feature
    fn order(&self) -> i32 {
        100
    }

    fn initialize(&mut self, setup: &mut SetupContext) -> bool {
        self.pipeline = require_pipelines(setup, Self::NAME, ["ui_quad"]).map(|[p]| p);
        self.pipeline.is_some()
    }

    fn execute(&mut self, ctx: &mut dyn RenderContext, _data: &RenderingData) -> Result<()> {
        let Some(pipeline) = self.pipeline else {
            return Ok(());
        };
        let screen = ctx.render_target_size();
        for element in self.draw_list() {
            let constants = QuadConstants {
                rect: element.ndc_rect(screen).to_array(),
                color: element.color.to_array(),
            };
            ctx.draw_procedural(pipeline, Self::QUAD_VERTICES, bytemuck::bytes_of(&constants), None)?;
        }
        Ok(())
    }

    fn cleanup(&mut self, _device: &mut dyn GraphicsDevice) {
        self.pipeline = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "ui_tests.rs"]
mod tests;
