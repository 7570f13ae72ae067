/// Graphics pipeline registered with the device
///
/// Pipelines are built by the application; once registered the device owns
/// them and destroys pipeline and layout on unregister or teardown.

use ash::vk;

pub(crate) struct Pipeline {
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    device: ash::Device,
}

impl Pipeline {
    pub(crate) fn new(pipeline: vk::Pipeline, pipeline_layout: vk::PipelineLayout, device: ash::Device) -> Self {
        Self { pipeline, pipeline_layout, device }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}
