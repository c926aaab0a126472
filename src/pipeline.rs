// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Compute pipeline construction.
use crate::bindings::Layout;
use crate::bindings::layout::LayoutId;
use crate::device::BoundDevice;
use crate::error::{ContractViolation, Error};
use crate::imp::ErrorScope;
use crate::shader::ShaderModule;

/// A compute pipeline bound to one [`Layout`].
#[derive(Debug, Clone)]
pub struct ComputePipeline {
    pipeline: wgpu::ComputePipeline,
    layout: LayoutId,
    entry_point: String,
}

impl ComputePipeline {
    /// Builds the pipeline; a shader whose interface does not match `layout` is rejected with
    /// [`ContractViolation::PipelineRejected`].
    pub fn build(
        device: &BoundDevice,
        shader: &ShaderModule,
        layout: &Layout,
    ) -> Result<ComputePipeline, Error> {
        let wgpu_device = device.wgpu_device();
        let scope = ErrorScope::open(wgpu_device);
        let pipeline_layout = wgpu_device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("oneshot pipeline layout"),
            bind_group_layouts: &[layout.bind_group_layout()],
            push_constant_ranges: &[],
        });
        let pipeline = wgpu_device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(shader.entry_point()),
            layout: Some(&pipeline_layout),
            module: shader.wgpu_module(),
            entry_point: Some(shader.entry_point()),
            compilation_options: Default::default(),
            cache: None,
        });
        if let Some(error) = scope.close() {
            logwise::error_sync!(
                "pipeline rejected: {error}",
                error = logwise::privacy::LogIt(&error)
            );
            return Err(ContractViolation::PipelineRejected(error.to_string()).into());
        }
        logwise::info_sync!(
            "built compute pipeline for entry point {entry}",
            entry = shader.entry_point().to_string()
        );
        Ok(ComputePipeline {
            pipeline,
            layout: layout.id(),
            entry_point: shader.entry_point().to_string(),
        })
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub(crate) fn layout_id(&self) -> LayoutId {
        self.layout
    }

    pub(crate) fn wgpu_pipeline(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }
}
