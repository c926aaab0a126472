// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The end-to-end run.

[`PipelineEngine::run`] goes through the whole lifecycle exactly once:

1. validate the frame and the parameter block (nothing is allocated before this passes)
2. allocate the staging source, parameter buffer, output image and staging destination
3. build the layout, pipeline, pool and descriptor set
4. record copy → barriers → dispatch → barrier → copy
5. submit, wait on the fence
6. map the staging destination and strip the row padding

The engine is consumed by the run; a second pass needs a new engine.
*/

use std::time::Instant;

use crate::bindings::{
    BindResource, BindingSpec, DescriptorPool, Layout, OUTPUT_IMAGE_SLOT, PARAMETER_SLOT,
    ParameterPlacement,
};
use crate::commands::{Access, CommandSequencer, ImageLayout, WaitPolicy};
use crate::device::BoundDevice;
use crate::error::{ContractViolation, Error};
use crate::frame::FrameDescriptor;
use crate::memory::{Allocator, staging};
use crate::pipeline::ComputePipeline;
use crate::pixels::PixelBuffer;
use crate::render_data::ParameterBlock;
use crate::shader::ShaderModule;

/// Knobs for a [`PipelineEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub wait: WaitPolicy,
    /// Prefix of every resource label, visible in backend diagnostics.
    pub label: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            wait: WaitPolicy::Unbounded,
            label: "oneshot".to_string(),
        }
    }
}

/// Runs one compute pass on a device.
#[derive(Debug)]
pub struct PipelineEngine {
    device: BoundDevice,
    options: EngineOptions,
}

impl PipelineEngine {
    pub fn new(device: &BoundDevice) -> PipelineEngine {
        PipelineEngine {
            device: device.clone(),
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> PipelineEngine {
        self.options = options;
        self
    }

    /// Renders `block` into a `frame`-sized image.
    pub fn run(
        self,
        frame: FrameDescriptor,
        block: &ParameterBlock,
        shader: &ShaderModule,
    ) -> Result<PixelBuffer, Error> {
        block.validate()?;
        self.run_with_parameters(frame, block.as_bytes(), shader)
    }

    /// Like [`Self::run`] for an arbitrary parameter payload.
    ///
    /// The payload's size picks the [`ParameterPlacement`]; its contents are not interpreted.
    pub fn run_with_parameters(
        self,
        frame: FrameDescriptor,
        parameters: &[u8],
        shader: &ShaderModule,
    ) -> Result<PixelBuffer, Error> {
        frame.validate()?;
        if parameters.is_empty() {
            return Err(ContractViolation::ZeroSized {
                resource: "parameter block".to_string(),
            }
            .into());
        }
        let started = Instant::now();
        let placement = ParameterPlacement::for_size(parameters.len() as u64);
        logwise::info_sync!(
            "rendering {width}x{height} on {adapter}, {size} parameter bytes as {placement}",
            width = frame.width,
            height = frame.height,
            adapter = self.device.adapter_name(),
            size = parameters.len(),
            placement = logwise::privacy::LogIt(&placement)
        );

        let device = &self.device;
        let mut allocator = Allocator::with_label(device, self.options.label.clone());
        let staging_source = allocator.staging_source(parameters)?;
        let parameter_buffer = allocator.parameter_buffer(placement, parameters.len() as u64)?;
        let image = allocator.output_image(frame)?;
        let staging_destination = allocator.staging_destination(frame.readback_size())?;

        let layout = Layout::build(device, &BindingSpec::output_and_parameters(placement))?;
        let pipeline = ComputePipeline::build(device, shader, &layout)?;
        let mut pool = DescriptorPool::for_layout(&layout);
        let mut set = pool.allocate_set(&layout)?;
        set.bind(OUTPUT_IMAGE_SLOT, BindResource::StorageImage(&image))?;
        let parameters_resource = match placement {
            ParameterPlacement::Uniform => BindResource::UniformBuffer(&parameter_buffer),
            ParameterPlacement::Storage => BindResource::StorageBuffer(&parameter_buffer),
        };
        set.bind(PARAMETER_SLOT, parameters_resource)?;

        let mut sequencer = CommandSequencer::new(device);
        sequencer.begin()?;
        sequencer.copy_buffer(&staging_source, &parameter_buffer, staging_source.size())?;
        sequencer.buffer_barrier(&parameter_buffer, Access::TransferWrite, Access::ShaderRead)?;
        sequencer.image_barrier(
            &image,
            Access::None,
            Access::ShaderWrite,
            ImageLayout::Undefined,
            ImageLayout::General,
        )?;
        sequencer.dispatch(&pipeline, &mut set, frame.dispatch_grid())?;
        sequencer.image_barrier(
            &image,
            Access::ShaderWrite,
            Access::TransferRead,
            ImageLayout::General,
            ImageLayout::TransferSrcOptimal,
        )?;
        sequencer.copy_image_to_buffer(&image, &staging_destination)?;
        sequencer.end()?;
        sequencer.submit_and_wait(self.options.wait)?;

        let elapsed = started.elapsed();
        logwise::info_sync!(
            "Done in {seconds}s",
            seconds = logwise::privacy::LogIt(&elapsed.as_secs_f64())
        );

        let padded_bytes_per_row = frame.padded_bytes_per_row();
        let pixels = staging::map_and_consume(device, &staging_destination, |bytes| {
            PixelBuffer::from_padded_rows(frame, padded_bytes_per_row, bytes)
        })?;
        let report = pixels.validity();
        if !report.is_clean() {
            report.log();
        }
        Ok(pixels)
    }
}
