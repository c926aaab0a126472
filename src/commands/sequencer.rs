// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::time::Duration;

use crate::bindings::{DescriptorSet, ResourceKind};
use crate::commands::fence::{Fence, WaitPolicy};
use crate::commands::state::{Access, ImageLayout, LayoutTransition, ResourceState, ResourceTracker};
use crate::device::BoundDevice;
use crate::error::{ContractViolation, Error};
use crate::frame::DispatchGrid;
use crate::imp::ErrorScope;
use crate::memory::{Buffer, Image, MemoryVisibility, ResourceId};
use crate::pipeline::ComputePipeline;

/// Lifecycle of a [`CommandSequencer`].  Every transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequencerState {
    Idle,
    Recording,
    Ended,
    Submitted,
    Completed,
}

/// A command as recorded, for inspection after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCommand {
    CopyBuffer {
        src: ResourceId,
        dst: ResourceId,
        size: u64,
    },
    BufferBarrier {
        buffer: ResourceId,
        src: Access,
        dst: Access,
    },
    ImageBarrier {
        image: ResourceId,
        src: Access,
        dst: Access,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
    },
    Dispatch {
        entry_point: String,
        grid: DispatchGrid,
    },
    CopyImageToBuffer {
        image: ResourceId,
        dst: ResourceId,
        bytes_per_row: u32,
    },
}

/**
Records one linear command stream and submits it exactly once.

Every command is checked against the [`ResourceTracker`] before it is encoded, so a stream that
reads a resource without the barrier that makes the previous write visible is rejected on the
host, before anything reaches the device.

```text
Idle --begin--> Recording --end--> Ended --submit_and_wait--> Submitted --> Completed
```
*/
#[derive(Debug)]
pub struct CommandSequencer {
    device: BoundDevice,
    state: SequencerState,
    tracker: ResourceTracker,
    encoder: Option<wgpu::CommandEncoder>,
    finished: Option<wgpu::CommandBuffer>,
    recorded: Vec<RecordedCommand>,
}

impl CommandSequencer {
    pub fn new(device: &BoundDevice) -> CommandSequencer {
        CommandSequencer {
            device: device.clone(),
            state: SequencerState::Idle,
            tracker: ResourceTracker::new(),
            encoder: None,
            finished: None,
            recorded: Vec::new(),
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Commands recorded so far, in order.
    pub fn recorded(&self) -> &[RecordedCommand] {
        &self.recorded
    }

    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    fn require(&self, operation: &'static str, state: SequencerState) -> Result<(), ContractViolation> {
        if self.state != state {
            return Err(ContractViolation::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn encoder(&mut self, operation: &'static str) -> Result<&mut wgpu::CommandEncoder, ContractViolation> {
        let state = self.state;
        self.encoder
            .as_mut()
            .ok_or(ContractViolation::InvalidState { operation, state })
    }

    fn track_buffer(&mut self, buffer: &Buffer) -> Result<ResourceId, ContractViolation> {
        let inner = buffer.inner()?;
        let initial = match inner.visibility {
            MemoryVisibility::HostWrite => Access::HostWrite,
            MemoryVisibility::DeviceLocal | MemoryVisibility::HostRead => Access::None,
        };
        self.tracker
            .register(inner.id, &inner.label, ResourceState::buffer(initial));
        Ok(inner.id)
    }

    fn track_image(&mut self, image: &Image) -> Result<ResourceId, ContractViolation> {
        let inner = image.inner()?;
        self.tracker
            .register(inner.id, &inner.label, ResourceState::image());
        Ok(inner.id)
    }

    pub fn begin(&mut self) -> Result<(), ContractViolation> {
        self.require("begin", SequencerState::Idle)?;
        let encoder = self
            .device
            .wgpu_device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("oneshot command stream"),
            });
        self.encoder = Some(encoder);
        self.state = SequencerState::Recording;
        Ok(())
    }

    /// Copies the first `size` bytes of `src` into `dst`.
    pub fn copy_buffer(&mut self, src: &Buffer, dst: &Buffer, size: u64) -> Result<(), ContractViolation> {
        self.require("copy_buffer", SequencerState::Recording)?;
        let src_id = self.track_buffer(src)?;
        let dst_id = self.track_buffer(dst)?;
        for buffer in [src, dst] {
            if buffer.size() < size {
                return Err(ContractViolation::BufferTooSmall {
                    resource: buffer.label().to_string(),
                    required: size,
                    actual: buffer.size(),
                });
            }
        }
        if size % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(ContractViolation::RecordingRejected(format!(
                "copy size {size} is not a multiple of {}",
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }
        self.tracker.check_access(src_id, Access::TransferRead, None)?;
        self.tracker.check_access(dst_id, Access::TransferWrite, None)?;
        let (src_buffer, dst_buffer) = (src.wgpu_buffer()?, dst.wgpu_buffer()?);
        self.encoder("copy_buffer")?
            .copy_buffer_to_buffer(src_buffer, 0, dst_buffer, 0, size);
        self.tracker.record_access(src_id, Access::TransferRead);
        self.tracker.record_access(dst_id, Access::TransferWrite);
        self.recorded.push(RecordedCommand::CopyBuffer {
            src: src_id,
            dst: dst_id,
            size,
        });
        Ok(())
    }

    /// Makes `src` accesses to `buffer` visible to subsequent `dst` accesses.
    pub fn buffer_barrier(&mut self, buffer: &Buffer, src: Access, dst: Access) -> Result<(), ContractViolation> {
        self.require("buffer_barrier", SequencerState::Recording)?;
        let id = self.track_buffer(buffer)?;
        self.tracker.barrier(id, src, dst, None)?;
        self.recorded.push(RecordedCommand::BufferBarrier {
            buffer: id,
            src,
            dst,
        });
        Ok(())
    }

    /// Makes `src` accesses to `image` visible to `dst` accesses and transitions its layout.
    pub fn image_barrier(
        &mut self,
        image: &Image,
        src: Access,
        dst: Access,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
    ) -> Result<(), ContractViolation> {
        self.require("image_barrier", SequencerState::Recording)?;
        let id = self.track_image(image)?;
        self.tracker.barrier(
            id,
            src,
            dst,
            Some(LayoutTransition {
                old: old_layout,
                new: new_layout,
            }),
        )?;
        self.recorded.push(RecordedCommand::ImageBarrier {
            image: id,
            src,
            dst,
            old_layout,
            new_layout,
        });
        Ok(())
    }

    /**
    Binds `pipeline` and `set` and dispatches `grid` workgroups.

    This is the set's first use, so it is sealed here: a slot bound with the wrong kind, a
    declared slot left unbound or a bound slot the layout does not declare is reported now.
    Bound images must be in [`ImageLayout::General`]; bound buffers are read as
    [`Access::ShaderRead`] and images written as [`Access::ShaderWrite`].
    */
    pub fn dispatch(
        &mut self,
        pipeline: &ComputePipeline,
        set: &mut DescriptorSet,
        grid: DispatchGrid,
    ) -> Result<(), ContractViolation> {
        self.require("dispatch", SequencerState::Recording)?;
        if set.layout_id() != pipeline.layout_id() {
            return Err(ContractViolation::LayoutMismatch);
        }
        let limit = self.device.limits().max_compute_workgroups_per_dimension;
        if grid.x > limit || grid.y > limit || grid.z > limit {
            return Err(ContractViolation::RecordingRejected(format!(
                "dispatch {}x{}x{} exceeds {limit} workgroups per dimension",
                grid.x, grid.y, grid.z
            )));
        }
        set.check_against_layout()?;

        let mut accesses = Vec::new();
        for binding in set.binding_state() {
            let label = set.label_of(binding.slot).unwrap_or("resource").to_string();
            let (initial, access, layout) = match binding.kind {
                ResourceKind::StorageImage => (
                    ResourceState::image(),
                    Access::ShaderWrite,
                    Some(ImageLayout::General),
                ),
                ResourceKind::UniformBuffer | ResourceKind::StorageBuffer => {
                    (ResourceState::buffer(Access::None), Access::ShaderRead, None)
                }
            };
            self.tracker.register(binding.resource, &label, initial);
            self.tracker.check_access(binding.resource, access, layout)?;
            accesses.push((binding.resource, access));
        }
        let bind_group = set.seal()?;

        {
            let encoder = self.encoder("dispatch")?;
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(pipeline.entry_point()),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline.wgpu_pipeline());
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(grid.x, grid.y, grid.z);
        }
        for (id, access) in accesses {
            self.tracker.record_access(id, access);
        }
        self.recorded.push(RecordedCommand::Dispatch {
            entry_point: pipeline.entry_point().to_string(),
            grid,
        });
        Ok(())
    }

    /// Copies the whole of `image` into `dst`, one padded row per image row.
    ///
    /// Rows are [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`]-aligned in `dst`.
    pub fn copy_image_to_buffer(&mut self, image: &Image, dst: &Buffer) -> Result<(), ContractViolation> {
        self.require("copy_image_to_buffer", SequencerState::Recording)?;
        let image_id = self.track_image(image)?;
        let dst_id = self.track_buffer(dst)?;
        let inner = image.inner()?;
        let texel_size = inner.format.block_copy_size(None).ok_or_else(|| {
            ContractViolation::RecordingRejected(format!("{:?} can't be copied", inner.format))
        })?;
        let bytes_per_row = (inner.width * texel_size).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let required = bytes_per_row as u64 * inner.height as u64;
        if dst.size() < required {
            return Err(ContractViolation::BufferTooSmall {
                resource: dst.label().to_string(),
                required,
                actual: dst.size(),
            });
        }
        self.tracker
            .check_access(image_id, Access::TransferRead, Some(ImageLayout::TransferSrcOptimal))?;
        self.tracker.check_access(dst_id, Access::TransferWrite, None)?;
        let dst_buffer = dst.wgpu_buffer()?;
        self.encoder("copy_image_to_buffer")?.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &inner.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: dst_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(inner.height),
                },
            },
            wgpu::Extent3d {
                width: inner.width,
                height: inner.height,
                depth_or_array_layers: 1,
            },
        );
        self.tracker.record_access(image_id, Access::TransferRead);
        self.tracker.record_access(dst_id, Access::TransferWrite);
        self.recorded.push(RecordedCommand::CopyImageToBuffer {
            image: image_id,
            dst: dst_id,
            bytes_per_row,
        });
        Ok(())
    }

    /// Closes the stream.  The backend validates the encoded commands here.
    pub fn end(&mut self) -> Result<(), ContractViolation> {
        self.require("end", SequencerState::Recording)?;
        let encoder = self.encoder.take().ok_or(ContractViolation::InvalidState {
            operation: "end",
            state: self.state,
        })?;
        let scope = ErrorScope::open(self.device.wgpu_device());
        let command_buffer = encoder.finish();
        if let Some(error) = scope.close() {
            return Err(ContractViolation::RecordingRejected(error.to_string()));
        }
        self.finished = Some(command_buffer);
        self.state = SequencerState::Ended;
        logwise::debuginternal_sync!(
            "command stream ended with {count} commands",
            count = self.recorded.len()
        );
        Ok(())
    }

    /// Submits the stream and blocks on its fence according to `policy`.
    ///
    /// Returns the time spent waiting.
    pub fn submit_and_wait(&mut self, policy: WaitPolicy) -> Result<Duration, Error> {
        self.require("submit_and_wait", SequencerState::Ended)?;
        let command_buffer = self.finished.take().ok_or(ContractViolation::InvalidState {
            operation: "submit_and_wait",
            state: self.state,
        })?;
        let scope = ErrorScope::open(self.device.wgpu_device());
        let fence = Fence::submit(&self.device, command_buffer);
        self.state = SequencerState::Submitted;
        if let Some(error) = scope.close() {
            return Err(ContractViolation::RecordingRejected(error.to_string()).into());
        }
        let wait = logwise::perfwarn_begin!("submit_and_wait");
        let waited = fence.wait(&self.device, policy)?;
        drop(wait);
        self.state = SequencerState::Completed;
        Ok(waited)
    }
}
