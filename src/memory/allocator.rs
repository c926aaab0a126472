// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The allocation context.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::bindings::ParameterPlacement;
use crate::device::BoundDevice;
use crate::error::{AllocationError, ContractViolation, Error};
use crate::frame::FrameDescriptor;
use crate::imp::ErrorScope;
use crate::memory::buffer::{Buffer, BufferInner, MemoryVisibility};
use crate::memory::image::{Image, ImageInner};

/// Pixel format of the output image.
pub const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Identifies one allocation for the lifetime of its [`Allocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) u64);

impl Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State shared between an [`Allocator`] and the handles it created.
///
/// Handles hold this weakly: once the allocator is gone their drop releases nothing.
#[derive(Debug)]
pub(crate) struct AllocationContext {
    device: BoundDevice,
    live: AtomicUsize,
    next_id: AtomicU64,
}

impl AllocationContext {
    pub(crate) fn released(&self, id: ResourceId, label: &str) {
        let previous = self.live.fetch_sub(1, Ordering::Relaxed);
        logwise::trace_sync!(
            "released {label} {id} ({live} live)",
            label = label.to_string(),
            id = id.0,
            live = previous - 1
        );
    }
}

/**
Creates buffers and images on one device and counts how many are alive.

The allocator is the root of the ownership tree: create it first and drop it last.  Dropping it
while resources are still alive is reported as a warning; those handles then own their wgpu
objects outright and no longer report back.
*/
#[derive(Debug)]
pub struct Allocator {
    context: Arc<AllocationContext>,
    label: String,
}

impl Allocator {
    pub fn new(device: &BoundDevice) -> Allocator {
        Allocator::with_label(device, "oneshot")
    }

    /// An allocator whose resources are labelled `"{label} ..."` in backend diagnostics.
    pub fn with_label(device: &BoundDevice, label: impl Into<String>) -> Allocator {
        Allocator {
            context: Arc::new(AllocationContext {
                device: device.clone(),
                live: AtomicUsize::new(0),
                next_id: AtomicU64::new(0),
            }),
            label: label.into(),
        }
    }

    pub fn device(&self) -> &BoundDevice {
        &self.context.device
    }

    /// Number of buffers and images created here that have not been released.
    pub fn live_allocations(&self) -> usize {
        self.context.live.load(Ordering::Relaxed)
    }

    fn next_id(&self) -> ResourceId {
        ResourceId(self.context.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /**
    Creates a buffer of `size_bytes`.

    Host visibility adds the matching map usage.  wgpu only allows `MAP_READ` together with
    `COPY_DST` and `MAP_WRITE` together with `COPY_SRC`; other combinations are reported as an
    [`AllocationError`] with [`crate::error::NativeCode::Validation`].
    */
    pub fn create_buffer(
        &mut self,
        size_bytes: u64,
        usage: wgpu::BufferUsages,
        visibility: MemoryVisibility,
    ) -> Result<Buffer, Error> {
        let label = format!("{} buffer", self.label);
        self.allocate_buffer(label, size_bytes, usage, visibility, false)
    }

    fn allocate_buffer(
        &mut self,
        label: String,
        size_bytes: u64,
        usage: wgpu::BufferUsages,
        visibility: MemoryVisibility,
        mapped_at_creation: bool,
    ) -> Result<Buffer, Error> {
        if size_bytes == 0 {
            return Err(ContractViolation::ZeroSized { resource: label }.into());
        }
        let id = self.next_id();
        let label = format!("{label} {id}");
        let usage = usage | visibility.map_usage();
        let device = self.context.device.wgpu_device();
        let scope = ErrorScope::open(device);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label),
            size: size_bytes,
            usage,
            mapped_at_creation,
        });
        if let Some(error) = scope.close() {
            logwise::error_sync!(
                "can't create {label}: {error}",
                label = label.clone(),
                error = logwise::privacy::LogIt(&error)
            );
            return Err(AllocationError::from_wgpu(&label, &error).into());
        }
        let live = self.context.live.fetch_add(1, Ordering::Relaxed) + 1;
        logwise::trace_sync!(
            "created {label} ({size} bytes, {live} live)",
            label = label.clone(),
            size = size_bytes,
            live = live
        );
        Ok(Buffer::from_inner(
            BufferInner {
                buffer,
                id,
                label,
                size: size_bytes,
                usage,
                visibility,
            },
            Arc::downgrade(&self.context),
        ))
    }

    /// Creates a device-local 2D image.
    pub fn create_image(
        &mut self,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Result<Image, Error> {
        let id = self.next_id();
        let label = format!("{} image {id}", self.label);
        if width == 0 || height == 0 {
            return Err(ContractViolation::ZeroSized { resource: label }.into());
        }
        let device = self.context.device.wgpu_device();
        let scope = ErrorScope::open(device);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&label),
            ..Default::default()
        });
        if let Some(error) = scope.close() {
            logwise::error_sync!(
                "can't create {label}: {error}",
                label = label.clone(),
                error = logwise::privacy::LogIt(&error)
            );
            return Err(AllocationError::from_wgpu(&label, &error).into());
        }
        let live = self.context.live.fetch_add(1, Ordering::Relaxed) + 1;
        logwise::trace_sync!(
            "created {label} ({width}x{height}, {live} live)",
            label = label.clone(),
            width = width,
            height = height,
            live = live
        );
        Ok(Image::from_inner(
            ImageInner {
                texture,
                view,
                id,
                label,
                width,
                height,
                format,
                usage,
            },
            Arc::downgrade(&self.context),
        ))
    }

    /**
    A host-writable transfer source holding `bytes`.

    The buffer is created mapped, filled, and unmapped again so it is ready to be copied from.
    Its size is `bytes.len()` rounded up to [`wgpu::COPY_BUFFER_ALIGNMENT`].
    */
    pub fn staging_source(&mut self, bytes: &[u8]) -> Result<Buffer, Error> {
        let size = (bytes.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let label = format!("{} staging source", self.label);
        let buffer = self.allocate_buffer(
            label,
            size,
            wgpu::BufferUsages::COPY_SRC,
            MemoryVisibility::HostWrite,
            true,
        )?;
        let wgpu_buffer = buffer.wgpu_buffer()?;
        {
            let mut mapped = wgpu_buffer.slice(..).get_mapped_range_mut();
            mapped[..bytes.len()].copy_from_slice(bytes);
            mapped[bytes.len()..].fill(0);
        }
        wgpu_buffer.unmap();
        Ok(buffer)
    }

    /// A host-readable transfer destination of `size_bytes`.
    pub fn staging_destination(&mut self, size_bytes: u64) -> Result<Buffer, Error> {
        let label = format!("{} staging destination", self.label);
        self.allocate_buffer(
            label,
            size_bytes,
            wgpu::BufferUsages::COPY_DST,
            MemoryVisibility::HostRead,
            false,
        )
    }

    /// The device-local buffer the shader reads its parameters from.
    pub fn parameter_buffer(
        &mut self,
        placement: ParameterPlacement,
        size_bytes: u64,
    ) -> Result<Buffer, Error> {
        let label = format!("{} parameters", self.label);
        self.allocate_buffer(
            label,
            placement.binding_size(size_bytes),
            placement.buffer_usage() | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
            MemoryVisibility::DeviceLocal,
            false,
        )
    }

    /// The storage image the shader writes the frame into.
    pub fn output_image(&mut self, frame: FrameDescriptor) -> Result<Image, Error> {
        self.create_image(
            frame.width,
            frame.height,
            OUTPUT_FORMAT,
            wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
        )
    }
}

impl Drop for Allocator {
    fn drop(&mut self) {
        let live = self.live_allocations();
        if live > 0 {
            logwise::warn_sync!(
                "{label} allocator dropped with {live} live allocations",
                label = self.label.clone(),
                live = live
            );
        }
    }
}
