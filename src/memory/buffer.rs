// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::sync::Weak;

use crate::error::ContractViolation;
use crate::memory::allocator::{AllocationContext, ResourceId};

/// Where the host may touch a buffer's memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryVisibility {
    /// Only the device accesses the memory.
    DeviceLocal,
    /// The host writes (via [`crate::memory::staging::map_and_fill`]) and the device reads.
    HostWrite,
    /// The device writes and the host reads (via [`crate::memory::staging::map_and_consume`]).
    HostRead,
}

impl MemoryVisibility {
    pub(crate) fn map_usage(self) -> wgpu::BufferUsages {
        match self {
            MemoryVisibility::DeviceLocal => wgpu::BufferUsages::empty(),
            MemoryVisibility::HostWrite => wgpu::BufferUsages::MAP_WRITE,
            MemoryVisibility::HostRead => wgpu::BufferUsages::MAP_READ,
        }
    }
}

#[derive(Debug)]
pub(crate) struct BufferInner {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) id: ResourceId,
    pub(crate) label: String,
    pub(crate) size: u64,
    pub(crate) usage: wgpu::BufferUsages,
    pub(crate) visibility: MemoryVisibility,
}

/**
An owned device buffer.

There is exactly one owner at a time.  Moving the value moves ownership; [`Buffer::take`] moves
the resource out of a place that can't be moved from (a struct field, say) and leaves an empty
handle behind.
*/
#[derive(Debug)]
pub struct Buffer {
    inner: Option<BufferInner>,
    context: Weak<AllocationContext>,
}

impl Buffer {
    pub(crate) fn from_inner(inner: BufferInner, context: Weak<AllocationContext>) -> Buffer {
        Buffer {
            inner: Some(inner),
            context,
        }
    }

    /// Moves the resource into a new handle, leaving `self` empty.
    pub fn take(&mut self) -> Buffer {
        Buffer {
            inner: self.inner.take(),
            context: self.context.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    pub fn id(&self) -> Option<ResourceId> {
        self.inner.as_ref().map(|i| i.id)
    }

    /// Allocated size in bytes; zero for an empty handle.
    pub fn size(&self) -> u64 {
        self.inner.as_ref().map_or(0, |i| i.size)
    }

    pub fn usage(&self) -> wgpu::BufferUsages {
        self.inner
            .as_ref()
            .map_or(wgpu::BufferUsages::empty(), |i| i.usage)
    }

    pub fn visibility(&self) -> Option<MemoryVisibility> {
        self.inner.as_ref().map(|i| i.visibility)
    }

    /// Debug label; `"empty buffer"` for an empty handle.
    pub fn label(&self) -> &str {
        self.inner.as_ref().map_or("empty buffer", |i| i.label.as_str())
    }

    pub(crate) fn inner(&self) -> Result<&BufferInner, ContractViolation> {
        self.inner
            .as_ref()
            .ok_or_else(|| ContractViolation::EmptyHandle {
                resource: "buffer".to_string(),
            })
    }

    pub(crate) fn wgpu_buffer(&self) -> Result<&wgpu::Buffer, ContractViolation> {
        self.inner().map(|i| &i.buffer)
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            if let Some(context) = self.context.upgrade() {
                inner.buffer.destroy();
                context.released(inner.id, &inner.label);
            }
        }
    }
}
