// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::sync::Weak;

use crate::error::ContractViolation;
use crate::memory::allocator::{AllocationContext, ResourceId};

#[derive(Debug)]
pub(crate) struct ImageInner {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) id: ResourceId,
    pub(crate) label: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) format: wgpu::TextureFormat,
    pub(crate) usage: wgpu::TextureUsages,
}

/// An owned, device-local 2D image with a single mip level.
///
/// Ownership follows the same rules as [`crate::memory::Buffer`].
#[derive(Debug)]
pub struct Image {
    inner: Option<ImageInner>,
    context: Weak<AllocationContext>,
}

impl Image {
    pub(crate) fn from_inner(inner: ImageInner, context: Weak<AllocationContext>) -> Image {
        Image {
            inner: Some(inner),
            context,
        }
    }

    /// Moves the resource into a new handle, leaving `self` empty.
    pub fn take(&mut self) -> Image {
        Image {
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

    /// `(width, height)`; `(0, 0)` for an empty handle.
    pub fn extent(&self) -> (u32, u32) {
        self.inner.as_ref().map_or((0, 0), |i| (i.width, i.height))
    }

    pub fn format(&self) -> Option<wgpu::TextureFormat> {
        self.inner.as_ref().map(|i| i.format)
    }

    pub fn usage(&self) -> wgpu::TextureUsages {
        self.inner
            .as_ref()
            .map_or(wgpu::TextureUsages::empty(), |i| i.usage)
    }

    pub fn label(&self) -> &str {
        self.inner.as_ref().map_or("empty image", |i| i.label.as_str())
    }

    pub(crate) fn inner(&self) -> Result<&ImageInner, ContractViolation> {
        self.inner
            .as_ref()
            .ok_or_else(|| ContractViolation::EmptyHandle {
                resource: "image".to_string(),
            })
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            if let Some(context) = self.context.upgrade() {
                inner.texture.destroy();
                context.released(inner.id, &inner.label);
            }
        }
    }
}
