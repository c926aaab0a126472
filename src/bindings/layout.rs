// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bindings::{OUTPUT_IMAGE_SLOT, PARAMETER_SLOT, ParameterPlacement};
use crate::device::BoundDevice;
use crate::error::{AllocationError, ContractViolation, Error};
use crate::imp::ErrorScope;
use crate::memory::allocator::OUTPUT_FORMAT;

/// What a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A write-only `rgba32float` storage image.
    StorageImage,
    UniformBuffer,
    /// A read-only storage buffer.
    StorageBuffer,
}

impl ResourceKind {
    fn binding_type(self) -> wgpu::BindingType {
        match self {
            ResourceKind::StorageImage => wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: OUTPUT_FORMAT,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            ResourceKind::UniformBuffer => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            ResourceKind::StorageBuffer => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
        }
    }
}

/// The shader stage a slot is visible to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Compute,
}

impl Stage {
    fn shader_stages(self) -> wgpu::ShaderStages {
        match self {
            Stage::Compute => wgpu::ShaderStages::COMPUTE,
        }
    }
}

/// Declares one slot of a [`Layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingSpec {
    pub slot: u32,
    pub kind: ResourceKind,
    pub stage: Stage,
}

impl BindingSpec {
    pub const fn compute(slot: u32, kind: ResourceKind) -> BindingSpec {
        BindingSpec {
            slot,
            kind,
            stage: Stage::Compute,
        }
    }

    /// Output image at slot 0, parameters at slot 1.
    pub const fn output_and_parameters(placement: ParameterPlacement) -> [BindingSpec; 2] {
        [
            BindingSpec::compute(OUTPUT_IMAGE_SLOT, ResourceKind::StorageImage),
            BindingSpec::compute(PARAMETER_SLOT, placement.resource_kind()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct LayoutId(u64);

static NEXT_LAYOUT_ID: AtomicU64 = AtomicU64::new(0);

/**
The set of slots a pipeline expects.

Sets and pipelines remember the layout they were built from, and a set can only be used with a
pipeline of the same layout.
*/
#[derive(Debug, Clone)]
pub struct Layout {
    id: LayoutId,
    specs: Vec<BindingSpec>,
    device: BoundDevice,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl Layout {
    pub fn build(device: &BoundDevice, specs: &[BindingSpec]) -> Result<Layout, Error> {
        let mut seen = HashSet::new();
        for spec in specs {
            if !seen.insert(spec.slot) {
                return Err(ContractViolation::DuplicateSlot { slot: spec.slot }.into());
            }
        }
        let mut specs = specs.to_vec();
        specs.sort_by_key(|s| s.slot);
        let entries = specs
            .iter()
            .map(|spec| wgpu::BindGroupLayoutEntry {
                binding: spec.slot,
                visibility: spec.stage.shader_stages(),
                ty: spec.kind.binding_type(),
                count: None,
            })
            .collect::<Vec<_>>();

        let label = "oneshot binding layout";
        let wgpu_device = device.wgpu_device();
        let scope = ErrorScope::open(wgpu_device);
        let bind_group_layout =
            wgpu_device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &entries,
            });
        if let Some(error) = scope.close() {
            return Err(AllocationError::from_wgpu(label, &error).into());
        }
        Ok(Layout {
            id: LayoutId(NEXT_LAYOUT_ID.fetch_add(1, Ordering::Relaxed)),
            specs,
            device: device.clone(),
            bind_group_layout,
        })
    }

    /// Declared slots, ordered by slot number.
    pub fn specs(&self) -> &[BindingSpec] {
        &self.specs
    }

    pub fn spec(&self, slot: u32) -> Option<&BindingSpec> {
        self.specs.iter().find(|s| s.slot == slot)
    }

    /// Number of slots of `kind`.
    pub fn count_of(&self, kind: ResourceKind) -> u32 {
        self.specs.iter().filter(|s| s.kind == kind).count() as u32
    }

    pub(crate) fn id(&self) -> LayoutId {
        self.id
    }

    pub(crate) fn device(&self) -> &BoundDevice {
        &self.device
    }

    pub(crate) fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }
}
