// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::bindings::layout::{Layout, LayoutId, ResourceKind};
use crate::bindings::set::DescriptorSet;
use crate::error::{AllocationError, NativeCode};

/**
Capacity for descriptor sets of one layout.

The pool is sized exactly: one set, with as many descriptors of each kind as the layout
declares.  A second allocation, or an allocation for another layout, fails the way an exhausted
native pool would.
*/
#[derive(Debug)]
pub struct DescriptorPool {
    layout: LayoutId,
    max_sets: u32,
    allocated: u32,
    storage_images: u32,
    uniform_buffers: u32,
    storage_buffers: u32,
}

impl DescriptorPool {
    pub fn for_layout(layout: &Layout) -> DescriptorPool {
        DescriptorPool {
            layout: layout.id(),
            max_sets: 1,
            allocated: 0,
            storage_images: layout.count_of(ResourceKind::StorageImage),
            uniform_buffers: layout.count_of(ResourceKind::UniformBuffer),
            storage_buffers: layout.count_of(ResourceKind::StorageBuffer),
        }
    }

    /// Descriptors of `kind` the pool was sized for.
    pub fn capacity_of(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::StorageImage => self.storage_images,
            ResourceKind::UniformBuffer => self.uniform_buffers,
            ResourceKind::StorageBuffer => self.storage_buffers,
        }
    }

    pub fn remaining_sets(&self) -> u32 {
        self.max_sets - self.allocated
    }

    pub fn allocate_set(&mut self, layout: &Layout) -> Result<DescriptorSet, AllocationError> {
        if layout.id() != self.layout {
            return Err(AllocationError {
                resource: "descriptor set".to_string(),
                code: NativeCode::OutOfPoolMemory,
                detail: "the pool was not sized for this layout".to_string(),
            });
        }
        if self.allocated >= self.max_sets {
            return Err(AllocationError {
                resource: "descriptor set".to_string(),
                code: NativeCode::OutOfPoolMemory,
                detail: format!("pool holds {} set(s), all allocated", self.max_sets),
            });
        }
        self.allocated += 1;
        Ok(DescriptorSet::new(layout.clone()))
    }
}
