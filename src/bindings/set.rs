// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::collections::BTreeMap;

use crate::bindings::layout::{Layout, LayoutId, ResourceKind};
use crate::error::ContractViolation;
use crate::imp::ErrorScope;
use crate::memory::{Buffer, Image, ResourceId};

/// A resource to bind, tagged with the kind it is bound as.
#[derive(Debug, Clone, Copy)]
pub enum BindResource<'a> {
    StorageImage(&'a Image),
    UniformBuffer(&'a Buffer),
    StorageBuffer(&'a Buffer),
}

impl BindResource<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            BindResource::StorageImage(_) => ResourceKind::StorageImage,
            BindResource::UniformBuffer(_) => ResourceKind::UniformBuffer,
            BindResource::StorageBuffer(_) => ResourceKind::StorageBuffer,
        }
    }
}

#[derive(Debug, Clone)]
enum BoundHandle {
    View(wgpu::TextureView),
    Buffer(wgpu::Buffer),
}

#[derive(Debug, Clone)]
struct BoundEntry {
    kind: ResourceKind,
    resource: ResourceId,
    label: String,
    handle: BoundHandle,
}

/// One `(slot, kind, resource)` row of [`DescriptorSet::binding_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingState {
    pub slot: u32,
    pub kind: ResourceKind,
    pub resource: ResourceId,
}

/**
Resources bound to the slots of a [`Layout`].

Binding is cheap and unchecked: the entry for a slot is replaced, so the last bind wins.  The
set is checked against its layout and sealed the first time a dispatch uses it; after that it
is immutable.
*/
#[derive(Debug)]
pub struct DescriptorSet {
    layout: Layout,
    entries: BTreeMap<u32, BoundEntry>,
    sealed: Option<wgpu::BindGroup>,
}

impl DescriptorSet {
    pub(crate) fn new(layout: Layout) -> DescriptorSet {
        DescriptorSet {
            layout,
            entries: BTreeMap::new(),
            sealed: None,
        }
    }

    pub fn bind(&mut self, slot: u32, resource: BindResource<'_>) -> Result<(), ContractViolation> {
        if self.sealed.is_some() {
            return Err(ContractViolation::SetSealed);
        }
        let (id, label, handle) = match resource {
            BindResource::StorageImage(image) => {
                let inner = image.inner()?;
                (inner.id, inner.label.clone(), BoundHandle::View(inner.view.clone()))
            }
            BindResource::UniformBuffer(buffer) | BindResource::StorageBuffer(buffer) => {
                let inner = buffer.inner()?;
                (inner.id, inner.label.clone(), BoundHandle::Buffer(inner.buffer.clone()))
            }
        };
        let kind = resource.kind();
        if let Some(previous) = self.entries.insert(
            slot,
            BoundEntry {
                kind,
                resource: id,
                label,
                handle,
            },
        ) {
            logwise::trace_sync!(
                "slot {slot} rebound from {old} to {new}",
                slot = slot,
                old = previous.resource.0,
                new = id.0
            );
        }
        Ok(())
    }

    /// What is currently bound, ordered by slot.
    pub fn binding_state(&self) -> Vec<BindingState> {
        self.entries
            .iter()
            .map(|(slot, entry)| BindingState {
                slot: *slot,
                kind: entry.kind,
                resource: entry.resource,
            })
            .collect()
    }

    pub(crate) fn label_of(&self, slot: u32) -> Option<&str> {
        self.entries.get(&slot).map(|e| e.label.as_str())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(crate) fn layout_id(&self) -> LayoutId {
        self.layout.id()
    }

    /// Checks every slot against the layout, creates the native bind group and seals the set.
    ///
    /// Sealing an already sealed set returns the existing bind group.
    pub(crate) fn seal(&mut self) -> Result<wgpu::BindGroup, ContractViolation> {
        if let Some(bind_group) = &self.sealed {
            return Ok(bind_group.clone());
        }
        self.check_against_layout()?;
        let bind_group = self.create_bind_group()?;
        logwise::debuginternal_sync!(
            "sealed descriptor set with {count} bindings",
            count = self.entries.len()
        );
        self.sealed = Some(bind_group.clone());
        Ok(bind_group)
    }

    /// Checks every slot against the layout without sealing.
    pub(crate) fn check_against_layout(&self) -> Result<(), ContractViolation> {
        for spec in self.layout.specs() {
            match self.entries.get(&spec.slot) {
                None => return Err(ContractViolation::UnboundSlot { slot: spec.slot }),
                Some(entry) if entry.kind != spec.kind => {
                    return Err(ContractViolation::DescriptorKindMismatch {
                        slot: spec.slot,
                        declared: spec.kind,
                        bound: entry.kind,
                    });
                }
                Some(_) => {}
            }
        }
        if let Some(slot) = self
            .entries
            .keys()
            .find(|slot| self.layout.spec(**slot).is_none())
        {
            return Err(ContractViolation::UndeclaredSlot { slot: *slot });
        }
        Ok(())
    }

    fn create_bind_group(&self) -> Result<wgpu::BindGroup, ContractViolation> {
        let entries = self
            .entries
            .iter()
            .map(|(slot, entry)| wgpu::BindGroupEntry {
                binding: *slot,
                resource: match &entry.handle {
                    BoundHandle::View(view) => wgpu::BindingResource::TextureView(view),
                    BoundHandle::Buffer(buffer) => buffer.as_entire_binding(),
                },
            })
            .collect::<Vec<_>>();
        let device = self.layout.device().wgpu_device();
        let scope = ErrorScope::open(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("oneshot descriptor set"),
            layout: self.layout.bind_group_layout(),
            entries: &entries,
        });
        match scope.close() {
            Some(error) => Err(ContractViolation::RecordingRejected(error.to_string())),
            None => Ok(bind_group),
        }
    }
}
