// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Explicit per-resource access state.

wgpu inserts the native barriers for us, but the pass still declares them: the tracker keeps the
last access (and, for images, the layout) of every resource the stream touches and rejects a
command whose access is not made visible by a preceding barrier.

The rules:

* A GPU write (`TransferWrite`, `ShaderWrite`) followed by any different access needs a barrier
  in between.
* A barrier's source access must be the tracked access.  `Access::None` is accepted as a source
  for resources that were never touched or only written by the host before submission.
* A barrier's old layout must be the tracked layout, unless it is `Undefined`, which discards
  the contents.
*/

use std::collections::HashMap;

use crate::error::ContractViolation;
use crate::memory::ResourceId;

/// How a resource was last accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    None,
    /// Written by the host before submission.
    HostWrite,
    TransferRead,
    TransferWrite,
    ShaderRead,
    ShaderWrite,
}

impl Access {
    pub const fn is_gpu_write(self) -> bool {
        matches!(self, Access::TransferWrite | Access::ShaderWrite)
    }
}

/// Memory arrangement of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    /// Contents are undefined; any transition from here discards them.
    Undefined,
    /// Readable and writable by shaders.
    General,
    /// Source of a transfer.
    TransferSrcOptimal,
}

/// Tracked state of one resource.  `layout` is `None` for buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceState {
    pub access: Access,
    pub layout: Option<ImageLayout>,
}

impl ResourceState {
    pub const fn buffer(access: Access) -> ResourceState {
        ResourceState {
            access,
            layout: None,
        }
    }

    pub const fn image() -> ResourceState {
        ResourceState {
            access: Access::None,
            layout: Some(ImageLayout::Undefined),
        }
    }
}

#[derive(Debug, Clone)]
struct Tracked {
    label: String,
    state: ResourceState,
}

/// A layout transition carried by an image barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutTransition {
    pub old: ImageLayout,
    pub new: ImageLayout,
}

/// The access state of every resource a command stream has touched.
#[derive(Debug, Default, Clone)]
pub struct ResourceTracker {
    resources: HashMap<ResourceId, Tracked>,
}

impl ResourceTracker {
    pub fn new() -> ResourceTracker {
        ResourceTracker::default()
    }

    /// Starts tracking `id` with `initial` unless it is already tracked.
    pub fn register(&mut self, id: ResourceId, label: &str, initial: ResourceState) {
        self.resources.entry(id).or_insert_with(|| Tracked {
            label: label.to_string(),
            state: initial,
        });
    }

    pub fn state(&self, id: ResourceId) -> Option<ResourceState> {
        self.resources.get(&id).map(|t| t.state)
    }

    fn tracked(&self, id: ResourceId) -> Result<&Tracked, ContractViolation> {
        self.resources
            .get(&id)
            .ok_or_else(|| ContractViolation::RecordingRejected(format!("resource {id} is not tracked")))
    }

    /// Checks that `id` may be accessed as `next` (in `required_layout`, for images)
    /// without changing anything.
    pub fn check_access(
        &self,
        id: ResourceId,
        next: Access,
        required_layout: Option<ImageLayout>,
    ) -> Result<(), ContractViolation> {
        let tracked = self.tracked(id)?;
        if let Some(required) = required_layout {
            let actual = tracked.state.layout.unwrap_or(ImageLayout::Undefined);
            if actual != required {
                return Err(ContractViolation::WrongLayout {
                    resource: tracked.label.clone(),
                    required,
                    actual,
                });
            }
        }
        let previous = tracked.state.access;
        if previous.is_gpu_write() && previous != next {
            return Err(ContractViolation::MissingBarrier {
                resource: tracked.label.clone(),
                previous,
                next,
            });
        }
        Ok(())
    }

    /// Records an access that [`Self::check_access`] accepted.
    pub fn record_access(&mut self, id: ResourceId, next: Access) {
        if let Some(tracked) = self.resources.get_mut(&id) {
            logwise::debuginternal_sync!(
                "{label}: {previous} -> {next}",
                label = tracked.label.clone(),
                previous = logwise::privacy::LogIt(&tracked.state.access),
                next = logwise::privacy::LogIt(&next)
            );
            tracked.state.access = next;
        }
    }

    pub fn access(
        &mut self,
        id: ResourceId,
        next: Access,
        required_layout: Option<ImageLayout>,
    ) -> Result<(), ContractViolation> {
        self.check_access(id, next, required_layout)?;
        self.record_access(id, next);
        Ok(())
    }

    /// Applies a barrier from `src` to `dst`, optionally transitioning an image's layout.
    pub fn barrier(
        &mut self,
        id: ResourceId,
        src: Access,
        dst: Access,
        transition: Option<LayoutTransition>,
    ) -> Result<(), ContractViolation> {
        let tracked = self.tracked(id)?;
        let current = tracked.state.access;
        let source_matches = src == current
            || (src == Access::None && matches!(current, Access::None | Access::HostWrite));
        if !source_matches {
            return Err(ContractViolation::BarrierMismatch {
                resource: tracked.label.clone(),
                tracked: current,
                declared: src,
            });
        }
        if let Some(transition) = transition {
            let actual = tracked.state.layout.unwrap_or(ImageLayout::Undefined);
            if transition.old != ImageLayout::Undefined && transition.old != actual {
                return Err(ContractViolation::WrongLayout {
                    resource: tracked.label.clone(),
                    required: transition.old,
                    actual,
                });
            }
        }
        if let Some(tracked) = self.resources.get_mut(&id) {
            tracked.state.access = dst;
            if let Some(transition) = transition {
                tracked.state.layout = Some(transition.new);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: ResourceId = ResourceId(1);
    const IMAGE: ResourceId = ResourceId(2);

    fn tracker() -> ResourceTracker {
        let mut tracker = ResourceTracker::new();
        tracker.register(PARAMS, "params", ResourceState::buffer(Access::None));
        tracker.register(IMAGE, "image", ResourceState::image());
        tracker
    }

    #[test]
    fn canonical_sequence() {
        let mut t = tracker();
        t.access(PARAMS, Access::TransferWrite, None).unwrap();
        t.barrier(PARAMS, Access::TransferWrite, Access::ShaderRead, None)
            .unwrap();
        t.barrier(
            IMAGE,
            Access::None,
            Access::ShaderWrite,
            Some(LayoutTransition {
                old: ImageLayout::Undefined,
                new: ImageLayout::General,
            }),
        )
        .unwrap();
        t.access(PARAMS, Access::ShaderRead, None).unwrap();
        t.access(IMAGE, Access::ShaderWrite, Some(ImageLayout::General))
            .unwrap();
        t.barrier(
            IMAGE,
            Access::ShaderWrite,
            Access::TransferRead,
            Some(LayoutTransition {
                old: ImageLayout::General,
                new: ImageLayout::TransferSrcOptimal,
            }),
        )
        .unwrap();
        t.access(
            IMAGE,
            Access::TransferRead,
            Some(ImageLayout::TransferSrcOptimal),
        )
        .unwrap();
        assert_eq!(
            t.state(IMAGE),
            Some(ResourceState {
                access: Access::TransferRead,
                layout: Some(ImageLayout::TransferSrcOptimal)
            })
        );
    }

    #[test]
    fn read_after_transfer_write_needs_barrier() {
        let mut t = tracker();
        t.access(PARAMS, Access::TransferWrite, None).unwrap();
        assert_eq!(
            t.access(PARAMS, Access::ShaderRead, None),
            Err(ContractViolation::MissingBarrier {
                resource: "params".to_string(),
                previous: Access::TransferWrite,
                next: Access::ShaderRead
            })
        );
        //rejected access leaves the state alone
        assert_eq!(t.state(PARAMS).map(|s| s.access), Some(Access::TransferWrite));
    }

    #[test]
    fn dispatch_into_undefined_image_rejected() {
        let mut t = tracker();
        assert!(matches!(
            t.access(IMAGE, Access::ShaderWrite, Some(ImageLayout::General)),
            Err(ContractViolation::WrongLayout {
                required: ImageLayout::General,
                actual: ImageLayout::Undefined,
                ..
            })
        ));
    }

    #[test]
    fn barrier_source_must_match() {
        let mut t = tracker();
        t.access(PARAMS, Access::TransferWrite, None).unwrap();
        assert!(matches!(
            t.barrier(PARAMS, Access::ShaderWrite, Access::ShaderRead, None),
            Err(ContractViolation::BarrierMismatch {
                tracked: Access::TransferWrite,
                declared: Access::ShaderWrite,
                ..
            })
        ));
    }

    #[test]
    fn host_written_buffer_accepts_none_source() {
        let mut t = ResourceTracker::new();
        let staging = ResourceId(9);
        t.register(staging, "staging", ResourceState::buffer(Access::HostWrite));
        t.access(staging, Access::TransferRead, None).unwrap();
        let mut t = ResourceTracker::new();
        t.register(staging, "staging", ResourceState::buffer(Access::HostWrite));
        t.barrier(staging, Access::None, Access::TransferRead, None)
            .unwrap();
    }

    #[test]
    fn layout_transition_checks_old_layout() {
        let mut t = tracker();
        assert!(matches!(
            t.barrier(
                IMAGE,
                Access::None,
                Access::TransferRead,
                Some(LayoutTransition {
                    old: ImageLayout::General,
                    new: ImageLayout::TransferSrcOptimal
                })
            ),
            Err(ContractViolation::WrongLayout { .. })
        ));
    }

    #[test]
    fn untracked_resource_rejected() {
        let mut t = ResourceTracker::new();
        assert!(matches!(
            t.access(ResourceId(77), Access::ShaderRead, None),
            Err(ContractViolation::RecordingRejected(_))
        ));
    }
}
