// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Binding resources to the compute pipeline.

A [`Layout`] declares which [`ResourceKind`] each slot expects.  A [`DescriptorPool`] sized for
exactly one set of that layout hands out a [`DescriptorSet`], which records binds (the last bind
to a slot wins) until its first use by a dispatch seals it.

The conventional layout has the output image at slot 0 and the parameter buffer at slot 1; the
parameter slot's kind follows the [`ParameterPlacement`] chosen from the block's size.
*/

pub mod layout;
pub mod placement;
pub mod pool;
pub mod set;

pub use layout::{BindingSpec, Layout, ResourceKind, Stage};
pub use placement::{ParameterPlacement, UNIFORM_THRESHOLD_BYTES};
pub use pool::DescriptorPool;
pub use set::{BindResource, BindingState, DescriptorSet};

/// Slot of the output image in the conventional layout.
pub const OUTPUT_IMAGE_SLOT: u32 = 0;
/// Slot of the parameter buffer in the conventional layout.
pub const PARAMETER_SLOT: u32 = 1;
