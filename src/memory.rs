// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Device memory: the allocation context, the resources it hands out, and host access to them.

Every [`Buffer`] and [`Image`] is created through an [`Allocator`] and is a move-only handle.
Dropping a non-empty handle destroys the device resource and decrements the allocator's live
count, exactly once.  [`Buffer::take`] and [`Image::take`] move the resource out and leave an
empty handle behind whose drop does nothing.

Host-visible buffers are only readable or writable inside the scoped closures of [`staging`].
*/

pub mod allocator;
pub mod buffer;
pub mod image;
pub mod staging;

pub use allocator::{Allocator, ResourceId};
pub use buffer::{Buffer, MemoryVisibility};
pub use image::Image;
