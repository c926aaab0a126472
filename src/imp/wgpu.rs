// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
mod bound_device;
mod entry_point;
mod error;
mod unbound_device;

pub(crate) use bound_device::DeviceLoss;
pub use bound_device::BoundDevice;
pub use entry_point::EntryPoint;
pub(crate) use error::{Error, ErrorScope, native_code};
pub use unbound_device::UnboundDevice;
