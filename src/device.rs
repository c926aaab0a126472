// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Cross-platform device wrappers.
//!
//! The core only needs a logical device and a compute-capable queue.  Picking and binding them
//! is the collaborator's job; these wrappers are the seam.
use std::fmt::Formatter;

use crate::entry_point::EntryPoint;
use crate::error::SynchronizationError;
use crate::imp;

/// A compute-capable adapter that has not been opened yet.
pub struct UnboundDevice(pub(crate) crate::imp::UnboundDevice);
impl UnboundDevice {
    ///Pick a headless, compute-capable device
    pub async fn pick(entry_point: &EntryPoint) -> Result<UnboundDevice, PickError> {
        crate::imp::UnboundDevice::pick(&entry_point.0)
            .await
            .map(UnboundDevice)
            .map_err(PickError)
    }
}

#[derive(Debug)]
pub struct PickError(imp::Error);
impl std::fmt::Display for PickError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}
impl std::error::Error for PickError {}

/// An opened logical device together with its queue.
///
/// Cloning is cheap and every clone refers to the same device.
#[derive(Debug, Clone)]
pub struct BoundDevice(pub(crate) imp::BoundDevice);

#[derive(Debug)]
pub struct BindError(imp::Error);
impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}
impl std::error::Error for BindError {}

impl BoundDevice {
    pub async fn bind(unbound_device: UnboundDevice) -> Result<Self, BindError> {
        let bind = crate::imp::BoundDevice::bind(unbound_device.0)
            .await
            .map_err(BindError)?;
        Ok(Self(bind))
    }

    /// Human-readable adapter name, for logs.
    pub fn adapter_name(&self) -> String {
        self.0.adapter().get_info().name
    }

    /// Limits the device was opened with.
    pub fn limits(&self) -> wgpu::Limits {
        self.0.device().limits()
    }

    pub(crate) fn wgpu_device(&self) -> &wgpu::Device {
        self.0.device()
    }

    pub(crate) fn wgpu_queue(&self) -> &wgpu::Queue {
        self.0.queue()
    }

    /// Fails with [`SynchronizationError::DeviceLost`] once the backend has reported a loss.
    pub(crate) fn check_lost(&self) -> Result<(), SynchronizationError> {
        match self.0.loss() {
            Some(loss) => Err(SynchronizationError::DeviceLost {
                reason: loss.reason,
                message: loss.message,
            }),
            None => Ok(()),
        }
    }
}

impl PartialEq for BoundDevice {
    fn eq(&self, other: &Self) -> bool {
        // Two BoundDevices are equal if they reference the same underlying resources.
        self.0.ptr_eq(&other.0)
    }
}

impl Eq for BoundDevice {}
