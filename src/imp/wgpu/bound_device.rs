// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::Error;
use crate::imp::wgpu::UnboundDevice;
use std::sync::{Arc, Mutex};

/// Why the device went away, as reported by the backend.
#[derive(Debug, Clone)]
pub(crate) struct DeviceLoss {
    pub(crate) reason: String,
    pub(crate) message: String,
}

/// Internal resource management for BoundDevice
/// This type owns the actual GPU resources
#[derive(Debug)]
struct BoundDeviceResources {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter: wgpu::Adapter,
    lost: Arc<Mutex<Option<DeviceLoss>>>,
}

/// Bound device that can be cloned cheaply.
/// Multiple instances share the same underlying GPU resources
#[derive(Debug, Clone)]
pub struct BoundDevice {
    resources: Arc<BoundDeviceResources>,
}

impl BoundDevice {
    pub(crate) async fn bind(unbound_device: UnboundDevice) -> Result<Self, Error> {
        let adapter = unbound_device.adapter;
        //downlevel defaults are enough for one storage texture and one parameter block,
        //but take the adapter's texture dimensions so large frames still fit
        let limits = wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits());
        let descriptor = wgpu::DeviceDescriptor {
            label: wgpu::Label::from("oneshot_compute device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            ..Default::default()
        };
        let (device, queue) = adapter.request_device(&descriptor).await?;

        let lost = Arc::new(Mutex::new(None));
        let move_lost = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            logwise::error_sync!(
                "device lost: {reason} {message}",
                reason = logwise::privacy::LogIt(&reason),
                message = message.clone()
            );
            if let Ok(mut slot) = move_lost.lock() {
                *slot = Some(DeviceLoss {
                    reason: format!("{:?}", reason),
                    message,
                });
            }
        });
        //creation paths capture their own errors with ErrorScope; anything that slips through
        //is logged rather than aborting the process
        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            logwise::error_sync!(
                "uncaptured wgpu error: {error}",
                error = logwise::privacy::LogIt(&error)
            );
        }));

        Ok(BoundDevice {
            resources: Arc::new(BoundDeviceResources {
                device,
                queue,
                adapter,
                lost,
            }),
        })
    }

    /// Access to the wgpu device
    pub(crate) fn device(&self) -> &wgpu::Device {
        &self.resources.device
    }

    /// Access to the wgpu queue
    pub(crate) fn queue(&self) -> &wgpu::Queue {
        &self.resources.queue
    }

    /// Access to the wgpu adapter
    pub(crate) fn adapter(&self) -> &wgpu::Adapter {
        &self.resources.adapter
    }

    /// The loss reported by the backend, if the device has been lost.
    pub(crate) fn loss(&self) -> Option<DeviceLoss> {
        self.resources
            .lost
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
    }

    pub(crate) fn ptr_eq(&self, other: &BoundDevice) -> bool {
        Arc::ptr_eq(&self.resources, &other.resources)
    }
}
