// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::fmt::Display;

use crate::error::NativeCode;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    NoSuchAdapter(wgpu::RequestAdapterError),
    NoComputeSupport { adapter: String },
    RequestDeviceError(#[from] wgpu::RequestDeviceError),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoSuchAdapter(e) => write!(f, "No such adapter: {}", e),
            Error::NoComputeSupport { adapter } => {
                write!(f, "Adapter {} does not support compute shaders", adapter)
            }
            Error::RequestDeviceError(e) => write!(f, "{}", e),
        }
    }
}

pub(crate) fn native_code(error: &wgpu::Error) -> NativeCode {
    match error {
        wgpu::Error::OutOfMemory { .. } => NativeCode::OutOfMemory,
        wgpu::Error::Validation { .. } => NativeCode::Validation,
        #[allow(unreachable_patterns)]
        _ => NativeCode::Internal,
    }
}

/**
Captures the errors wgpu raises while creating objects.

wgpu reports creation failures asynchronously through error scopes rather than through return
values.  An `ErrorScope` pushes an out-of-memory and a validation scope; [`ErrorScope::close`]
pops both and returns whichever error was caught, preferring out-of-memory.

The scopes are popped on drop as well, so an early return or a panic between `open` and `close`
leaves the device's scope stack balanced.
*/
#[must_use = "close the scope to observe the captured error"]
pub(crate) struct ErrorScope<'a> {
    device: &'a wgpu::Device,
    open: bool,
}

impl<'a> ErrorScope<'a> {
    pub(crate) fn open(device: &'a wgpu::Device) -> Self {
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        ErrorScope { device, open: true }
    }

    pub(crate) fn close(mut self) -> Option<wgpu::Error> {
        self.open = false;
        self.pop()
    }

    fn pop(&self) -> Option<wgpu::Error> {
        //on native, popped scopes are ready immediately
        let validation = test_executors::spin_on(self.device.pop_error_scope());
        let out_of_memory = test_executors::spin_on(self.device.pop_error_scope());
        out_of_memory.or(validation)
    }
}

impl Drop for ErrorScope<'_> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.pop();
        }
    }
}
