// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Scoped host access to host-visible buffers.

The mapping exists only for the duration of the closure.  It is released on every exit path,
including a panic unwinding out of the closure, so a buffer is never left mapped when it is
next used by the device.
*/

use crate::device::BoundDevice;
use crate::error::{ContractViolation, Error, SynchronizationError};
use crate::memory::buffer::{Buffer, MemoryVisibility};

/// Unmaps the buffer when dropped.
struct MapGuard<'a>(&'a wgpu::Buffer);

impl Drop for MapGuard<'_> {
    fn drop(&mut self) {
        self.0.unmap();
    }
}

fn map<'a>(
    device: &BoundDevice,
    buffer: &'a Buffer,
    required: MemoryVisibility,
    mode: wgpu::MapMode,
) -> Result<MapGuard<'a>, Error> {
    let inner = buffer.inner()?;
    if inner.visibility != required {
        return Err(ContractViolation::NotHostVisible {
            resource: inner.label.clone(),
        }
        .into());
    }
    device.check_lost()?;
    let (s, r) = r#continue::continuation();
    inner.buffer.slice(..).map_async(mode, move |result| {
        s.send(result);
    });
    device
        .wgpu_device()
        .poll(wgpu::PollType::Wait)
        .map_err(|e| SynchronizationError::WaitFailed(e.to_string()))?;
    //the poll above has run the callback
    let result = test_executors::spin_on(r);
    result.map_err(|e| SynchronizationError::MapFailed {
        resource: inner.label.clone(),
        detail: e.to_string(),
    })?;
    Ok(MapGuard(&inner.buffer))
}

/// Maps a [`MemoryVisibility::HostRead`] buffer and hands its bytes to `consume`.
pub fn map_and_consume<R>(
    device: &BoundDevice,
    buffer: &Buffer,
    consume: impl FnOnce(&[u8]) -> R,
) -> Result<R, Error> {
    let perf = logwise::perfwarn_begin!("map_and_consume");
    let guard = map(device, buffer, MemoryVisibility::HostRead, wgpu::MapMode::Read)?;
    let view = guard.0.slice(..).get_mapped_range();
    let result = consume(&view);
    drop(view);
    drop(guard);
    drop(perf);
    Ok(result)
}

/// Maps a [`MemoryVisibility::HostWrite`] buffer and lets `fill` write into it.
pub fn map_and_fill<R>(
    device: &BoundDevice,
    buffer: &Buffer,
    fill: impl FnOnce(&mut [u8]) -> R,
) -> Result<R, Error> {
    let guard = map(device, buffer, MemoryVisibility::HostWrite, wgpu::MapMode::Write)?;
    let mut view = guard.0.slice(..).get_mapped_range_mut();
    let result = fill(&mut view);
    drop(view);
    drop(guard);
    Ok(result)
}
