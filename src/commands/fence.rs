// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::device::BoundDevice;
use crate::error::SynchronizationError;

/// How long [`Fence::wait`] may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Block until the work completes or the device reports a failure.
    #[default]
    Unbounded,
    /// Give up with [`SynchronizationError::Timeout`] after the duration.
    ///
    /// The flag is checked before every poll, so `Bounded(Duration::ZERO)` only succeeds when the
    /// work has already been observed complete.
    Bounded(Duration),
}

/**
Signals once when a submission's work has completed.

The fence is created unsignaled at submission, signaled by the queue's work-done callback and
consumed by [`Fence::wait`].
*/
#[derive(Debug)]
pub struct Fence {
    signaled: Arc<AtomicBool>,
    submission: wgpu::SubmissionIndex,
}

impl Fence {
    /// Submits `commands` and returns the fence for them.
    pub(crate) fn submit(device: &BoundDevice, commands: wgpu::CommandBuffer) -> Fence {
        let queue = device.wgpu_queue();
        let submission = queue.submit(std::iter::once(commands));
        let signaled = Arc::new(AtomicBool::new(false));
        let move_signaled = signaled.clone();
        queue.on_submitted_work_done(move || {
            move_signaled.store(true, Ordering::Release);
        });
        Fence {
            signaled,
            submission,
        }
    }

    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }

    /// Blocks according to `policy` and returns how long the wait took.
    pub fn wait(
        self,
        device: &BoundDevice,
        policy: WaitPolicy,
    ) -> Result<Duration, SynchronizationError> {
        let started = Instant::now();
        device.check_lost()?;
        match policy {
            WaitPolicy::Unbounded => {
                device
                    .wgpu_device()
                    .poll(wgpu::PollType::WaitForSubmissionIndex(
                        self.submission.clone(),
                    ))
                    .map_err(|e| SynchronizationError::WaitFailed(e.to_string()))?;
                device.check_lost()?;
                if !self.is_signaled() {
                    //callbacks registered after the submission fire on the next poll
                    device
                        .wgpu_device()
                        .poll(wgpu::PollType::Poll)
                        .map_err(|e| SynchronizationError::WaitFailed(e.to_string()))?;
                }
                if !self.is_signaled() {
                    return Err(SynchronizationError::WaitFailed(
                        "queue drained but the fence was not signaled".to_string(),
                    ));
                }
            }
            WaitPolicy::Bounded(limit) => loop {
                if self.is_signaled() {
                    break;
                }
                device.check_lost()?;
                let waited = started.elapsed();
                if waited >= limit {
                    logwise::error_sync!(
                        "fence not signaled after {waited}",
                        waited = logwise::privacy::LogIt(&waited)
                    );
                    return Err(SynchronizationError::Timeout { waited });
                }
                device
                    .wgpu_device()
                    .poll(wgpu::PollType::Poll)
                    .map_err(|e| SynchronizationError::WaitFailed(e.to_string()))?;
                if !self.is_signaled() {
                    std::thread::sleep(Duration::from_millis(1));
                }
            },
        }
        Ok(started.elapsed())
    }
}
