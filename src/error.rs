// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Error taxonomy for a run.
//!
//! Every error in this module is fatal for the run that produced it.  There is no retry and no
//! partial-result salvage: the command stream is atomic and one-shot, so the process layer is
//! expected to report the error and exit.
//!
//! * [`AllocationError`] - device memory or handle creation failed.
//! * [`SynchronizationError`] - the fence wait or a buffer mapping failed, or the device was lost.
//! * [`ContractViolation`] - the caller (or a shader) broke a precondition.  These are detected
//!   before submission wherever that is feasible.
//!
//! Out-of-range pixel values are deliberately absent; see [`crate::pixels::PixelReport`].

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use crate::bindings::ResourceKind;
use crate::commands::{Access, ImageLayout, SequencerState};

/// The backend result class carried by an [`AllocationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCode {
    /// The device ran out of memory.
    OutOfMemory,
    /// The backend rejected the request, e.g. an invalid usage/visibility combination.
    Validation,
    /// The backend failed for a reason it did not classify.
    Internal,
    /// A descriptor pool had no room left for the requested set.
    OutOfPoolMemory,
}

impl Display for NativeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeCode::OutOfMemory => write!(f, "out of device memory"),
            NativeCode::Validation => write!(f, "rejected by validation"),
            NativeCode::Internal => write!(f, "internal backend error"),
            NativeCode::OutOfPoolMemory => write!(f, "out of pool memory"),
        }
    }
}

/// A buffer, image or descriptor set could not be created.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unable to create {resource} ({code}): {detail}")]
pub struct AllocationError {
    /// Debug label of the resource being created.
    pub resource: String,
    /// Backend result class.
    pub code: NativeCode,
    /// Backend-provided description.
    pub detail: String,
}

impl AllocationError {
    pub(crate) fn from_wgpu(resource: &str, error: &wgpu::Error) -> Self {
        AllocationError {
            resource: resource.to_string(),
            code: crate::imp::native_code(error),
            detail: error.to_string(),
        }
    }
}

/// Waiting for GPU work, or mapping its results, failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynchronizationError {
    #[error("device lost ({reason}): {message}")]
    DeviceLost { reason: String, message: String },
    #[error("unable to wait for fence: {0}")]
    WaitFailed(String),
    #[error("fence was not signaled within {waited:?}")]
    Timeout { waited: Duration },
    #[error("unable to map {resource}: {detail}")]
    MapFailed { resource: String, detail: String },
}

/// A precondition of the pipeline was broken.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractViolation {
    #[error("frame {width}x{height} is empty")]
    EmptyFrame { width: u32, height: u32 },
    #[error("frame {width}x{height} is not a multiple of the {tile}x{tile} tile size")]
    FrameNotTileAligned { width: u32, height: u32, tile: u32 },
    #[error("{resource} must not be zero-sized")]
    ZeroSized { resource: String },
    #[error("invalid parameter block: {0}")]
    InvalidParameterBlock(String),
    #[error("{resource} holds {actual} bytes but {required} are required")]
    BufferTooSmall {
        resource: String,
        required: u64,
        actual: u64,
    },
    #[error("{resource} is not host-visible for this access")]
    NotHostVisible { resource: String },
    #[error("{resource} is an empty handle")]
    EmptyHandle { resource: String },
    #[error("slot {slot} is declared more than once")]
    DuplicateSlot { slot: u32 },
    #[error("slot {slot} is declared as {declared:?} but {bound:?} is bound")]
    DescriptorKindMismatch {
        slot: u32,
        declared: ResourceKind,
        bound: ResourceKind,
    },
    #[error("slot {slot} is declared but nothing is bound")]
    UnboundSlot { slot: u32 },
    #[error("slot {slot} is bound but not declared by the layout")]
    UndeclaredSlot { slot: u32 },
    #[error("descriptor set is sealed; bindings are immutable after first use")]
    SetSealed,
    #[error("descriptor set and pipeline were built from different layouts")]
    LayoutMismatch,
    #[error("pipeline rejected: {0}")]
    PipelineRejected(String),
    #[error("invalid shader: {0}")]
    InvalidShader(String),
    #[error("{operation} is not allowed while the sequencer is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SequencerState,
    },
    #[error("{resource}: {next:?} follows {previous:?} without a barrier")]
    MissingBarrier {
        resource: String,
        previous: Access,
        next: Access,
    },
    #[error("{resource}: barrier source {declared:?} does not match tracked access {tracked:?}")]
    BarrierMismatch {
        resource: String,
        tracked: Access,
        declared: Access,
    },
    #[error("{resource}: requires layout {required:?} but is in {actual:?}")]
    WrongLayout {
        resource: String,
        required: ImageLayout,
        actual: ImageLayout,
    },
    #[error("command stream failed validation: {0}")]
    RecordingRejected(String),
}

/// Crate-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Synchronization(#[from] SynchronizationError),
    #[error(transparent)]
    Contract(#[from] ContractViolation),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to encode png: {0}")]
    Png(#[from] png::EncodingError),
    #[error("unable to encode hdr: {0}")]
    Hdr(#[from] image::ImageError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
