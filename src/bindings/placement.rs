// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::bindings::ResourceKind;

/// Parameter payloads strictly smaller than this are bound as uniform buffers.
pub const UNIFORM_THRESHOLD_BYTES: u64 = 16 << 10;

/// Uniform blocks are laid out with 16-byte struct alignment.
const UNIFORM_ALIGNMENT: u64 = 16;

/**
How the parameter buffer is exposed to the shader.

The choice is made once, from the payload size, and then drives both the buffer's usage flags
at allocation and the descriptor kind in the layout, so the two cannot disagree.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterPlacement {
    Uniform,
    Storage,
}

impl ParameterPlacement {
    pub const fn for_size(size_bytes: u64) -> ParameterPlacement {
        if size_bytes < UNIFORM_THRESHOLD_BYTES {
            ParameterPlacement::Uniform
        } else {
            ParameterPlacement::Storage
        }
    }

    /// Size of the buffer that holds a `size_bytes` payload in this placement.
    ///
    /// Uniform buffers are padded to a 16-byte multiple so the binding covers the shader's
    /// view of the struct.  Storage buffers only need [`wgpu::COPY_BUFFER_ALIGNMENT`].
    pub const fn binding_size(self, size_bytes: u64) -> u64 {
        match self {
            ParameterPlacement::Uniform => size_bytes.next_multiple_of(UNIFORM_ALIGNMENT),
            ParameterPlacement::Storage => size_bytes.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
        }
    }

    pub const fn buffer_usage(self) -> wgpu::BufferUsages {
        match self {
            ParameterPlacement::Uniform => wgpu::BufferUsages::UNIFORM,
            ParameterPlacement::Storage => wgpu::BufferUsages::STORAGE,
        }
    }

    pub const fn resource_kind(self) -> ResourceKind {
        match self {
            ParameterPlacement::Uniform => ResourceKind::UniformBuffer,
            ParameterPlacement::Storage => ResourceKind::StorageBuffer,
        }
    }
}
