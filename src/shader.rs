// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Loading compute shaders.
//!
//! The shader is an opaque artifact: either a precompiled SPIR-V blob or WGSL source.  Its
//! interface is fixed by the binding layout: slot 0 is the output image, slot 1 the parameters.
use std::borrow::Cow;
use std::path::Path;

use crate::device::BoundDevice;
use crate::error::{ContractViolation, Error};
use crate::imp::ErrorScope;

const SPIRV_MAGIC: u32 = 0x0723_0203;
/// Magic, version, generator, bound, schema.
const SPIRV_HEADER_WORDS: usize = 5;

/// Entry point used when none is configured.
pub const DEFAULT_ENTRY_POINT: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderCode {
    SpirV(Vec<u32>),
    Wgsl(String),
}

impl ShaderCode {
    /// Interprets `bytes` as a SPIR-V module in either byte order.
    pub fn from_spirv_bytes(bytes: &[u8]) -> Result<ShaderCode, ContractViolation> {
        if bytes.len() % 4 != 0 {
            return Err(ContractViolation::InvalidShader(format!(
                "SPIR-V length {} is not a multiple of 4",
                bytes.len()
            )));
        }
        if bytes.len() < SPIRV_HEADER_WORDS * 4 {
            return Err(ContractViolation::InvalidShader(
                "SPIR-V blob is shorter than its header".to_string(),
            ));
        }
        let mut words = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect::<Vec<_>>();
        if words[0] == SPIRV_MAGIC.swap_bytes() {
            for word in &mut words {
                *word = word.swap_bytes();
            }
        }
        if words[0] != SPIRV_MAGIC {
            return Err(ContractViolation::InvalidShader(format!(
                "bad SPIR-V magic {:#010x}",
                words[0]
            )));
        }
        Ok(ShaderCode::SpirV(words))
    }

    /// Reads `.spv` files as SPIR-V and `.wgsl` files as WGSL.
    pub fn load(path: impl AsRef<Path>) -> Result<ShaderCode, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("spv") => Ok(ShaderCode::from_spirv_bytes(&bytes)?),
            Some("wgsl") => String::from_utf8(bytes).map(ShaderCode::Wgsl).map_err(|e| {
                ContractViolation::InvalidShader(format!("{} is not UTF-8: {e}", path.display()))
                    .into()
            }),
            _ => Err(ContractViolation::InvalidShader(format!(
                "{} is neither .spv nor .wgsl",
                path.display()
            ))
            .into()),
        }
    }

    fn source(&self) -> wgpu::ShaderSource<'_> {
        match self {
            ShaderCode::SpirV(words) => wgpu::ShaderSource::SpirV(Cow::Borrowed(words)),
            ShaderCode::Wgsl(source) => wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
        }
    }
}

/// A compiled shader module plus the entry point the pipeline will use.
#[derive(Debug, Clone)]
pub struct ShaderModule {
    module: wgpu::ShaderModule,
    entry_point: String,
}

impl ShaderModule {
    pub fn new(
        device: &BoundDevice,
        code: &ShaderCode,
        entry_point: &str,
    ) -> Result<ShaderModule, Error> {
        if entry_point.is_empty() {
            return Err(ContractViolation::InvalidShader("empty entry point".to_string()).into());
        }
        let wgpu_device = device.wgpu_device();
        let scope = ErrorScope::open(wgpu_device);
        let module = wgpu_device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(entry_point),
            source: code.source(),
        });
        if let Some(error) = scope.close() {
            return Err(ContractViolation::InvalidShader(error.to_string()).into());
        }
        Ok(ShaderModule {
            module,
            entry_point: entry_point.to_string(),
        })
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub(crate) fn wgpu_module(&self) -> &wgpu::ShaderModule {
        &self.module
    }
}
