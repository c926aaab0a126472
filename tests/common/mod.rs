// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Shared setup for the GPU integration tests.
#![allow(dead_code)] //each test binary uses a different subset

use oneshot_compute::device::{BoundDevice, UnboundDevice};
use oneshot_compute::entry_point::EntryPoint;
use oneshot_compute::shader::{ShaderCode, ShaderModule};

pub const RAYTRACE_WGSL: &str = include_str!("../../shaders/raytrace.wgsl");

/// Writes one storage-buffer value into every pixel.
pub const STORAGE_FILL_WGSL: &str = r#"
@group(0) @binding(0) var frame: texture_storage_2d<rgba32float, write>;
@group(0) @binding(1) var<storage, read> params: array<vec4<f32>>;

@compute @workgroup_size(8, 8, 1)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let size = textureDimensions(frame);
    if (id.x >= size.x || id.y >= size.y) {
        return;
    }
    textureStore(frame, vec2<i32>(id.xy), params[arrayLength(&params) - 1u]);
}
"#;

/// Writes the first uniform value into every pixel.
pub const UNIFORM_FILL_WGSL: &str = r#"
@group(0) @binding(0) var frame: texture_storage_2d<rgba32float, write>;
@group(0) @binding(1) var<uniform> params: vec4<f32>;

@compute @workgroup_size(8, 8, 1)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let size = textureDimensions(frame);
    if (id.x >= size.x || id.y >= size.y) {
        return;
    }
    textureStore(frame, vec2<i32>(id.xy), params);
}
"#;

/// A device from the normal bootstrap, or `None` (with a log line) when the host has no adapter.
pub async fn device_or_skip(test: &str) -> Option<BoundDevice> {
    let entry_point = match EntryPoint::new().await {
        Ok(entry_point) => entry_point,
        Err(e) => {
            logwise::warn_sync!(
                "skipping {test}: no instance ({err})",
                test = test.to_string(),
                err = e.to_string()
            );
            return None;
        }
    };
    let unbound = match UnboundDevice::pick(&entry_point).await {
        Ok(unbound) => unbound,
        Err(e) => {
            logwise::warn_sync!(
                "skipping {test}: no adapter ({err})",
                test = test.to_string(),
                err = e.to_string()
            );
            return None;
        }
    };
    match BoundDevice::bind(unbound).await {
        Ok(device) => Some(device),
        Err(e) => {
            logwise::warn_sync!(
                "skipping {test}: can't open device ({err})",
                test = test.to_string(),
                err = e.to_string()
            );
            None
        }
    }
}

pub fn wgsl(device: &BoundDevice, source: &str) -> ShaderModule {
    ShaderModule::new(device, &ShaderCode::Wgsl(source.to_string()), "main")
        .expect("shader should compile")
}
