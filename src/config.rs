// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Run configuration for the process entry.
//!
//! Values come from the environment, falling back to defaults, in the same spirit as wgpu's
//! `InstanceDescriptor::from_env_or_default` (whose `WGPU_*` variables still pick the backend).
//!
//! | Variable                   | Default                 |
//! |----------------------------|-------------------------|
//! | `ONESHOT_SCENE`            | `render.dat`            |
//! | `ONESHOT_SHADER`           | `shaders/raytrace.wgsl` |
//! | `ONESHOT_ENTRY_POINT`      | `main`                  |
//! | `ONESHOT_OUTPUT`           | `output.png` (`.hdr` writes Radiance HDR) |
//! | `ONESHOT_WAIT_TIMEOUT_MS`  | unset (wait forever)    |
use std::path::PathBuf;
use std::time::Duration;

use crate::commands::WaitPolicy;
use crate::shader::DEFAULT_ENTRY_POINT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub scene: PathBuf,
    pub shader: PathBuf,
    pub entry_point: String,
    pub output: PathBuf,
    pub wait: WaitPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            scene: PathBuf::from("render.dat"),
            shader: PathBuf::from("shaders/raytrace.wgsl"),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            output: PathBuf::from("output.png"),
            wait: WaitPolicy::Unbounded,
        }
    }
}

impl RunConfig {
    pub fn from_env_or_default() -> RunConfig {
        RunConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or unparsable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RunConfig {
        let mut config = RunConfig::default();
        if let Some(scene) = lookup("ONESHOT_SCENE") {
            config.scene = PathBuf::from(scene);
        }
        if let Some(shader) = lookup("ONESHOT_SHADER") {
            config.shader = PathBuf::from(shader);
        }
        if let Some(entry_point) = lookup("ONESHOT_ENTRY_POINT").filter(|e| !e.is_empty()) {
            config.entry_point = entry_point;
        }
        if let Some(output) = lookup("ONESHOT_OUTPUT") {
            config.output = PathBuf::from(output);
        }
        if let Some(timeout) = lookup("ONESHOT_WAIT_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => config.wait = WaitPolicy::Bounded(Duration::from_millis(ms)),
                Err(_) => logwise::warn_sync!(
                    "ignoring ONESHOT_WAIT_TIMEOUT_MS={value}, not a number of milliseconds",
                    value = timeout.clone()
                ),
            }
        }
        config
    }
}
