// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Renders `render.dat` once and writes the result as a PNG, or as Radiance HDR when the output
//! path ends in `.hdr`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example render_scene
//! ONESHOT_SCENE=scenes/glass.dat ONESHOT_OUTPUT=glass.png cargo run --example render_scene
//! ONESHOT_OUTPUT=output.hdr cargo run --example render_scene
//! ```
//!
//! A missing or truncated scene file falls back to the built-in two-sphere scene; a complete file
//! describing an unusable frame or scene is an error.  See
//! `oneshot_compute::config` for every variable.
//!
//! Passing `--write-default-scene` saves the built-in scene to the configured scene path and
//! exits, which is a convenient starting point for hand-made scenes.

use oneshot_compute::config::RunConfig;
use oneshot_compute::device::{BoundDevice, UnboundDevice};
use oneshot_compute::engine::{EngineOptions, PipelineEngine};
use oneshot_compute::entry_point::EntryPoint;
use oneshot_compute::render_data::RenderData;
use oneshot_compute::shader::{ShaderCode, ShaderModule};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = RunConfig::from_env_or_default();

    if std::env::args().any(|a| a == "--write-default-scene") {
        RenderData::default().save(&config.scene)?;
        logwise::info_sync!(
            "wrote the default scene to {path}",
            path = config.scene.display().to_string()
        );
        return Ok(());
    }

    test_executors::sleep_on(run(config))
}

async fn run(config: RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let entry_point = EntryPoint::new().await?;
    let unbound = UnboundDevice::pick(&entry_point).await?;
    let device = BoundDevice::bind(unbound).await?;

    let render_data = RenderData::load_or_default(&config.scene)?;
    let code = ShaderCode::load(&config.shader)?;
    let shader = ShaderModule::new(&device, &code, &config.entry_point)?;

    let pixels = PipelineEngine::new(&device)
        .with_options(EngineOptions {
            wait: config.wait,
            ..Default::default()
        })
        .run(render_data.frame, &render_data.block, &shader)?;
    pixels.write(&config.output)?;
    Ok(())
}
