/*! oneshot_compute drives a GPU compute pipeline through exactly one offline image-generation pass.

The crate allocates device memory for an input parameter block and an output image, binds
them to a compute pipeline, records one linear command stream, submits it once and waits on a
fence, then hands the resulting pixels back to the host.

```text
host ParameterBlock ─► staging source ─copy─► parameter buffer ─dispatch─► output image
                                                                              │ copy
host PixelBuffer ◄── map_and_consume ◄── staging destination ◄────────────────┘
```

# Layers

| Component                  | Module                       | Responsibility                                                   |
|----------------------------|------------------------------|------------------------------------------------------------------|
| Resource Allocator         | [`memory`]                   | Move-only buffers and images that free themselves exactly once   |
| Staging Transfer           | [`memory::staging`]          | Scoped host mapping; the only way to touch host-visible memory   |
| Descriptor Binder          | [`bindings`]                 | Layouts, exactly-sized pools, last-write-wins descriptor sets    |
| Command Sequencer          | [`commands`]                 | Explicit barrier state machine, one submission, one fence        |
| Pipeline Execution Engine  | [`engine`], [`pipeline`]     | Builds the pipeline and runs the whole pass top to bottom        |

Device bootstrap ([`entry_point`], [`device`]), shader loading ([`shader`]), the persisted
parameter file ([`render_data`]) and pixel writers ([`pixels`]) are collaborators around that core.

# Synchronization

Nothing here is implicitly coherent.  Every resource carries an explicit
[`commands::ResourceState`] that only the [`commands::CommandSequencer`] updates, and a command
that would read or write a resource without the barrier that makes the previous access visible
is rejected before anything is submitted.

The backend is [wgpu](https://wgpu.rs), so we inherit its broad support for Vulkan, Metal and DX12.

# Example

```no_run
use oneshot_compute::device::{BoundDevice, UnboundDevice};
use oneshot_compute::entry_point::EntryPoint;
use oneshot_compute::engine::PipelineEngine;
use oneshot_compute::render_data::RenderData;
use oneshot_compute::shader::{ShaderCode, ShaderModule};

test_executors::sleep_on(async {
    let entry_point = EntryPoint::new().await.expect("no instance");
    let unbound = UnboundDevice::pick(&entry_point).await.expect("no adapter");
    let device = BoundDevice::bind(unbound).await.expect("no device");

    let render_data = RenderData::load_or_default("render.dat").expect("unusable scene");
    let code = ShaderCode::load("shaders/raytrace.wgsl").expect("no shader");
    let shader = ShaderModule::new(&device, &code, "main").expect("bad shader");

    let pixels = PipelineEngine::new(&device)
        .run(render_data.frame, &render_data.block, &shader)
        .expect("run failed");
    pixels.write_png("output.png").expect("can't write");
});
```
*/

logwise::declare_logging_domain!();

pub mod bindings;
pub mod commands;
pub mod config;
pub mod device;
pub mod engine;
pub mod entry_point;
pub mod error;
pub mod frame;
mod imp;
pub mod memory;
pub mod pipeline;
pub mod pixels;
pub mod render_data;
pub mod shader;

pub use error::{AllocationError, ContractViolation, Error, Result, SynchronizationError};
