// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
mod common;

use oneshot_compute::bindings::{
    BindResource, BindingSpec, DescriptorPool, Layout, OUTPUT_IMAGE_SLOT, PARAMETER_SLOT,
    ParameterPlacement, ResourceKind,
};
use oneshot_compute::commands::{Access, CommandSequencer, ImageLayout};
use oneshot_compute::device::BoundDevice;
use oneshot_compute::error::NativeCode;
use oneshot_compute::frame::FrameDescriptor;
use oneshot_compute::memory::{Allocator, Buffer, Image};
use oneshot_compute::pipeline::ComputePipeline;
use oneshot_compute::render_data::PARAMETER_BLOCK_SIZE;
use oneshot_compute::{ContractViolation, Error};
use test_executors::async_test;

const FRAME: FrameDescriptor = FrameDescriptor::new(16, 16);

struct Fixture {
    allocator: Allocator,
    layout: Layout,
    pipeline: ComputePipeline,
}

impl Fixture {
    fn new(device: &BoundDevice) -> Fixture {
        let layout = Layout::build(
            device,
            &BindingSpec::output_and_parameters(ParameterPlacement::Uniform),
        )
        .unwrap();
        let shader = common::wgsl(device, common::RAYTRACE_WGSL);
        let pipeline = ComputePipeline::build(device, &shader, &layout).unwrap();
        Fixture {
            allocator: Allocator::new(device),
            layout,
            pipeline,
        }
    }

    fn parameters(&mut self) -> Buffer {
        self.allocator
            .parameter_buffer(ParameterPlacement::Uniform, PARAMETER_BLOCK_SIZE as u64)
            .unwrap()
    }

    fn image(&mut self) -> Image {
        self.allocator.output_image(FRAME).unwrap()
    }
}

#[async_test]
async fn last_bind_wins() {
    let Some(device) = common::device_or_skip("last_bind_wins").await else {
        return;
    };
    let mut fixture = Fixture::new(&device);
    let first = fixture.parameters();
    let second = fixture.parameters();
    let mut pool = DescriptorPool::for_layout(&fixture.layout);
    let mut set = pool.allocate_set(&fixture.layout).unwrap();
    set.bind(PARAMETER_SLOT, BindResource::UniformBuffer(&first))
        .unwrap();
    set.bind(PARAMETER_SLOT, BindResource::UniformBuffer(&second))
        .unwrap();
    let state = set.binding_state();
    assert_eq!(state.len(), 1);
    assert_eq!(state[0].slot, PARAMETER_SLOT);
    assert_eq!(state[0].kind, ResourceKind::UniformBuffer);
    assert_eq!(Some(state[0].resource), second.id());
}

#[async_test]
async fn pool_is_sized_for_one_set() {
    let Some(device) = common::device_or_skip("pool_is_sized_for_one_set").await else {
        return;
    };
    let fixture = Fixture::new(&device);
    let mut pool = DescriptorPool::for_layout(&fixture.layout);
    assert_eq!(pool.capacity_of(ResourceKind::StorageImage), 1);
    assert_eq!(pool.capacity_of(ResourceKind::UniformBuffer), 1);
    assert_eq!(pool.capacity_of(ResourceKind::StorageBuffer), 0);
    let _set = pool.allocate_set(&fixture.layout).unwrap();
    assert_eq!(pool.remaining_sets(), 0);
    let exhausted = pool.allocate_set(&fixture.layout).unwrap_err();
    assert_eq!(exhausted.code, NativeCode::OutOfPoolMemory);

    let other = Layout::build(
        &device,
        &BindingSpec::output_and_parameters(ParameterPlacement::Storage),
    )
    .unwrap();
    let mut fresh = DescriptorPool::for_layout(&fixture.layout);
    assert_eq!(
        fresh.allocate_set(&other).unwrap_err().code,
        NativeCode::OutOfPoolMemory
    );
}

#[async_test]
async fn duplicate_slots_rejected() {
    let Some(device) = common::device_or_skip("duplicate_slots_rejected").await else {
        return;
    };
    let specs = [
        BindingSpec::compute(0, ResourceKind::StorageImage),
        BindingSpec::compute(0, ResourceKind::UniformBuffer),
    ];
    assert!(matches!(
        Layout::build(&device, &specs),
        Err(Error::Contract(ContractViolation::DuplicateSlot { slot: 0 }))
    ));
}

#[async_test]
async fn kind_mismatch_detected_at_dispatch() {
    let Some(device) = common::device_or_skip("kind_mismatch_detected_at_dispatch").await else {
        return;
    };
    let mut fixture = Fixture::new(&device);
    let image = fixture.image();
    let parameters = fixture.parameters();
    let mut pool = DescriptorPool::for_layout(&fixture.layout);
    let mut set = pool.allocate_set(&fixture.layout).unwrap();
    set.bind(OUTPUT_IMAGE_SLOT, BindResource::StorageImage(&image))
        .unwrap();
    //accepted at bind time
    set.bind(PARAMETER_SLOT, BindResource::StorageBuffer(&parameters))
        .unwrap();

    let mut sequencer = CommandSequencer::new(&device);
    sequencer.begin().unwrap();
    assert_eq!(
        sequencer.dispatch(&fixture.pipeline, &mut set, FRAME.dispatch_grid()),
        Err(ContractViolation::DescriptorKindMismatch {
            slot: PARAMETER_SLOT,
            declared: ResourceKind::UniformBuffer,
            bound: ResourceKind::StorageBuffer,
        })
    );
    assert!(!set.is_sealed());
}

#[async_test]
async fn unbound_and_undeclared_slots_rejected() {
    let Some(device) = common::device_or_skip("unbound_and_undeclared_slots_rejected").await
    else {
        return;
    };
    let mut fixture = Fixture::new(&device);
    let image = fixture.image();
    let parameters = fixture.parameters();
    let mut pool = DescriptorPool::for_layout(&fixture.layout);
    let mut set = pool.allocate_set(&fixture.layout).unwrap();
    set.bind(OUTPUT_IMAGE_SLOT, BindResource::StorageImage(&image))
        .unwrap();
    let mut sequencer = CommandSequencer::new(&device);
    sequencer.begin().unwrap();
    assert_eq!(
        sequencer.dispatch(&fixture.pipeline, &mut set, FRAME.dispatch_grid()),
        Err(ContractViolation::UnboundSlot {
            slot: PARAMETER_SLOT
        })
    );
    set.bind(PARAMETER_SLOT, BindResource::UniformBuffer(&parameters))
        .unwrap();
    set.bind(5, BindResource::UniformBuffer(&parameters))
        .unwrap();
    assert_eq!(
        sequencer.dispatch(&fixture.pipeline, &mut set, FRAME.dispatch_grid()),
        Err(ContractViolation::UndeclaredSlot { slot: 5 })
    );
}

#[async_test]
async fn dispatch_before_barriers_rejected() {
    let Some(device) = common::device_or_skip("dispatch_before_barriers_rejected").await else {
        return;
    };
    let mut fixture = Fixture::new(&device);
    let image = fixture.image();
    let parameters = fixture.parameters();
    let source = fixture.allocator.staging_source(&[0u8; PARAMETER_BLOCK_SIZE]).unwrap();
    let mut pool = DescriptorPool::for_layout(&fixture.layout);
    let mut set = pool.allocate_set(&fixture.layout).unwrap();
    set.bind(OUTPUT_IMAGE_SLOT, BindResource::StorageImage(&image))
        .unwrap();
    set.bind(PARAMETER_SLOT, BindResource::UniformBuffer(&parameters))
        .unwrap();

    let mut sequencer = CommandSequencer::new(&device);
    sequencer.begin().unwrap();
    sequencer
        .copy_buffer(&source, &parameters, source.size())
        .unwrap();
    //image still undefined
    assert!(matches!(
        sequencer.dispatch(&fixture.pipeline, &mut set, FRAME.dispatch_grid()),
        Err(ContractViolation::WrongLayout {
            required: ImageLayout::General,
            actual: ImageLayout::Undefined,
            ..
        })
    ));
    assert!(!set.is_sealed());
    sequencer
        .image_barrier(
            &image,
            Access::None,
            Access::ShaderWrite,
            ImageLayout::Undefined,
            ImageLayout::General,
        )
        .unwrap();
    //the upload is not yet visible to the shader
    assert!(matches!(
        sequencer.dispatch(&fixture.pipeline, &mut set, FRAME.dispatch_grid()),
        Err(ContractViolation::MissingBarrier {
            previous: Access::TransferWrite,
            next: Access::ShaderRead,
            ..
        })
    ));
    sequencer
        .buffer_barrier(&parameters, Access::TransferWrite, Access::ShaderRead)
        .unwrap();
    sequencer
        .dispatch(&fixture.pipeline, &mut set, FRAME.dispatch_grid())
        .unwrap();
    assert!(set.is_sealed());
    assert_eq!(
        set.bind(PARAMETER_SLOT, BindResource::UniformBuffer(&parameters)),
        Err(ContractViolation::SetSealed)
    );
    //the image was written; copying it out needs a barrier and a layout change
    let readback = fixture
        .allocator
        .staging_destination(FRAME.readback_size())
        .unwrap();
    assert!(matches!(
        sequencer.copy_image_to_buffer(&image, &readback),
        Err(ContractViolation::WrongLayout {
            required: ImageLayout::TransferSrcOptimal,
            actual: ImageLayout::General,
            ..
        })
    ));
}

#[async_test]
async fn sets_only_work_with_their_layout() {
    let Some(device) = common::device_or_skip("sets_only_work_with_their_layout").await else {
        return;
    };
    let fixture = Fixture::new(&device);
    let other = Layout::build(
        &device,
        &BindingSpec::output_and_parameters(ParameterPlacement::Uniform),
    )
    .unwrap();
    let mut pool = DescriptorPool::for_layout(&other);
    let mut set = pool.allocate_set(&other).unwrap();
    let mut sequencer = CommandSequencer::new(&device);
    sequencer.begin().unwrap();
    assert_eq!(
        sequencer.dispatch(&fixture.pipeline, &mut set, FRAME.dispatch_grid()),
        Err(ContractViolation::LayoutMismatch)
    );
}
