// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
mod common;

use oneshot_compute::error::NativeCode;
use oneshot_compute::frame::FrameDescriptor;
use oneshot_compute::memory::{Allocator, MemoryVisibility, staging};
use oneshot_compute::{ContractViolation, Error};
use test_executors::async_test;

#[async_test]
async fn live_count_follows_drops() {
    let Some(device) = common::device_or_skip("live_count_follows_drops").await else {
        return;
    };
    let mut allocator = Allocator::new(&device);
    assert_eq!(allocator.live_allocations(), 0);
    let a = allocator
        .create_buffer(256, wgpu::BufferUsages::STORAGE, MemoryVisibility::DeviceLocal)
        .unwrap();
    let image = allocator
        .output_image(FrameDescriptor::new(16, 16))
        .unwrap();
    assert_eq!(allocator.live_allocations(), 2);
    assert_eq!(a.size(), 256);
    assert_eq!(image.extent(), (16, 16));
    assert_ne!(a.id(), image.id());
    drop(a);
    assert_eq!(allocator.live_allocations(), 1);
    drop(image);
    assert_eq!(allocator.live_allocations(), 0);
}

#[async_test]
async fn take_leaves_an_empty_handle() {
    let Some(device) = common::device_or_skip("take_leaves_an_empty_handle").await else {
        return;
    };
    let mut allocator = Allocator::new(&device);
    let mut original = allocator.staging_destination(64).unwrap();
    let id = original.id();
    let moved = original.take();
    assert!(original.is_empty());
    assert_eq!(original.size(), 0);
    assert_eq!(moved.id(), id);
    drop(original);
    assert_eq!(allocator.live_allocations(), 1);
    drop(moved);
    assert_eq!(allocator.live_allocations(), 0);

    let mut image = allocator.output_image(FrameDescriptor::new(8, 8)).unwrap();
    let moved_image = image.take();
    assert!(image.is_empty());
    drop(image);
    assert_eq!(allocator.live_allocations(), 1);
    drop(moved_image);
    assert_eq!(allocator.live_allocations(), 0);
}

#[async_test]
async fn zero_sized_requests_rejected() {
    let Some(device) = common::device_or_skip("zero_sized_requests_rejected").await else {
        return;
    };
    let mut allocator = Allocator::new(&device);
    assert!(matches!(
        allocator.create_buffer(0, wgpu::BufferUsages::STORAGE, MemoryVisibility::DeviceLocal),
        Err(Error::Contract(ContractViolation::ZeroSized { .. }))
    ));
    assert!(matches!(
        allocator.create_image(0, 8, wgpu::TextureFormat::Rgba32Float, wgpu::TextureUsages::COPY_SRC),
        Err(Error::Contract(ContractViolation::ZeroSized { .. }))
    ));
    assert_eq!(allocator.live_allocations(), 0);
}

#[async_test]
async fn native_rejection_is_an_allocation_error() {
    let Some(device) = common::device_or_skip("native_rejection_is_an_allocation_error").await
    else {
        return;
    };
    let mut allocator = Allocator::new(&device);
    //host-readable memory can only be a copy destination
    match allocator.create_buffer(64, wgpu::BufferUsages::STORAGE, MemoryVisibility::HostRead) {
        Err(Error::Allocation(e)) => assert_eq!(e.code, NativeCode::Validation),
        other => panic!("expected an allocation error, got {other:?}"),
    }
    let too_wide = device.limits().max_texture_dimension_2d + 1;
    assert!(matches!(
        allocator.create_image(
            too_wide,
            8,
            wgpu::TextureFormat::Rgba32Float,
            wgpu::TextureUsages::STORAGE_BINDING
        ),
        Err(Error::Allocation(_))
    ));
    assert_eq!(allocator.live_allocations(), 0);
}

#[async_test]
async fn handles_may_outlive_the_allocator() {
    let Some(device) = common::device_or_skip("handles_may_outlive_the_allocator").await else {
        return;
    };
    let mut allocator = Allocator::new(&device);
    let buffer = allocator.staging_source(&[1, 2, 3, 4]).unwrap();
    drop(allocator);
    assert!(!buffer.is_empty());
    drop(buffer);
}

#[async_test]
async fn mapping_requires_host_visibility() {
    let Some(device) = common::device_or_skip("mapping_requires_host_visibility").await else {
        return;
    };
    let mut allocator = Allocator::new(&device);
    let device_local = allocator
        .create_buffer(64, wgpu::BufferUsages::COPY_DST, MemoryVisibility::DeviceLocal)
        .unwrap();
    assert!(matches!(
        staging::map_and_consume(&device, &device_local, |_| ()),
        Err(Error::Contract(ContractViolation::NotHostVisible { .. }))
    ));
    let readback = allocator.staging_destination(64).unwrap();
    assert!(matches!(
        staging::map_and_fill(&device, &readback, |_| ()),
        Err(Error::Contract(ContractViolation::NotHostVisible { .. }))
    ));
}

#[async_test]
async fn staging_source_holds_its_bytes() {
    let Some(device) = common::device_or_skip("staging_source_holds_its_bytes").await else {
        return;
    };
    let mut allocator = Allocator::new(&device);
    let source = allocator.staging_source(&[9, 8, 7, 6, 5]).unwrap();
    //padded to the copy alignment
    assert_eq!(source.size(), 8);
    staging::map_and_fill(&device, &source, |bytes| {
        assert_eq!(&bytes[..5], &[9, 8, 7, 6, 5]);
        bytes[0] = 1;
    })
    .unwrap();
}

#[async_test]
async fn mapping_is_released_after_a_panic() {
    let Some(device) = common::device_or_skip("mapping_is_released_after_a_panic").await else {
        return;
    };
    let mut allocator = Allocator::new(&device);
    let readback = allocator.staging_destination(64).unwrap();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        staging::map_and_consume(&device, &readback, |_| panic!("reader failed"))
    }));
    assert!(result.is_err());
    //the guard unmapped the buffer, so it can be mapped again
    let sum = staging::map_and_consume(&device, &readback, |bytes| {
        bytes.iter().map(|b| *b as u32).sum::<u32>()
    })
    .unwrap();
    assert_eq!(sum, 0);
}
