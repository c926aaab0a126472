// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! `render.dat` handling; no GPU needed.

use std::path::PathBuf;

use oneshot_compute::{ContractViolation, Error};
use oneshot_compute::frame::FrameDescriptor;
use oneshot_compute::render_data::{RenderData, SceneBuilder};

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("oneshot_{}_{name}", std::process::id()))
}

fn glass_scene() -> RenderData {
    let mut builder = SceneBuilder::new(FrameDescriptor::new(320, 240));
    let ground = builder.add_lambert([0.8, 0.8, 0.0]).unwrap();
    let glass = builder.add_dielectric(1.5).unwrap();
    let gold = builder.add_metal([0.8, 0.6, 0.2], 0.3).unwrap();
    builder.add_sphere([0.0, -100.5, -1.0, 100.0], ground).unwrap();
    builder.add_sphere([-1.0, 0.0, -1.0, 0.5], glass).unwrap();
    builder.add_sphere([1.0, 0.0, -1.0, 0.5], gold).unwrap();
    builder.build()
}

#[test]
fn saved_scene_loads_back() {
    let path = scratch("roundtrip.dat");
    let scene = glass_scene();
    scene.save(&path).unwrap();
    let loaded = RenderData::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, scene);
    assert_eq!(loaded.block.active_spheres().len(), 3);
}

#[test]
fn missing_file_falls_back() {
    let path = scratch("missing.dat");
    assert!(matches!(RenderData::load(&path), Err(Error::Io { .. })));
    assert_eq!(RenderData::load_or_default(&path).unwrap(), RenderData::default());
}

#[test]
fn truncated_file_falls_back() {
    let path = scratch("truncated.dat");
    let bytes = glass_scene().to_bytes();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    let loaded = RenderData::load_or_default(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, RenderData::default());
}

#[test]
fn unaligned_frame_in_file_rejected() {
    let path = scratch("unaligned.dat");
    let mut builder = SceneBuilder::new(FrameDescriptor::new(641, 360));
    let ground = builder.add_lambert([0.5; 3]).unwrap();
    for i in 0..5 {
        builder
            .add_sphere([i as f32, 0.0, -1.0, 0.5], ground)
            .unwrap();
    }
    builder.build().save(&path).unwrap();
    let loaded = RenderData::load_or_default(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(
        loaded,
        Err(Error::Contract(ContractViolation::FrameNotTileAligned {
            width: 641,
            height: 360,
            ..
        }))
    ));
}

#[test]
fn invalid_block_in_file_rejected() {
    let path = scratch("invalid_block.dat");
    let mut scene = glass_scene();
    scene.block.sphere_material[0] = 9;
    scene.save(&path).unwrap();
    let loaded = RenderData::load_or_default(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(
        loaded,
        Err(Error::Contract(ContractViolation::InvalidParameterBlock(_)))
    ));
}

#[test]
fn words_are_little_endian() {
    let scene = glass_scene();
    let bytes = scene.to_bytes();
    assert_eq!(&bytes[..4], &320u32.to_le_bytes());
    let count_offset = bytes.len() - 8;
    assert_eq!(&bytes[count_offset..count_offset + 4], &3i32.to_le_bytes());
    assert_eq!(&bytes[bytes.len() - 4..], &3i32.to_le_bytes());
}
