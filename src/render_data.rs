// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The scene parameter block and its on-disk form.

A [`ParameterBlock`] is the plain-old-data struct the compute shader reads from binding slot 1.
Its layout is fixed: the bytes produced by [`ParameterBlock::as_bytes`] are exactly what the
shader sees, so field order and padding here must stay in lock-step with the shader.

`render.dat` is the persisted form: a `u32` width, a `u32` height, then the block, every word
little-endian.  Every field of the block is a 4-byte word, so the conversion is word by word.
[`RenderData::load_or_default`] degrades a missing or truncated file to the built-in scene with a
warning; a complete file that describes an unusable frame or block is an error.
*/

use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::error::{ContractViolation, Error};
use crate::frame::FrameDescriptor;

/// Capacity of the sphere table.
pub const MAX_SPHERES: usize = 128;
/// Capacity of the material table.
pub const MAX_MATERIALS: usize = 128;

const KIND_MASK: u32 = 0b11;
const FUZZ_SHIFT: u32 = 2;
/// Largest value the 30 fuzz bits can hold.
const FUZZ_SCALE: u32 = (1 << 30) - 1;

/// Serialized size of [`ParameterBlock`].
pub const PARAMETER_BLOCK_SIZE: usize = std::mem::size_of::<ParameterBlock>();

const HEADER_SIZE: usize = 8;
const RENDER_DATA_SIZE: usize = HEADER_SIZE + PARAMETER_BLOCK_SIZE;

/// The surface model of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MaterialKind {
    Lambert = 0,
    Dielectric = 1,
    Metal = 2,
}

impl MaterialKind {
    fn from_bits(bits: u32) -> Option<MaterialKind> {
        match bits {
            0 => Some(MaterialKind::Lambert),
            1 => Some(MaterialKind::Dielectric),
            2 => Some(MaterialKind::Metal),
            _ => None,
        }
    }
}

/// One material table entry.
///
/// `kind_word` packs the [`MaterialKind`] into its low 2 bits and, for metals, the fuzz factor
/// into the upper 30 bits.  Dielectrics keep their refractive index in `color[0]`.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Material {
    pub color: [f32; 3],
    pub kind_word: u32,
}

impl Material {
    pub fn lambert(color: [f32; 3]) -> Material {
        Material {
            color,
            kind_word: MaterialKind::Lambert as u32,
        }
    }

    /// A metal with `fuzz` in `[0, 1]`.
    pub fn metal(color: [f32; 3], fuzz: f32) -> Result<Material, ContractViolation> {
        if !(0.0..=1.0).contains(&fuzz) {
            return Err(ContractViolation::InvalidParameterBlock(format!(
                "metal fuzz {fuzz} is outside [0, 1]"
            )));
        }
        //truncation matches the quantisation render.dat files were written with
        let fuzz_bits = (fuzz as f64 * FUZZ_SCALE as f64) as u32;
        Ok(Material {
            color,
            kind_word: (fuzz_bits << FUZZ_SHIFT) | MaterialKind::Metal as u32,
        })
    }

    pub fn dielectric(refractive_index: f32) -> Material {
        Material {
            color: [refractive_index, 0.0, 0.0],
            kind_word: MaterialKind::Dielectric as u32,
        }
    }

    /// The decoded kind, or `None` for the unused bit pattern `3`.
    pub fn kind(&self) -> Option<MaterialKind> {
        MaterialKind::from_bits(self.kind_word & KIND_MASK)
    }

    /// Metal fuzz in `[0, 1]`.  Zero for the other kinds.
    pub fn fuzz(&self) -> f32 {
        match self.kind() {
            Some(MaterialKind::Metal) => {
                ((self.kind_word >> FUZZ_SHIFT) as f64 / FUZZ_SCALE as f64) as f32
            }
            _ => 0.0,
        }
    }

    pub fn refractive_index(&self) -> Option<f32> {
        match self.kind() {
            Some(MaterialKind::Dielectric) => Some(self.color[0]),
            _ => None,
        }
    }
}

/**
The input the compute shader consumes.

Only the first `sphere_count` spheres and `material_count` materials are meaningful; the rest
of each table is zero and ignored by the shader.
*/
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ParameterBlock {
    pub materials: [Material; MAX_MATERIALS],
    pub spheres: [[f32; 4]; MAX_SPHERES],
    pub sphere_material: [i32; MAX_SPHERES],
    pub sphere_count: i32,
    pub material_count: i32,
}

impl Default for ParameterBlock {
    fn default() -> Self {
        ParameterBlock::zeroed()
    }
}

impl ParameterBlock {
    /// Two grey spheres: a metal one at the centre resting on a large lambert "ground" sphere.
    pub fn default_scene() -> ParameterBlock {
        let mut block = ParameterBlock::zeroed();
        block.materials[0] = Material::lambert([0.5, 0.5, 0.5]);
        block.materials[1] = Material {
            color: [0.5, 0.5, 0.5],
            kind_word: MaterialKind::Metal as u32,
        };
        block.material_count = 2;
        block.spheres[0] = [0.0, 0.0, -1.0, 0.5];
        block.sphere_material[0] = 1;
        block.spheres[1] = [0.0, -100.5, -1.0, 100.0];
        block.sphere_material[1] = 0;
        block.sphere_count = 2;
        block
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Reads a block from exactly [`PARAMETER_BLOCK_SIZE`] bytes.  The result is not validated.
    pub fn from_bytes(bytes: &[u8]) -> Result<ParameterBlock, ContractViolation> {
        if bytes.len() != PARAMETER_BLOCK_SIZE {
            return Err(ContractViolation::InvalidParameterBlock(format!(
                "expected {PARAMETER_BLOCK_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    pub fn validate(&self) -> Result<(), ContractViolation> {
        let invalid = |msg: String| Err(ContractViolation::InvalidParameterBlock(msg));
        if !(0..=MAX_SPHERES as i32).contains(&self.sphere_count) {
            return invalid(format!(
                "sphere_count {} is outside [0, {MAX_SPHERES}]",
                self.sphere_count
            ));
        }
        if !(0..=MAX_MATERIALS as i32).contains(&self.material_count) {
            return invalid(format!(
                "material_count {} is outside [0, {MAX_MATERIALS}]",
                self.material_count
            ));
        }
        for (index, material) in self.active_materials().iter().enumerate() {
            if material.kind().is_none() {
                return invalid(format!(
                    "material {index} has unknown kind bits {:#x}",
                    material.kind_word & KIND_MASK
                ));
            }
        }
        for (index, &material) in self.sphere_material[..self.sphere_count as usize]
            .iter()
            .enumerate()
        {
            if !(0..self.material_count).contains(&material) {
                return invalid(format!(
                    "sphere {index} references material {material} but only {} are defined",
                    self.material_count
                ));
            }
        }
        Ok(())
    }

    /// The materials below `material_count`.  Call after [`Self::validate`].
    pub fn active_materials(&self) -> &[Material] {
        &self.materials[..(self.material_count.clamp(0, MAX_MATERIALS as i32) as usize)]
    }

    /// The spheres below `sphere_count`.  Call after [`Self::validate`].
    pub fn active_spheres(&self) -> &[[f32; 4]] {
        &self.spheres[..(self.sphere_count.clamp(0, MAX_SPHERES as i32) as usize)]
    }
}

/// Index into the material table, returned by the [`SceneBuilder`] `add_*` methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialIndex(pub usize);

/// Incrementally fills a [`ParameterBlock`].
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    frame: FrameDescriptor,
    block: ParameterBlock,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        SceneBuilder::new(FrameDescriptor::default())
    }
}

impl SceneBuilder {
    pub fn new(frame: FrameDescriptor) -> SceneBuilder {
        SceneBuilder {
            frame,
            block: ParameterBlock::zeroed(),
        }
    }

    pub fn add_lambert(&mut self, color: [f32; 3]) -> Result<MaterialIndex, ContractViolation> {
        self.push_material(Material::lambert(color))
    }

    pub fn add_metal(
        &mut self,
        color: [f32; 3],
        fuzz: f32,
    ) -> Result<MaterialIndex, ContractViolation> {
        let material = Material::metal(color, fuzz)?;
        self.push_material(material)
    }

    pub fn add_dielectric(
        &mut self,
        refractive_index: f32,
    ) -> Result<MaterialIndex, ContractViolation> {
        self.push_material(Material::dielectric(refractive_index))
    }

    /// Adds a sphere `[x, y, z, radius]` using a previously added material.
    pub fn add_sphere(
        &mut self,
        sphere: [f32; 4],
        material: MaterialIndex,
    ) -> Result<(), ContractViolation> {
        let count = self.block.sphere_count as usize;
        if count >= MAX_SPHERES {
            return Err(ContractViolation::InvalidParameterBlock(format!(
                "too many spheres (limit {MAX_SPHERES})"
            )));
        }
        if material.0 >= self.block.material_count as usize {
            return Err(ContractViolation::InvalidParameterBlock(format!(
                "material index {} is not defined",
                material.0
            )));
        }
        self.block.spheres[count] = sphere;
        self.block.sphere_material[count] = material.0 as i32;
        self.block.sphere_count += 1;
        Ok(())
    }

    fn push_material(&mut self, material: Material) -> Result<MaterialIndex, ContractViolation> {
        let index = self.block.material_count as usize;
        if index >= MAX_MATERIALS {
            return Err(ContractViolation::InvalidParameterBlock(format!(
                "too many materials (limit {MAX_MATERIALS})"
            )));
        }
        self.block.materials[index] = material;
        self.block.material_count += 1;
        Ok(MaterialIndex(index))
    }

    pub fn build(self) -> RenderData {
        RenderData {
            frame: self.frame,
            block: self.block,
        }
    }
}

/// A frame size plus the block to render it with; the contents of `render.dat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderData {
    pub frame: FrameDescriptor,
    pub block: ParameterBlock,
}

impl Default for RenderData {
    fn default() -> Self {
        RenderData {
            frame: FrameDescriptor::default(),
            block: ParameterBlock::default_scene(),
        }
    }
}

impl RenderData {
    /// Decodes and validates the `render.dat` layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<RenderData, ContractViolation> {
        if bytes.len() < RENDER_DATA_SIZE {
            return Err(ContractViolation::InvalidParameterBlock(format!(
                "file holds {} bytes but {RENDER_DATA_SIZE} are required",
                bytes.len()
            )));
        }
        let width = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let height = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let frame = FrameDescriptor::new(width, height);
        frame.validate()?;
        let native = bytes[HEADER_SIZE..HEADER_SIZE + PARAMETER_BLOCK_SIZE]
            .chunks_exact(4)
            .flat_map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]).to_ne_bytes())
            .collect::<Vec<_>>();
        let block = ParameterBlock::from_bytes(&native)?;
        block.validate()?;
        Ok(RenderData { frame, block })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(RENDER_DATA_SIZE);
        bytes.extend_from_slice(&self.frame.width.to_le_bytes());
        bytes.extend_from_slice(&self.frame.height.to_le_bytes());
        bytes.extend(
            self.block
                .as_bytes()
                .chunks_exact(4)
                .flat_map(|w| u32::from_ne_bytes([w[0], w[1], w[2], w[3]]).to_le_bytes()),
        );
        bytes
    }

    pub fn load(path: impl AsRef<Path>) -> Result<RenderData, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Ok(RenderData::from_bytes(&bytes)?)
    }

    /**
    Like [`Self::load`], but a file that can't be read or is too short for a header and a block
    yields [`RenderData::default`].

    A complete file is decoded strictly: an unaligned frame or an invalid block is returned as the
    [`ContractViolation`] rather than replaced.
    */
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<RenderData, Error> {
        let path = path.as_ref();
        let fallback = |reason: String| {
            logwise::warn_sync!(
                "Can't use {path}, falling back to the default scene: {reason}",
                path = path.display().to_string(),
                reason = reason
            );
            RenderData::default()
        };
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return Ok(fallback(e.to_string())),
        };
        if bytes.len() < RENDER_DATA_SIZE {
            return Ok(fallback(format!(
                "{} bytes, {RENDER_DATA_SIZE} required",
                bytes.len()
            )));
        }
        let data = RenderData::from_bytes(&bytes)?;
        logwise::info_sync!(
            "Loaded {path} ({width}x{height}, {spheres} spheres)",
            path = path.display().to_string(),
            width = data.frame.width,
            height = data.frame.height,
            spheres = data.block.sphere_count
        );
        Ok(data)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()).map_err(|e| Error::io(path, e))
    }
}
