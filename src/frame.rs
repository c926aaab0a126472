// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Output raster dimensions and the dispatch grid derived from them.

use crate::error::ContractViolation;

/// Workgroup edge length the compute dispatch is sized against (8×8 invocations).
pub const TILE_SIZE: u32 = 8;

/// Bytes per texel of the output image (4 × f32).
pub const BYTES_PER_PIXEL: u32 = 16;

/// Width and height of the output image.
///
/// A valid frame is non-empty and both edges are multiples of [`TILE_SIZE`], so the dispatch
/// grid covers every pixel exactly.  Dimensions that do not divide evenly are rejected instead
/// of clamped: a clamped grid would silently leave rows and columns unwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameDescriptor {
    pub width: u32,
    pub height: u32,
}

impl Default for FrameDescriptor {
    fn default() -> Self {
        FrameDescriptor {
            width: 640,
            height: 360,
        }
    }
}

impl FrameDescriptor {
    pub const fn new(width: u32, height: u32) -> Self {
        FrameDescriptor { width, height }
    }

    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.width == 0 || self.height == 0 {
            return Err(ContractViolation::EmptyFrame {
                width: self.width,
                height: self.height,
            });
        }
        if self.width % TILE_SIZE != 0 || self.height % TILE_SIZE != 0 {
            return Err(ContractViolation::FrameNotTileAligned {
                width: self.width,
                height: self.height,
                tile: TILE_SIZE,
            });
        }
        Ok(())
    }

    /// Workgroup counts `(ceil(w/8), ceil(h/8), 1)`.
    pub const fn dispatch_grid(&self) -> DispatchGrid {
        DispatchGrid {
            x: self.width.div_ceil(TILE_SIZE),
            y: self.height.div_ceil(TILE_SIZE),
            z: 1,
        }
    }

    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of f32 components in the read-out.
    pub const fn component_count(&self) -> usize {
        self.pixel_count() * 4
    }

    /// Tightly packed bytes per row.
    pub const fn unpadded_bytes_per_row(&self) -> u32 {
        self.width * BYTES_PER_PIXEL
    }

    /// Bytes per row in a buffer that receives an image copy.
    ///
    /// Image-to-buffer copies must use a row pitch that is a multiple of
    /// [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`]; the read-out strips the padding again.
    pub const fn padded_bytes_per_row(&self) -> u32 {
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        self.unpadded_bytes_per_row().div_ceil(align) * align
    }

    /// Size of the staging buffer that receives the image.
    pub const fn readback_size(&self) -> u64 {
        self.padded_bytes_per_row() as u64 * self.height as u64
    }
}

/// Workgroup counts for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchGrid {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_is_valid() {
        let frame = FrameDescriptor::default();
        assert_eq!(frame.validate(), Ok(()));
        assert_eq!(
            frame.dispatch_grid(),
            DispatchGrid { x: 80, y: 45, z: 1 }
        );
        assert_eq!(frame.component_count(), 640 * 360 * 4);
    }

    #[test]
    fn rejects_width_not_divisible_by_tile() {
        let frame = FrameDescriptor::new(641, 360);
        assert_eq!(
            frame.validate(),
            Err(ContractViolation::FrameNotTileAligned {
                width: 641,
                height: 360,
                tile: 8
            })
        );
    }

    #[test]
    fn rejects_empty_frame() {
        assert!(matches!(
            FrameDescriptor::new(0, 8).validate(),
            Err(ContractViolation::EmptyFrame { .. })
        ));
    }

    #[test]
    fn row_padding() {
        //640 * 16 = 10240 which is already a multiple of 256
        assert_eq!(FrameDescriptor::new(640, 8).padded_bytes_per_row(), 10240);
        //8 * 16 = 128 rounds up to 256
        let narrow = FrameDescriptor::new(8, 8);
        assert_eq!(narrow.padded_bytes_per_row(), 256);
        assert_eq!(narrow.readback_size(), 256 * 8);
    }
}
