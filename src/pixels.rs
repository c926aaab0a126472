// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The host-side result of a run.

A [`PixelBuffer`] holds `width * height` RGBA texels as `f32`, row-major.  Values are expected in
`[0, 1]`; values outside that range (or NaN) are reported by [`PixelBuffer::validity`] and logged,
but never fail the run.  The PNG writer clamps them; the Radiance HDR writer keeps them as they are.
[`PixelBuffer::write`] picks the writer from the file extension.
*/

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Error;
use crate::frame::{BYTES_PER_PIXEL, FrameDescriptor};

/// How many offenders a [`PixelReport`] lists individually.
const REPORTED_OFFENDERS: usize = 8;

/// One out-of-range component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidComponent {
    pub x: u32,
    pub y: u32,
    /// 0 = red … 3 = alpha.
    pub channel: u8,
    pub value: f32,
}

/// Summary of out-of-range components in a [`PixelBuffer`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PixelReport {
    /// Number of components outside `[0, 1]` or NaN.
    pub invalid: usize,
    /// The first few offenders in row-major order.
    pub first: Vec<InvalidComponent>,
}

impl PixelReport {
    pub fn is_clean(&self) -> bool {
        self.invalid == 0
    }

    /// Logs the offenders as warnings.
    pub fn log(&self) {
        for offender in &self.first {
            logwise::warn_sync!(
                "Invalid pixel value {value} (x={x}, y={y}, c={c})",
                value = logwise::privacy::LogIt(&offender.value),
                x = offender.x,
                y = offender.y,
                c = u32::from(offender.channel)
            );
        }
        if self.invalid > self.first.len() {
            logwise::warn_sync!(
                "{more} more invalid pixel values",
                more = self.invalid - self.first.len()
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` components, row-major RGBA.
    pub data: Vec<f32>,
}

impl PixelBuffer {
    /// Strips the row padding of an image read-out.
    ///
    /// `bytes` holds `frame.height` rows of `padded_bytes_per_row` bytes each.
    pub(crate) fn from_padded_rows(frame: FrameDescriptor, padded_bytes_per_row: u32, bytes: &[u8]) -> PixelBuffer {
        let row_bytes = (frame.width * BYTES_PER_PIXEL) as usize;
        let mut data = Vec::with_capacity(frame.component_count());
        for row in bytes
            .chunks(padded_bytes_per_row as usize)
            .take(frame.height as usize)
        {
            data.extend(
                row[..row_bytes]
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])),
            );
        }
        PixelBuffer {
            width: frame.width,
            height: frame.height,
            data,
        }
    }

    /// The RGBA components of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * 4;
        let p = self.data.get(start..start + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    pub fn validity(&self) -> PixelReport {
        let mut report = PixelReport::default();
        for (index, value) in self.data.iter().enumerate() {
            if !(0.0..=1.0).contains(value) {
                report.invalid += 1;
                if report.first.len() < REPORTED_OFFENDERS {
                    let texel = index / 4;
                    report.first.push(InvalidComponent {
                        x: (texel % self.width as usize) as u32,
                        y: (texel / self.width as usize) as u32,
                        channel: (index % 4) as u8,
                        value: *value,
                    });
                }
            }
        }
        report
    }

    /// 8-bit RGBA: each component clamped to `[0, 1]`, scaled by 255 and truncated.  NaN maps to 0.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|v| {
                if v.is_nan() {
                    0
                } else {
                    (v.clamp(0.0, 1.0) * 255.0) as u8
                }
            })
            .collect()
    }

    /// Writes `.hdr` files with [`Self::write_hdr`] and everything else with [`Self::write_png`].
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let is_hdr = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("hdr"));
        if is_hdr {
            self.write_hdr(path)
        } else {
            self.write_png(path)
        }
    }

    /// Radiance RGBE with the float RGB components unclamped; alpha is dropped.
    pub fn write_hdr(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let rgb = self
            .data
            .chunks_exact(4)
            .map(|p| image::Rgb([p[0], p[1], p[2]]))
            .collect::<Vec<_>>();
        let mut writer = BufWriter::new(file);
        image::codecs::hdr::HdrEncoder::new(&mut writer).encode(
            &rgb,
            self.width as usize,
            self.height as usize,
        )?;
        writer.flush().map_err(|e| Error::io(path, e))?;
        logwise::info_sync!(
            "wrote {path}",
            path = path.display().to_string()
        );
        Ok(())
    }

    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.to_rgba8())?;
        writer.finish()?;
        logwise::info_sync!(
            "wrote {path}",
            path = path.display().to_string()
        );
        Ok(())
    }
}
