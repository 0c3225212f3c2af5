//! Rescaling of 16-bit samples and the integer luma/chroma differencing.
//!
//! Both operations are bit-exact by contract. The rescale truncates instead of rounding, and the
//! differencing uses the 8-bit integer coefficients of BT.601 directly on 16-bit samples, so any
//! moderately bright input saturates. It is a test signal, not a colorimetric transform.
use crate::format::{ChannelModel, PixelFormat};
use crate::PackError;

/// Channel planes at the bit depth of a target format.
///
/// Holds three parallel per-pixel planes, either `R, G, B` or `Y, U, V`, in row-major order
/// without padding. This is the only input the packer consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Planes {
    width: u32,
    height: u32,
    depth: u32,
    model: ChannelModel,
    channels: [Vec<u16>; 3],
}

/// An integer differencing scheme.
///
/// Each output row is `(dot(row, rgb) + ROUND) >> SHIFT`, evaluated on signed intermediates and
/// clamped to the 8-bit range afterwards.
trait IntDifferencing {
    const DIFF: [i32; 9];
    const ROUND: i32 = 128;
    const SHIFT: u32 = 8;
}

struct Bt601Approx;

impl IntDifferencing for Bt601Approx {
    // Chroma rows carry no +128 offset.
    #[rustfmt::skip]
    const DIFF: [i32; 9] = [
        66, 129, 25,
        -38, -74, 112,
        112, -94, -18,
    ];
}

/// Rescale a 16-bit sample to `bits` bits.
///
/// Computes `(sample * (2^bits - 1)) / 65535` with truncating division. Valid for `bits` in
/// `1..=16`.
#[inline]
pub const fn quantize(sample: u16, bits: u32) -> u16 {
    let max = (1u32 << bits) - 1;
    ((sample as u32 * max) / 65535) as u16
}

/// Convert one RGB triple to `[Y, U, V]`.
///
/// Evaluated on the samples as given, with signed intermediates clamped to `0..=255`.
pub fn rgb_to_yuv(r: u16, g: u16, b: u16) -> [u8; 3] {
    differencing::<Bt601Approx>([r.into(), g.into(), b.into()])
}

fn differencing<D: IntDifferencing>([r, g, b]: [i32; 3]) -> [u8; 3] {
    let m = D::DIFF;
    let row = |i: usize| {
        let sum = m[3 * i] * r + m[3 * i + 1] * g + m[3 * i + 2] * b + D::ROUND;
        (sum >> D::SHIFT).clamp(0, 255) as u8
    };

    [row(0), row(1), row(2)]
}

impl Planes {
    /// Deinterleave and quantize a 16-bit `R, G, B` buffer for the target format.
    ///
    /// RGB formats are rescaled to their component depth. YUV formats difference the 16-bit
    /// samples with [`rgb_to_yuv`] and, for 10-bit formats, widen the result by a left shift of
    /// two.
    pub fn from_rgb16(
        rgb: &[u16],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, PackError> {
        let count = pixel_count(width, height)?;
        let expected = count.checked_mul(3).ok_or(PackError::overflow())?;

        if rgb.len() != expected {
            return Err(PackError::source_length(rgb.len(), expected));
        }

        let pixels: &[[u16; 3]] = bytemuck::cast_slice(rgb);
        let depth = format.bit_depth();
        let model = format.channel_model();
        let mut channels = [
            Vec::with_capacity(count),
            Vec::with_capacity(count),
            Vec::with_capacity(count),
        ];

        let mut push = |[a, b, c]: [u16; 3]| {
            channels[0].push(a);
            channels[1].push(b);
            channels[2].push(c);
        };

        match model {
            ChannelModel::Rgb => {
                for &px in pixels {
                    push(px.map(|s| quantize(s, depth)));
                }
            }
            ChannelModel::Yuv => {
                let widen = depth - 8;
                for &[r, g, b] in pixels {
                    push(rgb_to_yuv(r, g, b).map(|s| u16::from(s) << widen));
                }
            }
        }

        Ok(Planes {
            width,
            height,
            depth,
            model,
            channels,
        })
    }

    /// Wrap already quantized planes.
    ///
    /// Fails if a plane does not hold exactly `width * height` samples, or if a sample does not
    /// fit into `depth` bits.
    pub fn from_channels(
        width: u32,
        height: u32,
        depth: u32,
        model: ChannelModel,
        channels: [Vec<u16>; 3],
    ) -> Result<Self, PackError> {
        let count = pixel_count(width, height)?;

        if let Some(bad) = channels.iter().find(|ch| ch.len() != count) {
            return Err(PackError::source_length(bad.len(), count));
        }

        if !(1..=16).contains(&depth) {
            return Err(PackError::plane_mismatch());
        }

        let limit = (1u32 << depth) - 1;
        if channels.iter().flatten().any(|&s| u32::from(s) > limit) {
            return Err(PackError::plane_mismatch());
        }

        Ok(Planes {
            width,
            height,
            depth,
            model,
            channels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The number of significant bits of each sample.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn model(&self) -> ChannelModel {
        self.model
    }

    /// One full plane, `0..3` in model order.
    pub fn channel(&self, idx: usize) -> &[u16] {
        &self.channels[idx]
    }

    /// The three samples of the pixel at column `x` of `row`.
    #[inline]
    pub(crate) fn at(&self, row: usize, x: usize) -> [u16; 3] {
        let idx = row * self.width as usize + x;
        [
            self.channels[0][idx],
            self.channels[1][idx],
            self.channels[2][idx],
        ]
    }
}

fn pixel_count(width: u32, height: u32) -> Result<usize, PackError> {
    if width == 0 || height == 0 {
        return Err(PackError::empty());
    }

    usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .ok_or(PackError::overflow())
}
