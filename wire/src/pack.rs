// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `hdr-signal` developers
//! Bit-exact packing of channel planes into the wire layouts.
//!
//! Every layout is written row by row into a caller-owned buffer at the offsets of a
//! [`RowLayout`]. The layouts, in bytes of a row:
//!
//! | Format | Unit | Content |
//! |--------|------|---------|
//! | ARGB   | 1 pixel, 4 bytes  | `A R G B`, alpha is `0xff` |
//! | `BGRA` | 1 pixel, 4 bytes  | `B G R A`, alpha is `0xff` |
//! | `r210` | 1 pixel, 4 bytes  | big-endian word `R << 20 \| G << 10 \| B` |
//! | `R10b` | 1 pixel, 4 bytes  | big-endian word `R << 22 \| G << 12 \| B << 2` |
//! | `R10l` | 1 pixel, 4 bytes  | as `R10b`, little-endian word |
//! | `R12B` | 8 pixels, 36 bytes | `R0 G0 B0 R1 …` as a low-bits-first stream of 12-bit fields in nine big-endian words |
//! | `R12L` | 8 pixels, 36 bytes | as `R12B`, little-endian words |
//! | `2vuy` | 2 pixels, 4 bytes | `Cb Y0 Cr Y1` |
//! | `v210` | 6 pixels, 16 bytes | four little-endian words `Cb0 Y0 Cr0`, `Y1 Cb1 Y2`, `Cr1 Y3 Cb2`, `Y4 Cr2 Y5`, first sample in the lowest ten bits |
//!
//! The 4:2:2 formats take their chroma from the even pixel of each pair. Units reaching past the
//! end of a row repeat its last pixel, except for the 12-bit formats whose missing fields are zero.
use crate::bits::{WordBits, WordBitsReader};
use crate::format::PixelFormat;
use crate::layout::RowLayout;
use crate::quantize::Planes;
use crate::PackError;

/// The byte order of a 32-bit word on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WordOrder {
    Big,
    Little,
}

impl WordOrder {
    fn put(self, out: &mut [u8], words: &[u32]) {
        for (bytes, &word) in out.chunks_exact_mut(4).zip(words) {
            let encoded = match self {
                WordOrder::Big => word.to_be_bytes(),
                WordOrder::Little => word.to_le_bytes(),
            };
            bytes.copy_from_slice(&encoded);
        }
    }

    fn get(self, bytes: &[u8], idx: usize) -> u32 {
        let mut word = [0; 4];
        word.copy_from_slice(&bytes[4 * idx..4 * idx + 4]);
        match self {
            WordOrder::Big => u32::from_be_bytes(word),
            WordOrder::Little => u32::from_le_bytes(word),
        }
    }
}

/// Pack `planes` as `format` into `out`, row `n` starting at `n * stride`.
///
/// Bytes between the end of a packed row and the next stride are not written. On error nothing
/// has been written when the cause is the format, the planes or the buffer geometry, all of which
/// are checked upfront.
pub fn pack(
    format: PixelFormat,
    planes: &Planes,
    stride: usize,
    out: &mut [u8],
) -> Result<(), PackError> {
    if !format.is_packable() {
        return Err(PackError::unsupported(format.fourcc()));
    }

    if planes.model() != format.channel_model() || planes.depth() != format.bit_depth() {
        return Err(PackError::plane_mismatch());
    }

    let layout = RowLayout::new(format, planes.width(), planes.height(), stride)?;
    layout.check_len(out.len())?;

    let width = planes.width() as usize;
    for row in 0..planes.height() as usize {
        let line = &mut out[layout.row(row)];
        let px = |x: usize| planes.at(row, x.min(width - 1));

        match format {
            PixelFormat::Argb8 => units(line, 4, width, |x, unit| {
                let [r, g, b] = px(x);
                unit.copy_from_slice(&[0xff, r as u8, g as u8, b as u8]);
            }),
            PixelFormat::Bgra8 => units(line, 4, width, |x, unit| {
                let [r, g, b] = px(x);
                unit.copy_from_slice(&[b as u8, g as u8, r as u8, 0xff]);
            }),
            PixelFormat::Rgb10 => units(line, 4, width, |x, unit| {
                let [r, g, b] = px(x).map(u32::from);
                WordOrder::Big.put(unit, &[r << 20 | g << 10 | b]);
            }),
            PixelFormat::Rgbx10 => units(line, 4, width, |x, unit| {
                let [r, g, b] = px(x).map(u32::from);
                WordOrder::Big.put(unit, &[r << 22 | g << 12 | b << 2]);
            }),
            PixelFormat::Rgbx10Le => units(line, 4, width, |x, unit| {
                let [r, g, b] = px(x).map(u32::from);
                WordOrder::Little.put(unit, &[r << 22 | g << 12 | b << 2]);
            }),
            PixelFormat::Rgb12 => rgb12_row(line, width, WordOrder::Big, px),
            PixelFormat::Rgb12Le => rgb12_row(line, width, WordOrder::Little, px),
            PixelFormat::Yuv8 => units(line, 4, width.div_ceil(2), |p, unit| {
                let [y0, cb, cr] = px(2 * p);
                let [y1, _, _] = px(2 * p + 1);
                unit.copy_from_slice(&[cb as u8, y0 as u8, cr as u8, y1 as u8]);
            }),
            PixelFormat::Yuv10 => units(line, 16, width.div_ceil(6), |g, unit| {
                let px = |i: usize| px(6 * g + i).map(u32::from);
                let [y0, cb0, cr0] = px(0);
                let [y1, _, _] = px(1);
                let [y2, cb1, cr1] = px(2);
                let [y3, _, _] = px(3);
                let [y4, cb2, cr2] = px(4);
                let [y5, _, _] = px(5);

                WordOrder::Little.put(
                    unit,
                    &[
                        cb0 | y0 << 10 | cr0 << 20,
                        y1 | cb1 << 10 | y2 << 20,
                        cr1 | y3 << 10 | cb2 << 20,
                        y4 | cr2 << 10 | y5 << 20,
                    ],
                );
            }),
            PixelFormat::Yuva10 => unreachable!("rejected as unpackable"),
        }
    }

    Ok(())
}

fn rgb12_row(line: &mut [u8], width: usize, order: WordOrder, px: impl Fn(usize) -> [u16; 3]) {
    units(line, 36, width.div_ceil(8), |g, unit| {
        let mut words = [0u32; 9];
        let mut bits = WordBits::new(&mut words);

        for x in (8 * g..8 * g + 8).take_while(|&x| x < width) {
            for sample in px(x) {
                bits.push(sample.into(), 12);
            }
        }

        order.put(unit, &words);
    })
}

/// Call `f` on the first `count` units of `size` bytes of a line.
fn units(line: &mut [u8], size: usize, count: usize, mut f: impl FnMut(usize, &mut [u8])) {
    for (idx, unit) in line.chunks_exact_mut(size).take(count).enumerate() {
        f(idx, unit);
    }
}

/// Decode a packed buffer back into channel planes.
///
/// The inverse of [`pack`] on every lossless part of a layout. For the 4:2:2 formats both pixels
/// of a pair report the chroma of the pair. Intended for verifying frames handed to an output.
pub fn unpack(
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: usize,
    bytes: &[u8],
) -> Result<Planes, PackError> {
    if !format.is_packable() {
        return Err(PackError::unsupported(format.fourcc()));
    }

    let layout = RowLayout::new(format, width, height, stride)?;
    layout.check_len(bytes.len())?;

    let width = width as usize;
    let mut pixels: Vec<[u16; 3]> = Vec::with_capacity(width * height as usize);
    let ten = |word: u32, shift: u32| (word >> shift & 0x3ff) as u16;

    for row in 0..height as usize {
        let line = &bytes[layout.row(row)];
        let start = pixels.len();

        match format {
            PixelFormat::Argb8 => {
                pixels.extend(line.chunks_exact(4).map(|p| [p[1], p[2], p[3]].map(u16::from)))
            }
            PixelFormat::Bgra8 => {
                pixels.extend(line.chunks_exact(4).map(|p| [p[2], p[1], p[0]].map(u16::from)))
            }
            PixelFormat::Rgb10 => pixels.extend((0..width).map(|x| {
                let w = WordOrder::Big.get(line, x);
                [ten(w, 20), ten(w, 10), ten(w, 0)]
            })),
            PixelFormat::Rgbx10 | PixelFormat::Rgbx10Le => {
                let order = if format == PixelFormat::Rgbx10 {
                    WordOrder::Big
                } else {
                    WordOrder::Little
                };

                pixels.extend((0..width).map(|x| {
                    let w = order.get(line, x);
                    [ten(w, 22), ten(w, 12), ten(w, 2)]
                }))
            }
            PixelFormat::Rgb12 | PixelFormat::Rgb12Le => {
                let order = if format == PixelFormat::Rgb12 {
                    WordOrder::Big
                } else {
                    WordOrder::Little
                };

                for unit in line.chunks_exact(36) {
                    let words: [u32; 9] = core::array::from_fn(|i| order.get(unit, i));
                    let mut bits = WordBitsReader::new(&words);
                    for _ in 0..8 {
                        let sample = [bits.take(12), bits.take(12), bits.take(12)];
                        pixels.push(sample.map(|s| s as u16));
                    }
                }
            }
            PixelFormat::Yuv8 => {
                for p in line.chunks_exact(4) {
                    let [cb, y0, cr, y1] = [p[0], p[1], p[2], p[3]].map(u16::from);
                    pixels.extend([[y0, cb, cr], [y1, cb, cr]]);
                }
            }
            PixelFormat::Yuv10 => {
                for unit in line.chunks_exact(16) {
                    let [w0, w1, w2, w3] = core::array::from_fn(|i| WordOrder::Little.get(unit, i));
                    let (cb0, cr0) = (ten(w0, 0), ten(w0, 20));
                    let (cb1, cr1) = (ten(w1, 10), ten(w2, 0));
                    let (cb2, cr2) = (ten(w2, 20), ten(w3, 10));

                    pixels.extend([
                        [ten(w0, 10), cb0, cr0],
                        [ten(w1, 0), cb0, cr0],
                        [ten(w1, 20), cb1, cr1],
                        [ten(w2, 10), cb1, cr1],
                        [ten(w3, 0), cb2, cr2],
                        [ten(w3, 20), cb2, cr2],
                    ]);
                }
            }
            PixelFormat::Yuva10 => unreachable!("rejected as unpackable"),
        }

        // Drop group padding and the alignment of the nominal row.
        pixels.truncate(start + width);
    }

    let mut channels = [
        Vec::with_capacity(pixels.len()),
        Vec::with_capacity(pixels.len()),
        Vec::with_capacity(pixels.len()),
    ];

    for [a, b, c] in pixels {
        channels[0].push(a);
        channels[1].push(b);
        channels[2].push(c);
    }

    Planes::from_channels(
        layout.width(),
        layout.height(),
        format.bit_depth(),
        format.channel_model(),
        channels,
    )
}
