// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `hdr-signal` developers
//! # Wire formats
//!
//! Converts device-independent 16-bit RGB frames into the bit-packed pixel layouts consumed by
//! video output hardware.
//!
//! The process has two steps:
//! 1. Quantize the interleaved source into [`Planes`] at the depth of the target format, deriving
//!    luma and chroma where the format requires it.
//! 2. [`pack`] the planes into a byte buffer, honoring the row stride handed out by the device.
//!
//! ```
//! use hdr_signal_wire::{pack, PixelFormat, Planes};
//!
//! // Two pixels, red and white, as 16-bit RGB.
//! let rgb = [65535, 0, 0, 65535, 65535, 65535];
//! let planes = Planes::from_rgb16(&rgb, 2, 1, PixelFormat::Bgra8)?;
//!
//! // A device may pad its rows, here to 16 bytes.
//! let mut frame = vec![0; 16];
//! pack(PixelFormat::Bgra8, &planes, 16, &mut frame)?;
//! assert_eq!(&frame[..8], &[0, 0, 255, 255, 255, 255, 255, 255]);
//! # Ok::<(), hdr_signal_wire::PackError>(())
//! ```
#![deny(unsafe_code)]

mod bits;
mod error;
pub mod format;
mod layout;
pub mod pack;
pub mod quantize;

pub use self::error::PackError;
pub use self::format::{family_of, ChannelModel, FourCC, PixelFormat};
pub use self::layout::RowLayout;
pub use self::pack::{pack, unpack};
pub use self::quantize::{quantize, rgb_to_yuv, Planes};
