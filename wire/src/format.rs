// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `hdr-signal` developers
//! Pixel format tags as understood by the output hardware.
use core::convert::TryFrom;
use core::fmt;

use crate::PackError;

/// A 4CC format identifier.
///
/// This exists to define the known formats as constants and to typify the conversion and
/// representation of values involved. The code is the big-endian reading of the four characters,
/// that is `'v210'` is stored as `0x7632_3130`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCC(u32);

/// A concrete on-wire pixel layout.
///
/// The set is closed. Each variant names one byte layout that the output hardware consumes
/// verbatim, see [`crate::pack`] for the exact bit placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// `2vuy`, 8-bit 4:2:2 with bytes `Cb Y0 Cr Y1`.
    Yuv8,
    /// `v210`, 10-bit 4:2:2 with six pixels in four little-endian words.
    Yuv10,
    /// `Ay10`, 10-bit 4:2:2 with alpha. Enumerated, never packed.
    Yuva10,
    /// 8-bit with bytes `A R G B`. Its tag is the number 32, not a printable code.
    Argb8,
    /// `BGRA`, 8-bit with bytes `B G R A`.
    Bgra8,
    /// `r210`, three 10-bit components in the low 30 bits of a big-endian word.
    Rgb10,
    /// `R12B`, 12-bit components as a bit stream in big-endian words.
    Rgb12,
    /// `R12L`, 12-bit components as a bit stream in little-endian words.
    Rgb12Le,
    /// `R10l`, three 10-bit components in the high 30 bits of a little-endian word.
    Rgbx10Le,
    /// `R10b`, three 10-bit components in the high 30 bits of a big-endian word.
    Rgbx10,
}

/// The color model of the channel planes a format is packed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelModel {
    /// Red, green, blue.
    Rgb,
    /// Luma, blue difference, red difference.
    Yuv,
}

impl FourCC {
    /// An all-zero code, never assigned to a format.
    pub const INVALID: Self = FourCC(0);

    pub const fn new(code: u32) -> Self {
        FourCC(code)
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        FourCC(u32::from_be_bytes(bytes))
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// The four characters, most significant byte first.
    ///
    /// `None` unless every byte is printable ASCII.
    pub fn printable(self) -> Option<[char; 4]> {
        let bytes = self.to_bytes();
        bytes
            .iter()
            .all(|&b| b.is_ascii_graphic() || b == b' ')
            .then(|| bytes.map(char::from))
    }
}

/// The characters of the code, or its decimal value if it is not printable.
impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.printable() {
            Some(chars) => chars.iter().try_for_each(|c| write!(f, "{c}")),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<u32> for FourCC {
    fn from(code: u32) -> Self {
        FourCC(code)
    }
}

impl From<FourCC> for u32 {
    fn from(code: FourCC) -> Self {
        code.0
    }
}

impl PixelFormat {
    /// All known formats, in the order a device is probed for them.
    pub const ALL: [PixelFormat; 10] = [
        PixelFormat::Yuv8,
        PixelFormat::Yuv10,
        PixelFormat::Yuva10,
        PixelFormat::Argb8,
        PixelFormat::Bgra8,
        PixelFormat::Rgb10,
        PixelFormat::Rgb12,
        PixelFormat::Rgb12Le,
        PixelFormat::Rgbx10Le,
        PixelFormat::Rgbx10,
    ];

    pub const fn fourcc(self) -> FourCC {
        match self {
            PixelFormat::Yuv8 => FourCC::from_bytes(*b"2vuy"),
            PixelFormat::Yuv10 => FourCC::from_bytes(*b"v210"),
            PixelFormat::Yuva10 => FourCC::from_bytes(*b"Ay10"),
            PixelFormat::Argb8 => FourCC::new(32),
            PixelFormat::Bgra8 => FourCC::from_bytes(*b"BGRA"),
            PixelFormat::Rgb10 => FourCC::from_bytes(*b"r210"),
            PixelFormat::Rgb12 => FourCC::from_bytes(*b"R12B"),
            PixelFormat::Rgb12Le => FourCC::from_bytes(*b"R12L"),
            PixelFormat::Rgbx10Le => FourCC::from_bytes(*b"R10l"),
            PixelFormat::Rgbx10 => FourCC::from_bytes(*b"R10b"),
        }
    }

    pub fn from_fourcc(code: FourCC) -> Option<Self> {
        Self::ALL.into_iter().find(|fmt| fmt.fourcc() == code)
    }

    /// A human readable name of the format family.
    pub const fn family(self) -> &'static str {
        match self {
            PixelFormat::Yuv8 => "8-bit YUV",
            PixelFormat::Yuv10 => "10-bit YUV",
            PixelFormat::Yuva10 => "10-bit YUVA",
            PixelFormat::Argb8 => "8-bit ARGB",
            PixelFormat::Bgra8 => "8-bit BGRA",
            PixelFormat::Rgb10 => "10-bit RGB",
            PixelFormat::Rgb12 => "12-bit RGB",
            PixelFormat::Rgb12Le => "12-bit RGB LE",
            PixelFormat::Rgbx10Le => "10-bit RGBX LE",
            PixelFormat::Rgbx10 => "10-bit RGBX",
        }
    }

    /// The number of bits of each packed component.
    pub const fn bit_depth(self) -> u32 {
        match self {
            PixelFormat::Yuv8 | PixelFormat::Argb8 | PixelFormat::Bgra8 => 8,
            PixelFormat::Yuv10
            | PixelFormat::Yuva10
            | PixelFormat::Rgb10
            | PixelFormat::Rgbx10Le
            | PixelFormat::Rgbx10 => 10,
            PixelFormat::Rgb12 | PixelFormat::Rgb12Le => 12,
        }
    }

    pub const fn channel_model(self) -> ChannelModel {
        match self {
            PixelFormat::Yuv8 | PixelFormat::Yuv10 | PixelFormat::Yuva10 => ChannelModel::Yuv,
            _ => ChannelModel::Rgb,
        }
    }

    /// Whether [`crate::pack`] implements this layout.
    pub const fn is_packable(self) -> bool {
        !matches!(self, PixelFormat::Yuva10)
    }

    /// The smallest number of bytes a row of `width` pixels occupies.
    ///
    /// These follow the alignment conventions of the output hardware: `v210` rows are padded to
    /// groups of 48 pixels, 10-bit RGB rows to groups of 64 pixels, 12-bit rows to groups of 8.
    /// A device may still choose a larger stride. Returns `None` on overflow.
    pub fn nominal_row_bytes(self, width: u32) -> Option<usize> {
        let width = usize::try_from(width).ok()?;
        let groups = |n: usize| width.checked_add(n - 1).map(|w| w / n);

        match self {
            PixelFormat::Yuv8 => groups(2)?.checked_mul(4),
            PixelFormat::Yuv10 | PixelFormat::Yuva10 => groups(48)?.checked_mul(128),
            PixelFormat::Argb8 | PixelFormat::Bgra8 => width.checked_mul(4),
            PixelFormat::Rgb10 | PixelFormat::Rgbx10Le | PixelFormat::Rgbx10 => {
                groups(64)?.checked_mul(256)
            }
            PixelFormat::Rgb12 | PixelFormat::Rgb12Le => groups(8)?.checked_mul(36),
        }
    }
}

impl TryFrom<FourCC> for PixelFormat {
    type Error = PackError;

    fn try_from(code: FourCC) -> Result<Self, PackError> {
        PixelFormat::from_fourcc(code).ok_or(PackError::unsupported(code))
    }
}

impl From<PixelFormat> for FourCC {
    fn from(format: PixelFormat) -> Self {
        format.fourcc()
    }
}

/// The family label of a tag, `Unknown` for codes outside the known set.
pub fn family_of(code: FourCC) -> &'static str {
    PixelFormat::from_fourcc(code).map_or("Unknown", PixelFormat::family)
}
