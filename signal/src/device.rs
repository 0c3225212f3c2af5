// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `hdr-signal` developers
//! The boundary to the output hardware driver.
//!
//! Everything behind these traits is a vendor collaborator: enumeration, capability queries,
//! frame allocation, metadata transport and playback. The session only talks to them through
//! here, which also lets the in-memory [`crate::virtual_device`] stand in for real hardware.
use core::fmt;

use bitflags::bitflags;
use hdr_signal_wire::FourCC;
use serde::{Deserialize, Serialize};

/// A failed call into the driver, carrying its raw result code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("device call failed with result 0x{code:08x}")]
pub struct DeviceError {
    code: u32,
}

/// A display mode of the output, by its 4CC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayMode {
    #[serde(rename = "HD720p60")]
    Hd720p60,
    #[serde(rename = "HD1080p25")]
    Hd1080p25,
    #[serde(rename = "HD1080p2997")]
    Hd1080p2997,
    #[serde(rename = "HD1080p30")]
    Hd1080p30,
    #[serde(rename = "HD1080p60")]
    Hd1080p60,
    #[serde(rename = "4K2160p30")]
    Uhd2160p30,
}

/// Keys of per-frame metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataKey {
    /// The transfer function code, 0 to 7 as in CEA-861.3. An integer.
    Eotf,
    DisplayPrimariesRedX,
    DisplayPrimariesRedY,
    DisplayPrimariesGreenX,
    DisplayPrimariesGreenY,
    DisplayPrimariesBlueX,
    DisplayPrimariesBlueY,
    WhitePointX,
    WhitePointY,
    /// In cd/m².
    MaxDisplayMasteringLuminance,
    /// In cd/m².
    MinDisplayMasteringLuminance,
    MaxContentLightLevel,
    MaxFrameAverageLightLevel,
}

/// Whether a metadata key holds an integer or a float.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataKind {
    Int,
    Float,
}

bitflags! {
    /// Flags of a video frame.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FrameFlags: u32 {
        const FLIP_VERTICAL = 1 << 0;
        const CONTAINS_HDR_METADATA = 1 << 1;
    }
}

/// Description of one enumerated device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub display_name: String,
}

/// Enumerates devices and opens their outputs.
pub trait Driver {
    type Output: Output;

    /// All devices currently attached, in enumeration order.
    fn devices(&self) -> Result<Vec<DeviceInfo>, DeviceError>;

    /// Acquire the output interface of the device at `index`.
    ///
    /// Returns `Ok(None)` if there is no such device or it has no output.
    fn open_output(&self, index: usize) -> Result<Option<Self::Output>, DeviceError>;

    /// The version of the installed driver, packed as `major << 24 | minor << 16 | patch << 8`.
    ///
    /// `Ok(None)` when no API information is available at all.
    fn api_version(&self) -> Result<Option<u32>, DeviceError>;

    /// The version of the interface this driver was built against.
    fn sdk_version(&self) -> &'static str;
}

/// One video output of a device.
pub trait Output {
    type Frame: Frame;

    /// Query whether `format` can be emitted in `mode`.
    fn supports_format(&self, mode: DisplayMode, format: FourCC) -> Result<bool, DeviceError>;

    /// The number of bytes per row the device requires for `width` pixels of `format`.
    fn row_bytes_for(&self, format: FourCC, width: u32) -> Result<usize, DeviceError>;

    /// Allocate a frame of `stride * height` bytes.
    fn create_frame(
        &mut self,
        width: u32,
        height: u32,
        stride: usize,
        format: FourCC,
    ) -> Result<Self::Frame, DeviceError>;

    fn enable_video(&mut self, mode: DisplayMode) -> Result<(), DeviceError>;

    fn disable_video(&mut self) -> Result<(), DeviceError>;

    /// Queue a frame for display at `time` for `duration`, both in units of `1 / scale` seconds.
    fn schedule(
        &mut self,
        frame: &Self::Frame,
        time: i64,
        duration: i64,
        scale: i64,
    ) -> Result<(), DeviceError>;

    fn start_playback(&mut self, time: i64, scale: i64, speed: f64) -> Result<(), DeviceError>;

    fn stop_playback(&mut self) -> Result<(), DeviceError>;
}

/// A device-owned video frame.
pub trait Frame {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// The bytes per row the frame was allocated with.
    fn stride(&self) -> usize;

    fn format(&self) -> FourCC;

    fn flags(&self) -> FrameFlags;

    fn set_flags(&mut self, flags: FrameFlags);

    /// Lock the buffer for writing. Prefer [`WriteAccess`], which unlocks on all paths.
    fn start_write(&mut self) -> Result<(), DeviceError>;

    /// The buffer, only valid between [`Frame::start_write`] and [`Frame::end_write`].
    fn bytes_mut(&mut self) -> Result<&mut [u8], DeviceError>;

    fn end_write(&mut self) -> Result<(), DeviceError>;

    fn set_int(&mut self, key: MetadataKey, value: i64) -> Result<(), DeviceError>;

    fn set_float(&mut self, key: MetadataKey, value: f64) -> Result<(), DeviceError>;

    /// Remove a metadata field. Clearing an absent field succeeds.
    fn clear(&mut self, key: MetadataKey) -> Result<(), DeviceError>;
}

/// Scoped write access to the buffer of a frame.
///
/// Write access is ended when this is dropped, on every exit path of the code holding it.
pub struct WriteAccess<'frame, F: Frame + ?Sized> {
    frame: &'frame mut F,
}

impl DeviceError {
    /// Unspecified failure.
    pub const FAIL: Self = DeviceError::new(0x8000_4005);
    /// Not implemented by the device.
    pub const NOT_IMPLEMENTED: Self = DeviceError::new(0x8000_4001);
    pub const INVALID_ARG: Self = DeviceError::new(0x8007_0057);
    pub const OUT_OF_MEMORY: Self = DeviceError::new(0x8007_000e);
    pub const ACCESS_DENIED: Self = DeviceError::new(0x8007_0005);

    pub const fn new(code: u32) -> Self {
        DeviceError { code }
    }

    /// The raw result code of the driver.
    pub const fn code(&self) -> u32 {
        self.code
    }
}

impl DisplayMode {
    pub const fn code(self) -> FourCC {
        FourCC::from_bytes(match self {
            DisplayMode::Hd720p60 => *b"hp60",
            DisplayMode::Hd1080p25 => *b"Hp25",
            DisplayMode::Hd1080p2997 => *b"Hp29",
            DisplayMode::Hd1080p30 => *b"Hp30",
            DisplayMode::Hd1080p60 => *b"Hp60",
            DisplayMode::Uhd2160p30 => *b"4k30",
        })
    }

    /// Width and height of the active picture.
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            DisplayMode::Hd720p60 => (1280, 720),
            DisplayMode::Hd1080p25
            | DisplayMode::Hd1080p2997
            | DisplayMode::Hd1080p30
            | DisplayMode::Hd1080p60 => (1920, 1080),
            DisplayMode::Uhd2160p30 => (3840, 2160),
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayMode::Hd720p60 => "HD720p60",
            DisplayMode::Hd1080p25 => "HD1080p25",
            DisplayMode::Hd1080p2997 => "HD1080p2997",
            DisplayMode::Hd1080p30 => "HD1080p30",
            DisplayMode::Hd1080p60 => "HD1080p60",
            DisplayMode::Uhd2160p30 => "4K2160p30",
        };

        f.write_str(name)
    }
}

impl MetadataKey {
    /// The transfer function and the mastering display fields, in attach order.
    pub const ALL: [MetadataKey; 13] = [
        MetadataKey::Eotf,
        MetadataKey::DisplayPrimariesRedX,
        MetadataKey::DisplayPrimariesRedY,
        MetadataKey::DisplayPrimariesGreenX,
        MetadataKey::DisplayPrimariesGreenY,
        MetadataKey::DisplayPrimariesBlueX,
        MetadataKey::DisplayPrimariesBlueY,
        MetadataKey::WhitePointX,
        MetadataKey::WhitePointY,
        MetadataKey::MaxDisplayMasteringLuminance,
        MetadataKey::MinDisplayMasteringLuminance,
        MetadataKey::MaxContentLightLevel,
        MetadataKey::MaxFrameAverageLightLevel,
    ];

    pub const fn kind(self) -> MetadataKind {
        match self {
            MetadataKey::Eotf => MetadataKind::Int,
            _ => MetadataKind::Float,
        }
    }
}

impl<'frame, F: Frame + ?Sized> WriteAccess<'frame, F> {
    /// Lock `frame` for writing.
    pub fn start(frame: &'frame mut F) -> Result<Self, DeviceError> {
        frame.start_write()?;
        Ok(WriteAccess { frame })
    }

    pub fn bytes(&mut self) -> Result<&mut [u8], DeviceError> {
        self.frame.bytes_mut()
    }
}

impl<F: Frame + ?Sized> Drop for WriteAccess<'_, F> {
    fn drop(&mut self) {
        if let Err(err) = self.frame.end_write() {
            tracing::warn!(code = err.code(), "ending frame write access failed");
        }
    }
}
