use hdr_signal_wire::{FourCC, PackError};

use crate::device::DeviceError;

/// An error of a session or its catalog.
///
/// Each variant is one failure class, reported at the caller boundary as its own status code,
/// see [`Error::status`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("video output is not enabled")]
    NoOutputEnabled,
    #[error("no frame data has been set")]
    NoPendingData,
    #[error("row stride query for {format} failed")]
    RowStride {
        format: FourCC,
        #[source]
        source: DeviceError,
    },
    #[error("allocating a {width}x{height} frame failed")]
    FrameAllocation {
        width: u32,
        height: u32,
        #[source]
        source: DeviceError,
    },
    #[error("accessing the frame buffer failed")]
    BufferAccess(#[source] DeviceError),
    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(FourCC),
    #[error("pixel format index {index} is out of range for {count} formats")]
    InvalidFormatIndex { index: usize, count: usize },
    #[error("the format catalog has not been built")]
    CatalogNotBuilt,
    #[error("capability query for {format} failed")]
    CapabilityQuery {
        format: FourCC,
        #[source]
        source: DeviceError,
    },
    #[error("enabling video output failed")]
    EnableOutput(#[source] DeviceError),
    #[error("no frame has been created")]
    NoFrame,
    #[error("scheduling the frame failed")]
    ScheduleFrame(#[source] DeviceError),
    #[error("starting playback failed")]
    StartPlayback(#[source] DeviceError),
    #[error("no output device at index {0}")]
    DeviceNotFound(usize),
    #[error("packing the frame failed")]
    Packing(#[source] PackError),
    #[error("device enumeration failed")]
    Enumeration(#[source] DeviceError),
    #[error("pixel format {0} is not in the format catalog")]
    FormatNotInCatalog(FourCC),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Status codes of the caller boundary.
pub mod status {
    pub const OK: i32 = 0;
    pub const INVALID_INPUT: i32 = -1;
    pub const NO_OUTPUT_ENABLED: i32 = -2;
    pub const NO_PENDING_DATA: i32 = -3;
    pub const ROW_STRIDE: i32 = -4;
    pub const FRAME_ALLOCATION: i32 = -5;
    pub const BUFFER_ACCESS: i32 = -6;
    pub const UNSUPPORTED_FORMAT: i32 = -7;
    pub const INVALID_FORMAT_INDEX: i32 = -8;
    pub const CATALOG_NOT_BUILT: i32 = -9;
    pub const CAPABILITY_QUERY: i32 = -10;
    pub const ENABLE_OUTPUT: i32 = -11;
    pub const NO_FRAME: i32 = -12;
    pub const SCHEDULE_FRAME: i32 = -13;
    pub const START_PLAYBACK: i32 = -14;
    pub const DEVICE_NOT_FOUND: i32 = -15;
    pub const PACKING: i32 = -16;
    pub const ENUMERATION: i32 = -17;
    pub const FORMAT_NOT_IN_CATALOG: i32 = -18;
}

impl Error {
    /// The negative status code of this failure class.
    pub fn status(&self) -> i32 {
        match self {
            Error::InvalidInput(_) => status::INVALID_INPUT,
            Error::NoOutputEnabled => status::NO_OUTPUT_ENABLED,
            Error::NoPendingData => status::NO_PENDING_DATA,
            Error::RowStride { .. } => status::ROW_STRIDE,
            Error::FrameAllocation { .. } => status::FRAME_ALLOCATION,
            Error::BufferAccess(_) => status::BUFFER_ACCESS,
            Error::UnsupportedFormat(_) => status::UNSUPPORTED_FORMAT,
            Error::InvalidFormatIndex { .. } => status::INVALID_FORMAT_INDEX,
            Error::CatalogNotBuilt => status::CATALOG_NOT_BUILT,
            Error::CapabilityQuery { .. } => status::CAPABILITY_QUERY,
            Error::EnableOutput(_) => status::ENABLE_OUTPUT,
            Error::NoFrame => status::NO_FRAME,
            Error::ScheduleFrame(_) => status::SCHEDULE_FRAME,
            Error::StartPlayback(_) => status::START_PLAYBACK,
            Error::DeviceNotFound(_) => status::DEVICE_NOT_FOUND,
            Error::Packing(_) => status::PACKING,
            Error::Enumeration(_) => status::ENUMERATION,
            Error::FormatNotInCatalog(_) => status::FORMAT_NOT_IN_CATALOG,
        }
    }

    /// The raw result code, if the device reported this failure.
    pub fn device_code(&self) -> Option<u32> {
        match self {
            Error::RowStride { source, .. }
            | Error::FrameAllocation { source, .. }
            | Error::CapabilityQuery { source, .. }
            | Error::BufferAccess(source)
            | Error::EnableOutput(source)
            | Error::ScheduleFrame(source)
            | Error::StartPlayback(source)
            | Error::Enumeration(source) => Some(source.code()),
            _ => None,
        }
    }
}

impl From<PackError> for Error {
    fn from(err: PackError) -> Self {
        match err.unsupported_format() {
            Some(format) => Error::UnsupportedFormat(format),
            None => Error::Packing(err),
        }
    }
}
