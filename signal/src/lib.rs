// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `hdr-signal` developers
//! # HDR signal generator
//!
//! Drives a video output to emit a synthetic test frame in a selectable pixel format, tagged
//! with static HDR metadata.
//!
//! The device is reached through the [`Driver`], [`Output`] and [`Frame`] traits. A
//! [`Session`] owns one output and walks it from enabled video through a built, scheduled and
//! playing frame. The [`virtual_device`] implements the traits in memory.
//!
//! ```
//! use hdr_signal::virtual_device::{VirtualDevice, VirtualDriver};
//! use hdr_signal::{Session, SessionConfig};
//!
//! let driver = VirtualDriver::new(vec![VirtualDevice::new("Virtual")]);
//! let mut session = Session::open(&driver, 0, SessionConfig::default())?;
//!
//! // A single white pixel.
//! session.set_frame_data(&[0xffff; 3], 1, 1)?;
//! session.start_output()?;
//! session.create_frame()?;
//! session.schedule_frame()?;
//! session.start_playback()?;
//!
//! let scheduled = &session.output().scheduled()[0];
//! assert_eq!((scheduled.duration, scheduled.scale), (1000, 30000));
//! # Ok::<(), hdr_signal::Error>(())
//! ```
#![deny(unsafe_code)]

pub mod api;
mod catalog;
pub mod config;
pub mod device;
mod error;
mod hdr;
mod session;
pub mod version;
pub mod virtual_device;

pub use self::catalog::FormatCatalog;
pub use self::config::{ConfigError, SessionConfig};
pub use self::device::{
    DeviceError, DeviceInfo, DisplayMode, Driver, Frame, FrameFlags, MetadataKey, MetadataKind,
    Output, WriteAccess,
};
pub use self::error::{status, Error, Result};
pub use self::hdr::{AttachReport, Chromaticity, HdrMetadata};
pub use self::session::{Session, State};

pub use hdr_signal_wire as wire;
pub use hdr_signal_wire::{FourCC, PixelFormat};
