// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `hdr-signal` developers
//! A single output emitting one synthetic frame.
//!
//! The session keeps the source frame, the active pixel format and the HDR record, and walks
//! the output through its states:
//!
//! ```text
//! Idle -> OutputEnabled -> FrameBuilt -> Scheduled -> Playing
//! ```
//!
//! [`Session::stop`] returns to `Idle` from anywhere, as does dropping the session.
use hdr_signal_wire::{pack, FourCC, PixelFormat, Planes};

use crate::catalog::FormatCatalog;
use crate::config::SessionConfig;
use crate::device::{Driver, Frame, Output, WriteAccess};
use crate::error::{Error, Result};
use crate::hdr::HdrMetadata;

/// The state of the output driven by a [`Session`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    OutputEnabled,
    FrameBuilt,
    Scheduled,
    Playing,
}

/// Exclusive control over one output.
pub struct Session<O: Output> {
    output: O,
    config: SessionConfig,
    state: State,
    catalog: FormatCatalog,
    format: FourCC,
    width: u32,
    height: u32,
    /// Interleaved 16-bit `R, G, B`, `width * height * 3` samples or empty.
    pending: Vec<u16>,
    hdr: HdrMetadata,
    frame: Option<O::Frame>,
}

impl<O: Output> Session<O> {
    /// Open the output of the device at `index`.
    pub fn open<D>(driver: &D, index: usize, config: SessionConfig) -> Result<Self>
    where
        D: Driver<Output = O> + ?Sized,
    {
        let output = driver
            .open_output(index)
            .map_err(Error::Enumeration)?
            .ok_or(Error::DeviceNotFound(index))?;

        tracing::info!(index, "opened output");
        Ok(Session::with_output(output, config))
    }

    /// Take control of an already acquired output.
    ///
    /// A pixel format in `config` that does not parse leaves the device default, `R12B`.
    pub fn with_output(output: O, config: SessionConfig) -> Self {
        let format = config.pixel_format_tag().unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring configured pixel format");
            PixelFormat::Rgb12.fourcc()
        });

        Session {
            output,
            state: State::Idle,
            catalog: FormatCatalog::new(),
            format,
            width: config.width,
            height: config.height,
            pending: Vec::new(),
            hdr: config.hdr,
            frame: None,
            config,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The output, for inspection and device specific configuration.
    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// The most recently built frame.
    pub fn frame(&self) -> Option<&O::Frame> {
        self.frame.as_ref()
    }

    /// Width and height of the pending frame data.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Enable video output in the configured display mode.
    pub fn start_output(&mut self) -> Result<()> {
        if self.state != State::Idle {
            return Ok(());
        }

        let mode = self.config.mode;
        self.output.enable_video(mode).map_err(|err| {
            tracing::warn!(code = err.code(), %mode, "enabling video output failed");
            Error::EnableOutput(err)
        })?;

        tracing::info!(%mode, "video output enabled");
        self.state = State::OutputEnabled;
        Ok(())
    }

    /// Stop playback, disable video output and release the built frame.
    pub fn stop(&mut self) {
        if self.state == State::Idle {
            return;
        }

        if let Err(err) = self.output.stop_playback() {
            tracing::warn!(code = err.code(), "stopping playback failed");
        }

        if let Err(err) = self.output.disable_video() {
            tracing::warn!(code = err.code(), "disabling video output failed");
        }

        self.frame = None;
        self.state = State::Idle;
        tracing::info!("video output stopped");
    }

    /// Replace the source frame.
    ///
    /// `data` holds interleaved 16-bit `R, G, B` samples, exactly `width * height * 3` of them.
    pub fn set_frame_data(&mut self, data: &[u16], width: u32, height: u32) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidInput("frame data is empty"));
        }

        if width == 0 || height == 0 {
            return Err(Error::InvalidInput("frame dimensions must be non-zero"));
        }

        let expected = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h)?.checked_mul(3));

        if expected != Some(data.len()) {
            return Err(Error::InvalidInput(
                "frame data length does not match its dimensions",
            ));
        }

        if (width, height) != (self.width, self.height) {
            tracing::info!(width, height, "frame dimensions changed");
            self.width = width;
            self.height = height;
        }

        self.pending.clear();
        self.pending.extend_from_slice(data);
        tracing::debug!(width, height, samples = data.len(), "set frame data");
        Ok(())
    }

    /// Pack the source frame into a new device frame and attach the HDR record.
    ///
    /// On failure the previously built frame, if any, is kept.
    pub fn create_frame(&mut self) -> Result<()> {
        if self.state == State::Idle {
            return Err(Error::NoOutputEnabled);
        }

        if self.pending.is_empty() {
            return Err(Error::NoPendingData);
        }

        let (width, height, format) = (self.width, self.height, self.format);
        tracing::debug!(%format, width, height, "querying row stride");

        let stride = self.output.row_bytes_for(format, width).map_err(|source| {
            tracing::warn!(code = source.code(), %format, width, height, "row stride query failed");
            Error::RowStride { format, source }
        })?;

        tracing::debug!(%format, stride, "allocating frame");
        let mut frame = self
            .output
            .create_frame(width, height, stride, format)
            .map_err(|source| Error::FrameAllocation {
                width,
                height,
                source,
            })?;

        {
            let mut access = WriteAccess::start(&mut frame).map_err(Error::BufferAccess)?;
            let bytes = access.bytes().map_err(Error::BufferAccess)?;

            let pixel_format = PixelFormat::try_from(format)?;
            let planes = Planes::from_rgb16(&self.pending, width, height, pixel_format)?;
            pack(pixel_format, &planes, stride, bytes)?;
        }

        let report = self.hdr.attach(&mut frame);
        if !report.skipped.is_empty() {
            tracing::warn!(skipped = report.skipped.len(), "frame carries partial HDR metadata");
        }

        tracing::info!(
            %format,
            width = frame.width(),
            height = frame.height(),
            stride = frame.stride(),
            flags = frame.flags().bits(),
            "created frame"
        );

        self.frame = Some(frame);
        if self.state == State::OutputEnabled {
            self.state = State::FrameBuilt;
        }

        Ok(())
    }

    /// Queue the built frame at display time zero.
    pub fn schedule_frame(&mut self) -> Result<()> {
        let frame = self.frame.as_ref().ok_or(Error::NoFrame)?;
        let (duration, scale) = (self.config.frame_duration, self.config.time_scale);

        self.output
            .schedule(frame, 0, duration, scale)
            .map_err(|err| {
                tracing::warn!(code = err.code(), "scheduling the frame failed");
                Error::ScheduleFrame(err)
            })?;

        tracing::info!(duration, scale, "scheduled frame");
        if self.state == State::FrameBuilt {
            self.state = State::Scheduled;
        }

        Ok(())
    }

    /// Start scheduled playback at normal speed.
    pub fn start_playback(&mut self) -> Result<()> {
        if self.state == State::Idle {
            return Err(Error::NoOutputEnabled);
        }

        let scale = self.config.time_scale;
        self.output.start_playback(0, scale, 1.0).map_err(|err| {
            tracing::warn!(code = err.code(), "starting playback failed");
            Error::StartPlayback(err)
        })?;

        tracing::info!("playback started");
        self.state = State::Playing;
        Ok(())
    }

    /// Replace the HDR record applied to frames created from now on.
    pub fn set_hdr_metadata(&mut self, hdr: HdrMetadata) {
        tracing::debug!(eotf = hdr.eotf, max_cll = hdr.max_cll, "set HDR metadata");
        self.hdr = hdr;
    }

    /// Replace the HDR record by the preset with only transfer function and light levels given.
    pub fn set_eotf_metadata(&mut self, eotf: i32, max_cll: u16, max_fall: u16) {
        self.set_hdr_metadata(HdrMetadata::eotf_only(eotf, max_cll, max_fall));
    }

    pub fn hdr_metadata(&self) -> &HdrMetadata {
        &self.hdr
    }

    /// Select the format at `index` of the catalog.
    pub fn set_pixel_format(&mut self, index: usize) -> Result<()> {
        self.ensure_catalog()?;
        let format = self.catalog.tag_at(index)?;

        tracing::info!(index, %format, "set pixel format");
        self.format = format;
        Ok(())
    }

    /// The catalog index of the active format.
    ///
    /// Does not build the catalog.
    pub fn pixel_format(&self) -> Result<usize> {
        if !self.catalog.is_built() {
            return Err(Error::CatalogNotBuilt);
        }

        self.catalog
            .index_of(self.format)
            .ok_or(Error::FormatNotInCatalog(self.format))
    }

    /// The tag of the active format.
    pub fn pixel_format_tag(&self) -> FourCC {
        self.format
    }

    pub fn supported_format_count(&mut self) -> Result<usize> {
        self.ensure_catalog()?;
        self.catalog.count()
    }

    pub fn supported_format_name(&mut self, index: usize) -> Result<String> {
        self.ensure_catalog()?;
        self.catalog.name_of(index)
    }

    /// Probe the output again, invalidating all catalog indices.
    pub fn rebuild_formats(&mut self) -> Result<()> {
        self.catalog.invalidate();
        self.ensure_catalog()
    }

    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    fn ensure_catalog(&mut self) -> Result<()> {
        self.catalog.rebuild(&self.output, self.config.mode)
    }
}

impl<O: Output> Drop for Session<O> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::{Session, State};
    use crate::config::SessionConfig;
    use crate::error::Error;
    use crate::virtual_device::{VirtualDevice, VirtualDriver, VirtualOutput};
    use hdr_signal_wire::PixelFormat;

    fn session() -> Session<VirtualOutput> {
        let driver = VirtualDriver::new(vec![VirtualDevice::new("Test")]);
        Session::open(&driver, 0, SessionConfig::default()).unwrap()
    }

    #[test]
    fn lifecycle() {
        let mut session = session();
        assert_eq!(session.state(), State::Idle);

        session.start_output().unwrap();
        session.start_output().unwrap();
        assert_eq!(session.state(), State::OutputEnabled);

        session.set_frame_data(&[0xffff; 6], 2, 1).unwrap();
        session.create_frame().unwrap();
        assert_eq!(session.state(), State::FrameBuilt);

        session.schedule_frame().unwrap();
        assert_eq!(session.state(), State::Scheduled);

        session.start_playback().unwrap();
        assert_eq!(session.state(), State::Playing);
        assert!(session.output().is_playing());

        session.stop();
        assert_eq!(session.state(), State::Idle);
        assert!(session.frame().is_none());
        assert!(!session.output().is_playing());
        assert_eq!(session.output().enabled_mode(), None);
    }

    #[test]
    fn missing_device() {
        let driver = VirtualDriver::new(vec![]);
        assert!(matches!(
            Session::open(&driver, 0, SessionConfig::default()),
            Err(Error::DeviceNotFound(0))
        ));
    }

    #[test]
    fn rejects_frame_data() {
        let mut session = session();
        assert!(matches!(
            session.set_frame_data(&[], 0, 0),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            session.set_frame_data(&[0; 6], 0, 2),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            session.set_frame_data(&[0; 5], 2, 1),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(session.dimensions(), (1920, 1080));
    }

    #[test]
    fn preconditions() {
        let mut session = session();
        session.set_frame_data(&[0; 3], 1, 1).unwrap();
        assert!(matches!(session.create_frame(), Err(Error::NoOutputEnabled)));
        assert!(matches!(session.schedule_frame(), Err(Error::NoFrame)));
        assert!(matches!(session.start_playback(), Err(Error::NoOutputEnabled)));

        let mut session = self::session();
        session.start_output().unwrap();
        assert!(matches!(session.create_frame(), Err(Error::NoPendingData)));
    }

    #[test]
    fn enable_failure() {
        let mut session = session();
        session.output_mut().faults_mut().enable_video = true;

        assert!(matches!(session.start_output(), Err(Error::EnableOutput(_))));
        assert_eq!(session.state(), State::Idle);
    }

    #[test]
    fn failed_create_keeps_frame() {
        let mut session = session();
        session.start_output().unwrap();
        session.set_frame_data(&[0; 3], 1, 1).unwrap();
        session.create_frame().unwrap();

        session.output_mut().faults_mut().start_write = true;
        session.set_frame_data(&[0xffff; 6], 2, 1).unwrap();
        assert!(matches!(session.create_frame(), Err(Error::BufferAccess(_))));

        let frame = session.frame().unwrap();
        assert_eq!(frame.data().len(), frame_len(PixelFormat::Rgb12, 1, 1));
        assert_eq!(session.state(), State::FrameBuilt);
    }

    fn frame_len(format: PixelFormat, width: u32, height: usize) -> usize {
        format.nominal_row_bytes(width).unwrap() * height
    }

    #[test]
    fn pixel_format_index() {
        let mut session = session();
        assert!(matches!(session.pixel_format(), Err(Error::CatalogNotBuilt)));

        let count = session.supported_format_count().unwrap();
        assert_eq!(count, 9);
        // R12B, the default, after 2vuy v210 ARGB BGRA r210.
        assert_eq!(session.pixel_format().unwrap(), 5);

        session.set_pixel_format(0).unwrap();
        assert_eq!(session.pixel_format_tag(), PixelFormat::Yuv8.fourcc());
        assert!(matches!(
            session.set_pixel_format(count),
            Err(Error::InvalidFormatIndex { index: 9, count: 9 })
        ));
        assert_eq!(session.pixel_format_tag(), PixelFormat::Yuv8.fourcc());
    }

    #[test]
    fn format_not_in_catalog() {
        let device = VirtualDevice::new("Narrow").with_formats([PixelFormat::Bgra8.fourcc()]);
        let driver = VirtualDriver::new(vec![device]);
        let mut session = Session::open(&driver, 0, SessionConfig::default()).unwrap();

        session.rebuild_formats().unwrap();
        assert!(matches!(
            session.pixel_format(),
            Err(Error::FormatNotInCatalog(_))
        ));
        assert_eq!(
            session.supported_format_name(0).unwrap(),
            "8-bit BGRA (BGRA)"
        );
    }

    #[test]
    fn rebuild_reprobes() {
        let mut session = session();
        session.supported_format_count().unwrap();
        session.supported_format_name(0).unwrap();
        assert_eq!(session.output().probe_count(), 10);

        session.rebuild_formats().unwrap();
        assert_eq!(session.output().probe_count(), 20);

        session.output_mut().faults_mut().probe = true;
        assert!(matches!(
            session.rebuild_formats(),
            Err(Error::CapabilityQuery { .. })
        ));
        assert!(matches!(
            session.supported_format_count(),
            Err(Error::CapabilityQuery { .. })
        ));
    }

    #[test]
    fn stop_in_idle_is_noop() {
        let mut session = session();
        session.stop();
        assert_eq!(session.state(), State::Idle);
    }

    #[test]
    fn configured_format() {
        let config = SessionConfig {
            pixel_format: "v210".to_owned(),
            ..SessionConfig::default()
        };
        let driver = VirtualDriver::new(vec![VirtualDevice::new("Test")]);
        let session = Session::open(&driver, 0, config).unwrap();
        assert_eq!(session.pixel_format_tag(), PixelFormat::Yuv10.fourcc());
        assert_eq!(session.output().device().name(), "Test");
    }
}
