//! An in-memory output device.
//!
//! Frames are plain byte vectors and everything sent to the device is recorded for inspection.
//! Faults can be injected per operation to exercise the failure paths of a session.
use std::cell::Cell;
use std::collections::BTreeMap;

use hdr_signal_wire::{FourCC, PixelFormat};

use crate::device::{
    DeviceError, DeviceInfo, DisplayMode, Driver, Frame, FrameFlags, MetadataKey, MetadataKind,
    Output,
};

/// Configuration of one virtual device.
#[derive(Clone, Debug)]
pub struct VirtualDevice {
    name: String,
    formats: Vec<FourCC>,
    stride_align: usize,
    faults: Faults,
}

/// Operations of a virtual device that should fail.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Faults {
    pub probe: bool,
    pub row_bytes: bool,
    pub create_frame: bool,
    pub start_write: bool,
    pub enable_video: bool,
    pub schedule: bool,
    pub start_playback: bool,
    /// Metadata keys the frames refuse to store.
    pub metadata: Vec<MetadataKey>,
}

/// A driver exposing a fixed list of virtual devices.
#[derive(Clone, Debug)]
pub struct VirtualDriver {
    devices: Vec<VirtualDevice>,
    api_version: Result<Option<u32>, DeviceError>,
}

/// The output of a [`VirtualDevice`].
#[derive(Debug)]
pub struct VirtualOutput {
    device: VirtualDevice,
    enabled: Option<DisplayMode>,
    scheduled: Vec<Scheduled>,
    playing: bool,
    probes: Cell<usize>,
}

/// A snapshot of a frame handed to [`Output::schedule`].
#[derive(Clone, Debug, PartialEq)]
pub struct Scheduled {
    pub time: i64,
    pub duration: i64,
    pub scale: i64,
    pub flags: FrameFlags,
    pub data: Vec<u8>,
}

/// A frame backed by a byte vector.
#[derive(Clone, Debug)]
pub struct VirtualFrame {
    width: u32,
    height: u32,
    stride: usize,
    format: FourCC,
    flags: FrameFlags,
    data: Vec<u8>,
    writing: bool,
    metadata: BTreeMap<MetadataKey, MetadataValue>,
    faults: Faults,
}

/// A stored metadata value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetadataValue {
    Int(i64),
    Float(f64),
}

impl VirtualDevice {
    /// A device supporting every packable format with unpadded rows.
    pub fn new(name: impl Into<String>) -> Self {
        VirtualDevice {
            name: name.into(),
            formats: PixelFormat::ALL
                .into_iter()
                .filter(|format| format.is_packable())
                .map(PixelFormat::fourcc)
                .collect(),
            stride_align: 1,
            faults: Faults::default(),
        }
    }

    /// Replace the formats the device accepts.
    pub fn with_formats(mut self, formats: impl IntoIterator<Item = FourCC>) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    /// Round every row up to a multiple of `align` bytes.
    pub fn with_stride_align(mut self, align: usize) -> Self {
        self.stride_align = align.max(1);
        self
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl VirtualDriver {
    pub fn new(devices: Vec<VirtualDevice>) -> Self {
        VirtualDriver {
            devices,
            api_version: Ok(Some(0x0c04_0100)),
        }
    }

    /// Override the reported driver version, `None` for no API information.
    pub fn with_api_version(mut self, version: Option<u32>) -> Self {
        self.api_version = Ok(version);
        self
    }

    /// Fail the driver version query with `err`.
    pub fn with_api_version_error(mut self, err: DeviceError) -> Self {
        self.api_version = Err(err);
        self
    }
}

impl Driver for VirtualDriver {
    type Output = VirtualOutput;

    fn devices(&self) -> Result<Vec<DeviceInfo>, DeviceError> {
        Ok(self
            .devices
            .iter()
            .map(|device| DeviceInfo {
                display_name: device.name.clone(),
            })
            .collect())
    }

    fn open_output(&self, index: usize) -> Result<Option<VirtualOutput>, DeviceError> {
        Ok(self.devices.get(index).map(|device| VirtualOutput {
            device: device.clone(),
            enabled: None,
            scheduled: Vec::new(),
            playing: false,
            probes: Cell::new(0),
        }))
    }

    fn api_version(&self) -> Result<Option<u32>, DeviceError> {
        self.api_version
    }

    fn sdk_version(&self) -> &'static str {
        "12.4"
    }
}

impl VirtualOutput {
    pub fn device(&self) -> &VirtualDevice {
        &self.device
    }

    /// Change the injected faults of an opened output. Frames created later inherit them.
    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.device.faults
    }

    pub fn enabled_mode(&self) -> Option<DisplayMode> {
        self.enabled
    }

    pub fn scheduled(&self) -> &[Scheduled] {
        &self.scheduled
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// How many capability queries have been answered.
    pub fn probe_count(&self) -> usize {
        self.probes.get()
    }
}

impl Output for VirtualOutput {
    type Frame = VirtualFrame;

    fn supports_format(&self, _: DisplayMode, format: FourCC) -> Result<bool, DeviceError> {
        if self.device.faults.probe {
            return Err(DeviceError::FAIL);
        }

        self.probes.set(self.probes.get() + 1);
        Ok(self.device.formats.contains(&format))
    }

    fn row_bytes_for(&self, format: FourCC, width: u32) -> Result<usize, DeviceError> {
        if self.device.faults.row_bytes {
            return Err(DeviceError::FAIL);
        }

        let nominal = PixelFormat::from_fourcc(format)
            .and_then(|format| format.nominal_row_bytes(width))
            .ok_or(DeviceError::INVALID_ARG)?;

        let align = self.device.stride_align;
        nominal
            .div_ceil(align)
            .checked_mul(align)
            .ok_or(DeviceError::INVALID_ARG)
    }

    fn create_frame(
        &mut self,
        width: u32,
        height: u32,
        stride: usize,
        format: FourCC,
    ) -> Result<VirtualFrame, DeviceError> {
        if self.device.faults.create_frame {
            return Err(DeviceError::OUT_OF_MEMORY);
        }

        let len = usize::try_from(height)
            .ok()
            .and_then(|height| stride.checked_mul(height))
            .ok_or(DeviceError::INVALID_ARG)?;

        Ok(VirtualFrame {
            width,
            height,
            stride,
            format,
            flags: FrameFlags::default(),
            data: vec![0; len],
            writing: false,
            metadata: BTreeMap::new(),
            faults: self.device.faults.clone(),
        })
    }

    fn enable_video(&mut self, mode: DisplayMode) -> Result<(), DeviceError> {
        if self.device.faults.enable_video {
            return Err(DeviceError::FAIL);
        }

        if self.enabled.is_some() {
            return Err(DeviceError::ACCESS_DENIED);
        }

        self.enabled = Some(mode);
        Ok(())
    }

    fn disable_video(&mut self) -> Result<(), DeviceError> {
        self.enabled = None;
        Ok(())
    }

    fn schedule(
        &mut self,
        frame: &VirtualFrame,
        time: i64,
        duration: i64,
        scale: i64,
    ) -> Result<(), DeviceError> {
        if self.enabled.is_none() {
            return Err(DeviceError::ACCESS_DENIED);
        }

        if self.device.faults.schedule {
            return Err(DeviceError::FAIL);
        }

        self.scheduled.push(Scheduled {
            time,
            duration,
            scale,
            flags: frame.flags,
            data: frame.data.clone(),
        });

        Ok(())
    }

    fn start_playback(&mut self, _: i64, _: i64, _: f64) -> Result<(), DeviceError> {
        if self.enabled.is_none() {
            return Err(DeviceError::ACCESS_DENIED);
        }

        if self.device.faults.start_playback {
            return Err(DeviceError::FAIL);
        }

        self.playing = true;
        Ok(())
    }

    fn stop_playback(&mut self) -> Result<(), DeviceError> {
        self.playing = false;
        Ok(())
    }
}

impl VirtualFrame {
    /// The frame buffer, whether or not write access is held.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_writing(&self) -> bool {
        self.writing
    }

    pub fn metadata(&self, key: MetadataKey) -> Option<MetadataValue> {
        self.metadata.get(&key).copied()
    }

    /// The number of metadata fields currently set.
    pub fn metadata_len(&self) -> usize {
        self.metadata.len()
    }

    fn store(&mut self, key: MetadataKey, value: MetadataValue) -> Result<(), DeviceError> {
        if self.faults.metadata.contains(&key) {
            return Err(DeviceError::FAIL);
        }

        let kind = match value {
            MetadataValue::Int(_) => MetadataKind::Int,
            MetadataValue::Float(_) => MetadataKind::Float,
        };

        if key.kind() != kind {
            return Err(DeviceError::INVALID_ARG);
        }

        self.metadata.insert(key, value);
        Ok(())
    }
}

impl Frame for VirtualFrame {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn stride(&self) -> usize {
        self.stride
    }

    fn format(&self) -> FourCC {
        self.format
    }

    fn flags(&self) -> FrameFlags {
        self.flags
    }

    fn set_flags(&mut self, flags: FrameFlags) {
        self.flags = flags;
    }

    fn start_write(&mut self) -> Result<(), DeviceError> {
        if self.faults.start_write {
            return Err(DeviceError::ACCESS_DENIED);
        }

        if self.writing {
            return Err(DeviceError::ACCESS_DENIED);
        }

        self.writing = true;
        Ok(())
    }

    fn bytes_mut(&mut self) -> Result<&mut [u8], DeviceError> {
        if !self.writing {
            return Err(DeviceError::ACCESS_DENIED);
        }

        Ok(&mut self.data)
    }

    fn end_write(&mut self) -> Result<(), DeviceError> {
        if !self.writing {
            return Err(DeviceError::ACCESS_DENIED);
        }

        self.writing = false;
        Ok(())
    }

    fn set_int(&mut self, key: MetadataKey, value: i64) -> Result<(), DeviceError> {
        self.store(key, MetadataValue::Int(value))
    }

    fn set_float(&mut self, key: MetadataKey, value: f64) -> Result<(), DeviceError> {
        self.store(key, MetadataValue::Float(value))
    }

    fn clear(&mut self, key: MetadataKey) -> Result<(), DeviceError> {
        if self.faults.metadata.contains(&key) {
            return Err(DeviceError::FAIL);
        }

        self.metadata.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Faults, MetadataValue, VirtualDevice, VirtualDriver};
    use crate::device::{DeviceError, DisplayMode, Driver, Frame, MetadataKey, Output};
    use hdr_signal_wire::{FourCC, PixelFormat};

    #[test]
    fn enumerates() {
        let driver = VirtualDriver::new(vec![VirtualDevice::new("A"), VirtualDevice::new("B")]);
        let names: Vec<_> = driver
            .devices()
            .unwrap()
            .into_iter()
            .map(|info| info.display_name)
            .collect();

        assert_eq!(names, ["A", "B"]);
        assert!(driver.open_output(2).unwrap().is_none());
        assert_eq!(driver.sdk_version(), "12.4");
    }

    #[test]
    fn row_bytes_aligned() {
        let device = VirtualDevice::new("Padded").with_stride_align(64);
        let driver = VirtualDriver::new(vec![device]);
        let output = driver.open_output(0).unwrap().unwrap();

        let bgra = PixelFormat::Bgra8.fourcc();
        assert_eq!(output.row_bytes_for(bgra, 3).unwrap(), 64);
        assert_eq!(output.row_bytes_for(bgra, 16).unwrap(), 64);
        assert_eq!(output.row_bytes_for(bgra, 17).unwrap(), 128);
        assert_eq!(
            output.row_bytes_for(FourCC::from_bytes(*b"xxxx"), 16),
            Err(DeviceError::INVALID_ARG)
        );
    }

    #[test]
    fn probes_formats() {
        let device = VirtualDevice::new("Narrow").with_formats([PixelFormat::Yuv10.fourcc()]);
        let driver = VirtualDriver::new(vec![device]);
        let output = driver.open_output(0).unwrap().unwrap();
        let mode = DisplayMode::Hd1080p30;

        assert!(output
            .supports_format(mode, PixelFormat::Yuv10.fourcc())
            .unwrap());
        assert!(!output
            .supports_format(mode, PixelFormat::Bgra8.fourcc())
            .unwrap());
        assert_eq!(output.probe_count(), 2);
    }

    #[test]
    fn playback_requires_video() {
        let driver = VirtualDriver::new(vec![VirtualDevice::new("Test")]);
        let mut output = driver.open_output(0).unwrap().unwrap();

        assert_eq!(
            output.start_playback(0, 30000, 1.0),
            Err(DeviceError::ACCESS_DENIED)
        );

        output.enable_video(DisplayMode::Hd1080p30).unwrap();
        assert_eq!(
            output.enable_video(DisplayMode::Hd1080p30),
            Err(DeviceError::ACCESS_DENIED)
        );
        output.start_playback(0, 30000, 1.0).unwrap();
        assert!(output.is_playing());

        output.stop_playback().unwrap();
        output.disable_video().unwrap();
        assert!(!output.is_playing());
        assert_eq!(output.enabled_mode(), None);
    }

    #[test]
    fn metadata_store() {
        let faults = Faults {
            metadata: vec![MetadataKey::WhitePointX],
            ..Faults::default()
        };
        let device = VirtualDevice::new("Test").with_faults(faults);
        let driver = VirtualDriver::new(vec![device]);
        let mut output = driver.open_output(0).unwrap().unwrap();
        let mut frame = output
            .create_frame(1, 1, 4, PixelFormat::Bgra8.fourcc())
            .unwrap();

        frame.set_int(MetadataKey::Eotf, 2).unwrap();
        frame.set_float(MetadataKey::WhitePointY, 0.329).unwrap();
        assert_eq!(
            frame.set_float(MetadataKey::Eotf, 2.0),
            Err(DeviceError::INVALID_ARG)
        );
        assert_eq!(
            frame.set_float(MetadataKey::WhitePointX, 0.3127),
            Err(DeviceError::FAIL)
        );

        assert_eq!(frame.metadata(MetadataKey::Eotf), Some(MetadataValue::Int(2)));
        assert_eq!(frame.metadata_len(), 2);

        frame.clear(MetadataKey::WhitePointY).unwrap();
        frame.clear(MetadataKey::WhitePointY).unwrap();
        assert_eq!(frame.metadata_len(), 1);
    }
}
