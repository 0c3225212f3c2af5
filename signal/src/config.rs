//! Session defaults, loadable from TOML.
//!
//! ```toml
//! mode = "HD1080p30"
//! pixel_format = "R12B"
//! width = 1920
//! height = 1080
//!
//! [hdr]
//! eotf = 2
//! max_cll = 1000
//! ```
use std::path::Path;

use hdr_signal_wire::{FourCC, PixelFormat};
use serde::{Deserialize, Serialize};

use crate::device::DisplayMode;
use crate::hdr::HdrMetadata;

/// Configuration of a [`crate::Session`]. Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// The display mode video output is enabled in, and formats are probed against.
    pub mode: DisplayMode,
    /// Frame dimensions before the first frame data is set.
    pub width: u32,
    pub height: u32,
    /// The initially active format, as its 4CC or its decimal tag.
    pub pixel_format: String,
    /// Display duration of the scheduled frame, in units of `1 / time_scale` seconds.
    pub frame_duration: i64,
    pub time_scale: i64,
    pub hdr: HdrMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading configuration failed")]
    Io(#[from] std::io::Error),
    #[error("parsing configuration failed")]
    Parse(#[from] toml::de::Error),
    #[error("`{0}` is not a pixel format tag")]
    PixelFormat(String),
}

impl SessionConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(content)?;
        config.pixel_format_tag()?;
        Ok(config)
    }

    /// Parse [`SessionConfig::pixel_format`].
    ///
    /// Four characters are read as a 4CC, anything else as a decimal tag such as `32`. The tag
    /// need not be a known format, the catalog decides what a device accepts.
    pub fn pixel_format_tag(&self) -> Result<FourCC, ConfigError> {
        let name = self.pixel_format.as_str();

        if let Ok(bytes) = <[u8; 4]>::try_from(name.as_bytes()) {
            return Ok(FourCC::from_bytes(bytes));
        }

        name.parse::<u32>()
            .map(FourCC::new)
            .map_err(|_| ConfigError::PixelFormat(name.to_owned()))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let (width, height) = DisplayMode::Hd1080p30.dimensions();

        SessionConfig {
            mode: DisplayMode::Hd1080p30,
            width,
            height,
            pixel_format: PixelFormat::Rgb12.fourcc().to_string(),
            frame_duration: 1000,
            time_scale: 30000,
            hdr: HdrMetadata::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{ConfigError, SessionConfig};
    use crate::device::DisplayMode;
    use crate::hdr::HdrMetadata;
    use hdr_signal_wire::PixelFormat;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.mode, DisplayMode::Hd1080p30);
        assert_eq!(config.pixel_format_tag().unwrap(), PixelFormat::Rgb12.fourcc());
        assert_eq!((config.frame_duration, config.time_scale), (1000, 30000));
    }

    #[test]
    fn partial_hdr() {
        let config = SessionConfig::from_toml_str(
            r#"
            mode = "4K2160p30"
            pixel_format = "v210"

            [hdr]
            eotf = 3
            max_cll = 1000
            white_point = { x = 0.3127, y = 0.329 }
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, DisplayMode::Uhd2160p30);
        assert_eq!(config.width, 1920);
        assert_eq!(config.pixel_format_tag().unwrap(), PixelFormat::Yuv10.fourcc());
        assert_eq!(config.hdr.eotf, HdrMetadata::EOTF_HLG);
        assert_eq!(config.hdr.max_cll, 1000);
        assert_eq!(config.hdr.max_fall, 400);
        assert_eq!(config.hdr.red, HdrMetadata::REC2020_PQ.red);
    }

    #[test]
    fn numeric_tag() {
        let config = SessionConfig::from_toml_str("pixel_format = \"32\"").unwrap();
        assert_eq!(config.pixel_format_tag().unwrap(), PixelFormat::Argb8.fourcc());
    }

    #[test]
    fn rejects() {
        assert!(matches!(
            SessionConfig::from_toml_str("pixel_format = \"twelve\""),
            Err(ConfigError::PixelFormat(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml_str("mode = \"HD999p1\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "width = 1280\nheight = 720\nmode = \"HD720p60\"").unwrap();

        let config = SessionConfig::from_file(file.path()).unwrap();
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.mode, DisplayMode::Hd720p60);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            SessionConfig::from_file(missing),
            Err(ConfigError::Io(_))
        ));
    }
}
