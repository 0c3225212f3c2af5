//! Static HDR metadata attached to every created frame.
use serde::{Deserialize, Serialize};

use crate::device::{Frame, FrameFlags, MetadataKey};

/// A CIE 1931 chromaticity coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chromaticity {
    pub x: f64,
    pub y: f64,
}

/// The transfer function and mastering display color volume of the signal (CEA-861.3, SMPTE
/// ST 2086).
///
/// The record is never validated. Fields outside their domain are skipped or passed through when
/// attached to a frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HdrMetadata {
    /// The EOTF code, `0..=7`.
    pub eotf: i32,
    pub red: Chromaticity,
    pub green: Chromaticity,
    pub blue: Chromaticity,
    pub white_point: Chromaticity,
    /// Maximum mastering display luminance in cd/m².
    pub max_mastering_luminance: f64,
    /// Minimum mastering display luminance in cd/m².
    pub min_mastering_luminance: f64,
    /// Maximum content light level in cd/m².
    pub max_cll: u16,
    /// Maximum frame-average light level in cd/m².
    pub max_fall: u16,
}

/// Which fields of a record could not be attached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttachReport {
    pub skipped: Vec<MetadataKey>,
}

impl HdrMetadata {
    pub const EOTF_SDR: i32 = 0;
    pub const EOTF_HDR: i32 = 1;
    /// SMPTE ST 2084, the only transfer function carrying mastering display primaries.
    pub const EOTF_PQ: i32 = 2;
    pub const EOTF_HLG: i32 = 3;

    /// BT.2020 primaries, D65 white, PQ mastered at 1000 cd/m².
    pub const REC2020_PQ: Self = HdrMetadata {
        eotf: Self::EOTF_PQ,
        red: Chromaticity { x: 0.708, y: 0.292 },
        green: Chromaticity { x: 0.170, y: 0.797 },
        blue: Chromaticity { x: 0.131, y: 0.046 },
        white_point: Chromaticity {
            x: 0.3127,
            y: 0.3290,
        },
        max_mastering_luminance: 1000.0,
        min_mastering_luminance: 0.0001,
        max_cll: 2000,
        max_fall: 400,
    };

    /// The preset with only the transfer function and light levels replaced.
    pub const fn eotf_only(eotf: i32, max_cll: u16, max_fall: u16) -> Self {
        HdrMetadata {
            eotf,
            max_cll,
            max_fall,
            ..Self::REC2020_PQ
        }
    }

    pub const fn is_pq(&self) -> bool {
        self.eotf == Self::EOTF_PQ
    }

    /// The SMPTE ST 2086 fields with their values, in attach order.
    fn mastering(&self) -> [(MetadataKey, f64); 10] {
        [
            (MetadataKey::DisplayPrimariesRedX, self.red.x),
            (MetadataKey::DisplayPrimariesRedY, self.red.y),
            (MetadataKey::DisplayPrimariesGreenX, self.green.x),
            (MetadataKey::DisplayPrimariesGreenY, self.green.y),
            (MetadataKey::DisplayPrimariesBlueX, self.blue.x),
            (MetadataKey::DisplayPrimariesBlueY, self.blue.y),
            (MetadataKey::WhitePointX, self.white_point.x),
            (MetadataKey::WhitePointY, self.white_point.y),
            (
                MetadataKey::MaxDisplayMasteringLuminance,
                self.max_mastering_luminance,
            ),
            (
                MetadataKey::MinDisplayMasteringLuminance,
                self.min_mastering_luminance,
            ),
        ]
    }

    /// The content light levels, unset while zero.
    fn light_levels(&self) -> [(MetadataKey, Option<f64>); 2] {
        let level = |value: u16| (value > 0).then(|| f64::from(value));
        [
            (MetadataKey::MaxContentLightLevel, level(self.max_cll)),
            (MetadataKey::MaxFrameAverageLightLevel, level(self.max_fall)),
        ]
    }

    /// Write the record into the metadata of `frame` and flag it as carrying HDR metadata.
    ///
    /// A PQ record sets the mastering display primaries and luminance, any other transfer function
    /// clears them. MaxCLL and MaxFALL are set for every transfer function when non-zero and
    /// cleared otherwise. Each field is attempted on its own, failures are logged and reported but
    /// never abort.
    pub fn attach<F: Frame + ?Sized>(&self, frame: &mut F) -> AttachReport {
        let mut report = AttachReport::default();

        if (0..=7).contains(&self.eotf) {
            if let Err(err) = frame.set_int(MetadataKey::Eotf, i64::from(self.eotf)) {
                tracing::warn!(code = err.code(), eotf = self.eotf, "setting EOTF failed");
                report.skipped.push(MetadataKey::Eotf);
            }
        } else {
            tracing::warn!(eotf = self.eotf, "EOTF outside of 0..=7, not attached");
            report.skipped.push(MetadataKey::Eotf);
        }

        let pq = self.is_pq();
        let mastering = self
            .mastering()
            .map(|(key, value)| (key, pq.then_some(value)));

        for (key, value) in mastering.into_iter().chain(self.light_levels()) {
            let result = match value {
                Some(value) => frame.set_float(key, value),
                None => frame.clear(key),
            };

            if let Err(err) = result {
                tracing::warn!(code = err.code(), ?key, pq, "HDR metadata field not applied");
                report.skipped.push(key);
            }
        }

        frame.set_flags(frame.flags() | FrameFlags::CONTAINS_HDR_METADATA);
        report
    }
}

impl Default for HdrMetadata {
    fn default() -> Self {
        Self::REC2020_PQ
    }
}

#[cfg(test)]
mod tests {
    use super::HdrMetadata;
    use crate::device::{Frame, FrameFlags, MetadataKey, Output};
    use crate::virtual_device::{Faults, MetadataValue, VirtualDevice, VirtualDriver, VirtualFrame};
    use crate::Driver;
    use hdr_signal_wire::PixelFormat;

    fn frame(faults: Faults) -> VirtualFrame {
        let driver = VirtualDriver::new(vec![VirtualDevice::new("Test").with_faults(faults)]);
        let mut output = driver.open_output(0).unwrap().unwrap();
        output
            .create_frame(1, 1, 4, PixelFormat::Bgra8.fourcc())
            .unwrap()
    }

    #[test]
    fn preset() {
        let hdr = HdrMetadata::default();
        assert!(hdr.is_pq());
        assert_eq!(hdr.max_cll, 2000);
        assert_eq!(hdr.max_fall, 400);
        assert_eq!(hdr.white_point.x, 0.3127);

        let legacy = HdrMetadata::eotf_only(3, 1000, 100);
        assert_eq!(legacy.eotf, HdrMetadata::EOTF_HLG);
        assert_eq!(legacy.red, hdr.red);
        assert_eq!(legacy.max_cll, 1000);
    }

    #[test]
    fn pq_sets_everything() {
        let mut frame = frame(Faults::default());
        let report = HdrMetadata::default().attach(&mut frame);

        assert!(report.skipped.is_empty());
        assert_eq!(frame.metadata_len(), MetadataKey::ALL.len());
        assert_eq!(
            frame.metadata(MetadataKey::MinDisplayMasteringLuminance),
            Some(MetadataValue::Float(0.0001))
        );
        assert!(frame.flags().contains(FrameFlags::CONTAINS_HDR_METADATA));
    }

    #[test]
    fn other_eotf_clears() {
        let mut frame = frame(Faults::default());
        HdrMetadata::default().attach(&mut frame);
        HdrMetadata::eotf_only(HdrMetadata::EOTF_SDR, 0, 0).attach(&mut frame);

        assert_eq!(frame.metadata_len(), 1);
        assert_eq!(frame.metadata(MetadataKey::Eotf), Some(MetadataValue::Int(0)));
        assert!(frame.flags().contains(FrameFlags::CONTAINS_HDR_METADATA));
    }

    #[test]
    fn light_levels_for_any_eotf() {
        let mut frame = frame(Faults::default());
        HdrMetadata::default().attach(&mut frame);
        HdrMetadata::eotf_only(HdrMetadata::EOTF_HLG, 1000, 0).attach(&mut frame);

        assert_eq!(frame.metadata_len(), 2);
        assert_eq!(
            frame.metadata(MetadataKey::MaxContentLightLevel),
            Some(MetadataValue::Float(1000.0))
        );
        assert_eq!(frame.metadata(MetadataKey::MaxFrameAverageLightLevel), None);
        assert_eq!(frame.metadata(MetadataKey::WhitePointX), None);

        // Zero levels are not attached, not even for PQ.
        HdrMetadata::eotf_only(HdrMetadata::EOTF_PQ, 0, 400).attach(&mut frame);
        assert_eq!(frame.metadata_len(), MetadataKey::ALL.len() - 1);
        assert_eq!(frame.metadata(MetadataKey::MaxContentLightLevel), None);
    }

    #[test]
    fn eotf_out_of_range() {
        let mut frame = frame(Faults::default());
        let record = HdrMetadata {
            eotf: 9,
            ..HdrMetadata::default()
        };

        let report = record.attach(&mut frame);
        assert_eq!(report.skipped, [MetadataKey::Eotf]);
        assert_eq!(frame.metadata(MetadataKey::Eotf), None);
        // Not PQ, so only the light levels remain.
        assert_eq!(frame.metadata_len(), 2);
        assert_eq!(frame.metadata(MetadataKey::WhitePointX), None);
    }

    #[test]
    fn failures_do_not_abort() {
        let mut frame = frame(Faults {
            metadata: vec![MetadataKey::Eotf, MetadataKey::DisplayPrimariesGreenY],
            ..Faults::default()
        });

        let report = HdrMetadata::default().attach(&mut frame);
        assert_eq!(
            report.skipped,
            [MetadataKey::Eotf, MetadataKey::DisplayPrimariesGreenY]
        );
        assert_eq!(frame.metadata_len(), MetadataKey::ALL.len() - 2);
        assert!(frame.flags().contains(FrameFlags::CONTAINS_HDR_METADATA));
    }
}
