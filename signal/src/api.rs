//! Status code entry points for callers across a foreign function boundary.
//!
//! Every function returns [`status::OK`] or one of the negative codes of [`crate::status`].
//! A missing session handle is `None`, reported as invalid input. Names are written into caller
//! buffers NUL-terminated and truncated to fit.
use crate::device::{Driver, Output};
use crate::error::{status, Error, Result};
use crate::hdr::HdrMetadata;
use crate::session::Session;
use crate::version;
use crate::SessionConfig;

fn code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => status::OK,
        Err(err) => {
            tracing::debug!(%err, status = err.status(), "call failed");
            err.status()
        }
    }
}

fn with<O: Output>(
    session: Option<&mut Session<O>>,
    f: impl FnOnce(&mut Session<O>) -> Result<()>,
) -> i32 {
    match session {
        Some(session) => code(f(session)),
        None => status::INVALID_INPUT,
    }
}

/// Copy `name` into `out`, truncated at a character boundary and NUL-terminated.
fn copy_name(name: &str, out: &mut [u8]) -> i32 {
    let Some(room) = out.len().checked_sub(1) else {
        return status::INVALID_INPUT;
    };

    let len = (0..=name.len().min(room))
        .rev()
        .find(|&at| name.is_char_boundary(at))
        .unwrap_or(0);
    out[..len].copy_from_slice(&name.as_bytes()[..len]);
    out[len] = 0;
    status::OK
}

/// The number of attached devices, zero if enumeration fails.
pub fn get_device_count<D: Driver + ?Sized>(driver: &D) -> usize {
    match driver.devices() {
        Ok(devices) => devices.len(),
        Err(err) => {
            tracing::warn!(code = err.code(), "device enumeration failed");
            0
        }
    }
}

pub fn get_device_name_by_index<D: Driver + ?Sized>(
    driver: &D,
    index: usize,
    out: &mut [u8],
) -> i32 {
    if out.is_empty() {
        return status::INVALID_INPUT;
    }

    let devices = match driver.devices() {
        Ok(devices) => devices,
        Err(err) => return Error::Enumeration(err).status(),
    };

    match devices.get(index) {
        Some(info) => copy_name(&info.display_name, out),
        None => Error::DeviceNotFound(index).status(),
    }
}

/// Open the output of the device at `index` with the default configuration.
pub fn open_output_by_index<D: Driver + ?Sized>(
    driver: &D,
    index: usize,
) -> Option<Session<D::Output>> {
    match Session::open(driver, index, SessionConfig::default()) {
        Ok(session) => Some(session),
        Err(err) => {
            tracing::warn!(%err, index, "opening output failed");
            None
        }
    }
}

/// Release a session, stopping its output.
pub fn close<O: Output>(session: Option<Session<O>>) {
    drop(session);
}

pub fn start_output<O: Output>(session: Option<&mut Session<O>>) -> i32 {
    with(session, Session::start_output)
}

pub fn stop_output<O: Output>(session: Option<&mut Session<O>>) -> i32 {
    with(session, |session| {
        session.stop();
        Ok(())
    })
}

pub fn set_frame_data<O: Output>(
    session: Option<&mut Session<O>>,
    data: Option<&[u16]>,
    width: i32,
    height: i32,
) -> i32 {
    let (Some(data), Ok(width), Ok(height)) = (data, u32::try_from(width), u32::try_from(height))
    else {
        return status::INVALID_INPUT;
    };

    with(session, |session| session.set_frame_data(data, width, height))
}

pub fn create_frame<O: Output>(session: Option<&mut Session<O>>) -> i32 {
    with(session, Session::create_frame)
}

pub fn schedule_frame<O: Output>(session: Option<&mut Session<O>>) -> i32 {
    with(session, Session::schedule_frame)
}

pub fn start_playback<O: Output>(session: Option<&mut Session<O>>) -> i32 {
    with(session, Session::start_playback)
}

pub fn set_hdr_metadata<O: Output>(session: Option<&mut Session<O>>, hdr: &HdrMetadata) -> i32 {
    with(session, |session| {
        session.set_hdr_metadata(*hdr);
        Ok(())
    })
}

pub fn set_eotf_metadata<O: Output>(
    session: Option<&mut Session<O>>,
    eotf: i32,
    max_cll: u16,
    max_fall: u16,
) -> i32 {
    with(session, |session| {
        session.set_eotf_metadata(eotf, max_cll, max_fall);
        Ok(())
    })
}

pub fn set_pixel_format<O: Output>(session: Option<&mut Session<O>>, index: i32) -> i32 {
    let Ok(index) = usize::try_from(index) else {
        return status::INVALID_FORMAT_INDEX;
    };

    with(session, |session| session.set_pixel_format(index))
}

/// The catalog index of the active format, or a negative status.
pub fn get_pixel_format<O: Output>(session: Option<&Session<O>>) -> i32 {
    let Some(session) = session else {
        return status::INVALID_INPUT;
    };

    match session.pixel_format() {
        Ok(index) => i32::try_from(index).unwrap_or(status::INVALID_FORMAT_INDEX),
        Err(err) => err.status(),
    }
}

/// The number of supported formats, or a negative status.
pub fn get_supported_pixel_format_count<O: Output>(session: Option<&mut Session<O>>) -> i32 {
    let Some(session) = session else {
        return status::INVALID_INPUT;
    };

    match session.supported_format_count() {
        Ok(count) => i32::try_from(count).unwrap_or(i32::MAX),
        Err(err) => err.status(),
    }
}

pub fn get_supported_pixel_format_name<O: Output>(
    session: Option<&mut Session<O>>,
    index: i32,
    out: &mut [u8],
) -> i32 {
    if out.is_empty() {
        return status::INVALID_INPUT;
    }

    let Ok(index) = usize::try_from(index) else {
        return status::INVALID_FORMAT_INDEX;
    };

    let Some(session) = session else {
        return status::INVALID_INPUT;
    };

    match session.supported_format_name(index) {
        Ok(name) => copy_name(&name, out),
        Err(err) => err.status(),
    }
}

pub fn get_driver_version<D: Driver + ?Sized>(driver: &D) -> &'static str {
    version::driver_version(driver)
}

pub fn get_sdk_version<D: Driver + ?Sized>(driver: &D) -> &'static str {
    version::sdk_version(driver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_device::{VirtualDevice, VirtualDriver, VirtualOutput};

    fn driver() -> VirtualDriver {
        VirtualDriver::new(vec![VirtualDevice::new("Virtual Out 4K")])
    }

    #[test]
    fn names_truncate() {
        let driver = driver();
        let mut name = [0xffu8; 8];

        assert_eq!(get_device_name_by_index(&driver, 0, &mut name), status::OK);
        assert_eq!(&name, b"Virtual\0");
        assert_eq!(get_device_name_by_index(&driver, 0, &mut []), status::INVALID_INPUT);
        assert_eq!(
            get_device_name_by_index(&driver, 1, &mut name),
            status::DEVICE_NOT_FOUND
        );
        assert_eq!(get_device_count(&driver), 1);
    }

    #[test]
    fn names_truncate_whole_characters() {
        let driver = VirtualDriver::new(vec![VirtualDevice::new("Sortie vidéo")]);
        let mut name = [0xffu8; 12];

        // `é` spans bytes 10 and 11, only 11 bytes fit.
        assert_eq!(get_device_name_by_index(&driver, 0, &mut name), status::OK);
        assert_eq!(&name[..11], b"Sortie vid\0");

        let mut name = [0xffu8; 13];
        assert_eq!(get_device_name_by_index(&driver, 0, &mut name), status::OK);
        assert_eq!(&name[..12], "Sortie vidé".as_bytes());
        assert_eq!(name[12], 0);
    }

    #[test]
    fn missing_handle() {
        let none = || None::<&mut Session<VirtualOutput>>;

        assert_eq!(start_output(none()), status::INVALID_INPUT);
        assert_eq!(create_frame(none()), status::INVALID_INPUT);
        assert_eq!(set_eotf_metadata(none(), 2, 1000, 400), status::INVALID_INPUT);
        assert_eq!(get_pixel_format::<VirtualOutput>(None), status::INVALID_INPUT);
        assert_eq!(
            get_supported_pixel_format_count(none()),
            status::INVALID_INPUT
        );
    }

    #[test]
    fn drives_session() {
        let driver = driver();
        let mut session = open_output_by_index(&driver, 0);
        assert!(open_output_by_index(&driver, 3).is_none());

        let data = [0u16; 12];
        assert_eq!(
            set_frame_data(session.as_mut(), Some(&data), 2, 2),
            status::OK
        );
        assert_eq!(
            set_frame_data(session.as_mut(), Some(&data), -2, 2),
            status::INVALID_INPUT
        );
        assert_eq!(
            set_frame_data(session.as_mut(), None, 2, 2),
            status::INVALID_INPUT
        );
        assert_eq!(create_frame(session.as_mut()), status::NO_OUTPUT_ENABLED);

        assert_eq!(start_output(session.as_mut()), status::OK);
        assert_eq!(create_frame(session.as_mut()), status::OK);
        assert_eq!(schedule_frame(session.as_mut()), status::OK);
        assert_eq!(start_playback(session.as_mut()), status::OK);
        assert_eq!(stop_output(session.as_mut()), status::OK);
        assert_eq!(schedule_frame(session.as_mut()), status::NO_FRAME);

        close(session);
    }

    #[test]
    fn formats() {
        let driver = driver();
        let mut session = open_output_by_index(&driver, 0);

        assert_eq!(get_pixel_format(session.as_ref()), status::CATALOG_NOT_BUILT);
        assert_eq!(get_supported_pixel_format_count(session.as_mut()), 9);
        assert_eq!(get_pixel_format(session.as_ref()), 5);

        let mut name = [0u8; 64];
        assert_eq!(
            get_supported_pixel_format_name(session.as_mut(), 1, &mut name),
            status::OK
        );
        assert!(name.starts_with(b"10-bit YUV (v210)\0"));

        assert_eq!(
            set_pixel_format(session.as_mut(), -1),
            status::INVALID_FORMAT_INDEX
        );
        assert_eq!(
            set_pixel_format(session.as_mut(), 9),
            status::INVALID_FORMAT_INDEX
        );
        assert_eq!(set_pixel_format(session.as_mut(), 4), status::OK);
        assert_eq!(get_pixel_format(session.as_ref()), 4);
    }

    #[test]
    fn versions() {
        let driver = driver();
        assert_eq!(get_driver_version(&driver), "12.4.1");
        assert_eq!(get_sdk_version(&driver), "12.4");
    }
}
