//! Driver and interface version strings.
use std::sync::OnceLock;

use crate::device::Driver;

static DRIVER_VERSION: OnceLock<String> = OnceLock::new();

/// The installed driver version as `major.minor.patch`.
///
/// Queried once per process, later calls return the first answer whatever driver they pass.
/// `unknown` if the query failed, `unavailable` if the driver has no API information.
pub fn driver_version<D: Driver + ?Sized>(driver: &D) -> &'static str {
    DRIVER_VERSION.get_or_init(|| match driver.api_version() {
        Ok(Some(version)) => format_version(version),
        Ok(None) => "unavailable".to_owned(),
        Err(err) => {
            tracing::warn!(code = err.code(), "querying the driver version failed");
            "unknown".to_owned()
        }
    })
}

/// The version of the interface the driver was built against.
pub fn sdk_version<D: Driver + ?Sized>(driver: &D) -> &'static str {
    driver.sdk_version()
}

/// Render a packed `major << 24 | minor << 16 | patch << 8` version.
pub fn format_version(version: u32) -> String {
    let [major, minor, patch, _] = version.to_be_bytes();
    format!("{major}.{minor}.{patch}")
}
