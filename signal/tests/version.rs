use hdr_signal::api::{get_driver_version, get_sdk_version};
use hdr_signal::virtual_device::{VirtualDevice, VirtualDriver};

#[test]
fn without_api_information() {
    let driver = VirtualDriver::new(vec![VirtualDevice::new("Test")]).with_api_version(None);
    assert_eq!(get_driver_version(&driver), "unavailable");
    assert_eq!(get_sdk_version(&driver), "12.4");

    // Queried once, a later driver does not change the answer.
    let other = VirtualDriver::new(vec![]);
    assert_eq!(get_driver_version(&other), "unavailable");
}
