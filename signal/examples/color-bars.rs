//! Emit SMPTE-style color bars, or a 16-bit PNG, through a virtual output.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p hdr-signal --example color-bars -- [image.png] [format index]
//! ```
use hdr_signal::virtual_device::{VirtualDevice, VirtualDriver};
use hdr_signal::{api, HdrMetadata, Session, SessionConfig};
use tracing_subscriber::EnvFilter;

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;

/// White, yellow, cyan, green, magenta, red, blue at 75%.
const BARS: [[u16; 3]; 7] = [
    [0xbfff, 0xbfff, 0xbfff],
    [0xbfff, 0xbfff, 0x0000],
    [0x0000, 0xbfff, 0xbfff],
    [0x0000, 0xbfff, 0x0000],
    [0xbfff, 0x0000, 0xbfff],
    [0xbfff, 0x0000, 0x0000],
    [0x0000, 0x0000, 0xbfff],
];

fn bars(width: u32, height: u32) -> Vec<u16> {
    let bar_width = width.div_ceil(BARS.len() as u32);
    (0..height)
        .flat_map(|_| (0..width).flat_map(|x| BARS[(x / bar_width) as usize]))
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (rgb, width, height) = match args.iter().find(|arg| arg.ends_with(".png")) {
        Some(path) => {
            let image = image::open(path)?.into_rgb16();
            let (width, height) = image.dimensions();
            (image.into_raw(), width, height)
        }
        None => (bars(WIDTH, HEIGHT), WIDTH, HEIGHT),
    };

    let device = VirtualDevice::new("Virtual Output").with_stride_align(128);
    let driver = VirtualDriver::new(vec![device]);
    println!(
        "driver {}, sdk {}",
        api::get_driver_version(&driver),
        api::get_sdk_version(&driver)
    );

    let mut session = Session::open(&driver, 0, SessionConfig::default())?;
    for index in 0..session.supported_format_count()? {
        println!("{index}: {}", session.supported_format_name(index)?);
    }

    if let Some(index) = args.iter().find_map(|arg| arg.parse::<usize>().ok()) {
        session.set_pixel_format(index)?;
    }

    session.set_hdr_metadata(HdrMetadata::REC2020_PQ);
    session.set_frame_data(&rgb, width, height)?;
    session.start_output()?;
    session.create_frame()?;
    session.schedule_frame()?;
    session.start_playback()?;

    let scheduled = &session.output().scheduled()[0];
    println!(
        "playing {} ({width}x{height}), {} bytes",
        session.pixel_format_tag(),
        scheduled.data.len()
    );

    session.stop();
    Ok(())
}
