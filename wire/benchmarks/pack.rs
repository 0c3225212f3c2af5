//! Benchmarks quantizing and packing a 1080p frame into each wire format.
use brunch::Bench;

use hdr_signal_wire::{pack, PackError, PixelFormat, Planes};

const SZ_W: u32 = 1920;
const SZ_H: u32 = 1080;

struct Pack {
    format: PixelFormat,
}

impl Pack {
    fn name(&self) -> String {
        format!("pack({}, {}x{})", self.format.fourcc(), SZ_W, SZ_H)
    }

    fn prepare(self) -> Result<impl FnMut(), PackError> {
        let rgb: Vec<u16> = (0..SZ_W * SZ_H * 3).map(|i| i.wrapping_mul(7919) as u16).collect();
        let stride = self.format.nominal_row_bytes(SZ_W).unwrap_or_default();
        let mut frame = vec![0u8; stride * SZ_H as usize];
        let format = self.format;

        // Fail early on setup errors, the closure must not.
        let planes = Planes::from_rgb16(&rgb, SZ_W, SZ_H, format)?;
        pack(format, &planes, stride, &mut frame)?;

        Ok(move || {
            let planes = Planes::from_rgb16(&rgb, SZ_W, SZ_H, format).unwrap();
            pack(format, &planes, stride, &mut frame).unwrap();
        })
    }
}

fn main() {
    let mut benches = brunch::Benches::default();
    benches.extend(
        PixelFormat::ALL
            .into_iter()
            .filter(|format| format.is_packable())
            .map(|format| {
                let convert = Pack { format };
                Bench::new(format!("wire::pack::main::{}", convert.name()))
                    .run(convert.prepare().expect("Failed to setup benchmark"))
            }),
    );
    benches.finish();
}
