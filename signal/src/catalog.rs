//! The list of pixel formats an output accepts.
use hdr_signal_wire::{family_of, FourCC, PixelFormat};

use crate::device::{DisplayMode, Output};
use crate::error::{Error, Result};

/// Supported format tags in first-discovery order of [`FormatCatalog::CANDIDATES`].
///
/// Indices handed out stay valid until [`FormatCatalog::invalidate`] and the following rebuild.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatCatalog {
    formats: Vec<FourCC>,
    built: bool,
}

impl FormatCatalog {
    /// The probe order of a rebuild.
    pub const CANDIDATES: [PixelFormat; 10] = PixelFormat::ALL;

    pub fn new() -> Self {
        FormatCatalog::default()
    }

    /// Probe the candidates against `output` in `mode`, unless already built.
    ///
    /// A failing probe leaves the catalog unbuilt and empty.
    pub fn rebuild<O: Output + ?Sized>(&mut self, output: &O, mode: DisplayMode) -> Result<()> {
        if self.built {
            return Ok(());
        }

        let mut formats = Vec::with_capacity(Self::CANDIDATES.len());
        for format in Self::CANDIDATES.map(PixelFormat::fourcc) {
            let supported = output
                .supports_format(mode, format)
                .map_err(|source| Error::CapabilityQuery { format, source })?;

            if supported && !formats.contains(&format) {
                formats.push(format);
            }
        }

        tracing::debug!(%mode, count = formats.len(), "built format catalog");
        self.formats = formats;
        self.built = true;
        Ok(())
    }

    /// Mark the catalog stale, the next [`FormatCatalog::rebuild`] probes again.
    pub fn invalidate(&mut self) {
        self.formats.clear();
        self.built = false;
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.formats()?.len())
    }

    pub fn tag_at(&self, index: usize) -> Result<FourCC> {
        let formats = self.formats()?;
        formats
            .get(index)
            .copied()
            .ok_or(Error::InvalidFormatIndex {
                index,
                count: formats.len(),
            })
    }

    /// A display name such as `12-bit RGB (R12B)`.
    pub fn name_of(&self, index: usize) -> Result<String> {
        let tag = self.tag_at(index)?;
        Ok(format!("{} ({})", family_of(tag), tag))
    }

    pub fn index_of(&self, tag: FourCC) -> Option<usize> {
        self.formats.iter().position(|&f| f == tag)
    }

    /// All tags, in catalog order.
    pub fn formats(&self) -> Result<&[FourCC]> {
        if !self.built {
            return Err(Error::CatalogNotBuilt);
        }

        Ok(&self.formats)
    }
}
