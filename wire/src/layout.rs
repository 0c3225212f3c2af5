// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `hdr-signal` developers
use core::ops::Range;

use crate::format::PixelFormat;
use crate::PackError;

/// The placement of packed rows within a byte buffer.
///
/// The stride is whatever the device handed out for the format and width. It is used verbatim:
/// row `n` always begins at `n * stride`, no matter how many bytes the packed row itself needs.
///
/// The invariant is that the whole layout, i.e. every row, fits into a `usize` of bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowLayout {
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: usize,
    row_bytes: usize,
    /// The number of bytes up to the end of the last packed row, as proof of calculation.
    total: usize,
}

impl RowLayout {
    /// Validate a stride for `height` rows of `width` pixels.
    ///
    /// Fails when the stride is shorter than a packed row or the layout does not fit in memory.
    pub fn new(
        format: PixelFormat,
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Self, PackError> {
        if width == 0 || height == 0 {
            return Err(PackError::empty());
        }

        let row_bytes = format
            .nominal_row_bytes(width)
            .ok_or(PackError::overflow())?;

        if stride < row_bytes {
            return Err(PackError::bad_stride(stride, row_bytes));
        }

        let total = usize::try_from(height - 1)
            .ok()
            .and_then(|rows| rows.checked_mul(stride))
            .and_then(|start| start.checked_add(row_bytes))
            .ok_or(PackError::overflow())?;

        Ok(RowLayout {
            format,
            width,
            height,
            stride,
            row_bytes,
            total,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The bytes that a packed row writes, excluding any padding up to the stride.
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// The minimum length of a buffer holding all rows.
    ///
    /// The last row need not be padded to a full stride.
    pub fn total_len(&self) -> usize {
        self.total
    }

    /// The byte range of the packed part of row `n`.
    pub fn row(&self, n: usize) -> Range<usize> {
        let start = n * self.stride;
        start..start + self.row_bytes
    }

    pub(crate) fn check_len(&self, len: usize) -> Result<(), PackError> {
        if len < self.total {
            Err(PackError::short_buffer(len, self.total))
        } else {
            Ok(())
        }
    }
}
