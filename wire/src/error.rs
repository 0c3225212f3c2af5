use crate::format::FourCC;

/// An error while quantizing or packing a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct PackError {
    kind: PackErrorKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
enum PackErrorKind {
    #[error("unsupported pixel format {0} (0x{code:08x})", code = .0.to_u32())]
    Unsupported(FourCC),
    #[error("row stride {stride} is shorter than a packed row of {row_bytes} bytes")]
    BadStride { stride: usize, row_bytes: usize },
    #[error("buffer of {len} bytes is shorter than the {required} bytes of the frame")]
    ShortBuffer { len: usize, required: usize },
    #[error("source holds {len} samples, expected {expected}")]
    SourceLength { len: usize, expected: usize },
    #[error("channel planes do not match the pixel format")]
    PlaneMismatch,
    #[error("frame dimensions must be non-zero")]
    Empty,
    #[error("frame size overflows the address space")]
    Overflow,
}

impl PackError {
    pub(crate) const fn unsupported(code: FourCC) -> Self {
        PackErrorKind::Unsupported(code).into_error()
    }

    pub(crate) const fn bad_stride(stride: usize, row_bytes: usize) -> Self {
        PackErrorKind::BadStride { stride, row_bytes }.into_error()
    }

    pub(crate) const fn short_buffer(len: usize, required: usize) -> Self {
        PackErrorKind::ShortBuffer { len, required }.into_error()
    }

    pub(crate) const fn source_length(len: usize, expected: usize) -> Self {
        PackErrorKind::SourceLength { len, expected }.into_error()
    }

    pub(crate) const fn plane_mismatch() -> Self {
        PackErrorKind::PlaneMismatch.into_error()
    }

    pub(crate) const fn empty() -> Self {
        PackErrorKind::Empty.into_error()
    }

    pub(crate) const fn overflow() -> Self {
        PackErrorKind::Overflow.into_error()
    }

    /// The format is not implemented by the packer, as opposed to a rejected buffer.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self.kind, PackErrorKind::Unsupported(_))
    }

    /// The tag of the unsupported format, if that is the cause.
    pub fn unsupported_format(&self) -> Option<FourCC> {
        match self.kind {
            PackErrorKind::Unsupported(code) => Some(code),
            _ => None,
        }
    }
}

impl PackErrorKind {
    const fn into_error(self) -> PackError {
        PackError { kind: self }
    }
}
