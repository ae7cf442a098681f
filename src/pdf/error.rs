//! Render and view errors

/// Errors from rasterizing a page
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("{detail}")]
    Generic { detail: String },
}

impl RenderError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Errors surfaced by cache queries and viewport operations
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to allocate {bytes} bytes for {what}")]
    Allocation { what: &'static str, bytes: usize },

    #[error("presentation target: {detail}")]
    Target { detail: String },
}

impl ViewError {
    pub fn target(msg: impl Into<String>) -> Self {
        Self::Target { detail: msg.into() }
    }

    /// True for failures a later access may recover from
    #[must_use]
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render(_))
    }
}

/// Allocate a pixel vector of `len` default pixels, reporting failure instead of aborting
pub(crate) fn try_alloc_pixels<T: Clone + Default>(
    len: Option<usize>,
    what: &'static str,
) -> Result<Vec<T>, ViewError> {
    let elem = std::mem::size_of::<T>();
    let Some(len) = len else {
        return Err(ViewError::Allocation {
            what,
            bytes: usize::MAX,
        });
    };
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| ViewError::Allocation {
            what,
            bytes: len.saturating_mul(elem),
        })?;
    pixels.resize(len, T::default());
    Ok(pixels)
}
