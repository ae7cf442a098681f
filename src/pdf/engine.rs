//! Document engine seam

use super::error::RenderError;
use super::types::{ImageRegion, PageBounds, Pixel};

/// A decoded document that can report page geometry and rasterize pages.
///
/// Implementations own the document handle; [`PageCache`](super::PageCache)
/// decides which pages to rasterize and where their pixels go.
pub trait DocumentEngine {
    /// Number of pages in the document
    fn page_count(&self) -> usize;

    /// Intrinsic bounds of page `index` in document units
    fn page_bounds(&self, index: usize) -> Result<PageBounds, RenderError>;

    /// Rasterize page `index` at `scale` into `out`.
    ///
    /// `out` holds `out.len() / width` rows of `width` pixels. Every pixel of
    /// `out` must be written, starting from a white background. Returns the
    /// rectangles covered by embedded images, in `out`'s local coordinates.
    fn rasterize_page_into(
        &mut self,
        index: usize,
        scale: f32,
        width: usize,
        out: &mut [Pixel],
    ) -> Result<Vec<ImageRegion>, RenderError>;
}

impl<E: DocumentEngine + ?Sized> DocumentEngine for Box<E> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_bounds(&self, index: usize) -> Result<PageBounds, RenderError> {
        (**self).page_bounds(index)
    }

    fn rasterize_page_into(
        &mut self,
        index: usize,
        scale: f32,
        width: usize,
        out: &mut [Pixel],
    ) -> Result<Vec<ImageRegion>, RenderError> {
        (**self).rasterize_page_into(index, scale, width, out)
    }
}
