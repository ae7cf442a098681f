//! MuPDF-backed document engine

use std::path::Path;

use mupdf::text_page::TextBlockType;
use mupdf::{Colorspace, Document, Matrix, Page, Pixmap, TextPageFlags};

use super::engine::DocumentEngine;
use super::error::RenderError;
use super::types::{ImageRegion, PageBounds, Pixel};

/// Document engine rendering through MuPDF
pub struct MupdfEngine {
    doc: Document,
    page_count: usize,
}

impl MupdfEngine {
    /// Open the document at `path`
    pub fn open(path: &Path) -> Result<Self, RenderError> {
        let doc = Document::open(path.to_string_lossy().as_ref())?;
        let page_count = doc.page_count()?.max(0) as usize;
        log::info!("opened {path:?}: {page_count} pages");
        Ok(Self { doc, page_count })
    }

    fn load_page(&self, index: usize) -> Result<Page, RenderError> {
        if index >= self.page_count {
            return Err(RenderError::PageOutOfRange {
                page: index,
                count: self.page_count,
            });
        }
        Ok(self.doc.load_page(index as i32)?)
    }
}

impl DocumentEngine for MupdfEngine {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_bounds(&self, index: usize) -> Result<PageBounds, RenderError> {
        let bounds = self.load_page(index)?.bounds()?;
        Ok(PageBounds::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }

    fn rasterize_page_into(
        &mut self,
        index: usize,
        scale: f32,
        width: usize,
        out: &mut [Pixel],
    ) -> Result<Vec<ImageRegion>, RenderError> {
        out.fill(Pixel::WHITE);
        if width == 0 || out.is_empty() {
            return Ok(Vec::new());
        }

        let page = self.load_page(index)?;
        let rgb = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&Matrix::new_scale(scale, scale), &rgb, false, false)?;
        copy_pixmap(&pixmap, width, out)?;

        let rows = out.len() / width;
        Ok(collect_image_regions(&page, scale, width, rows))
    }
}

/// Copy an RGB(A) pixmap into `out`, clipping whatever bbox rounding added
fn copy_pixmap(pixmap: &Pixmap, width: usize, out: &mut [Pixel]) -> Result<(), RenderError> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(RenderError::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let src_width = pixmap.width() as usize;
    let src_height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = src_width * n;
    if samples.len() < stride.saturating_mul(src_height) || row_bytes > stride {
        return Err(RenderError::generic("Pixmap buffer size mismatch"));
    }

    let cols = src_width.min(width);
    for (y, dst) in out.chunks_exact_mut(width).take(src_height).enumerate() {
        let row = &samples[y * stride..y * stride + row_bytes];
        for (px, src) in dst[..cols].iter_mut().zip(row.chunks_exact(n)) {
            let alpha = if n > 3 { src[3] } else { 0xFF };
            *px = Pixel::new(src[0], src[1], src[2], alpha);
        }
    }
    Ok(())
}

fn collect_image_regions(page: &Page, scale: f32, width: usize, rows: usize) -> Vec<ImageRegion> {
    let flags = TextPageFlags::PRESERVE_IMAGES | TextPageFlags::ACCURATE_BBOXES;
    let text_page = match page.to_text_page(flags) {
        Ok(text_page) => text_page,
        Err(e) => {
            log::warn!("image regions unavailable, page treated as text only: {e}");
            return Vec::new();
        }
    };
    let max_x = width as f32;
    let max_y = rows as f32;

    text_page
        .blocks()
        .filter(|block| block.r#type() == TextBlockType::Image)
        .filter_map(|block| {
            let bbox = block.bounds();
            let x0 = (bbox.x0 * scale).floor().max(0.0);
            let y0 = (bbox.y0 * scale).floor().max(0.0);
            let x1 = (bbox.x1 * scale).ceil().min(max_x);
            let y1 = (bbox.y1 * scale).ceil().min(max_y);

            if x0 >= x1 || y0 >= y1 {
                return None;
            }
            let (x0, y0) = (x0 as usize, y0 as usize);
            Some(ImageRegion::new(x0, y0, x1 as usize - x0, y1 as usize - y0))
        })
        .collect()
}
