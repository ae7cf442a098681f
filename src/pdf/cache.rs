//! Continuous page render cache
//!
//! Holds the whole document as one pixel buffer at the display width. Pages
//! are rasterized lazily, the first time a query overlaps them, and stay valid
//! until the width or the dark mode settings change.

use std::time::Instant;

use super::dark_mode::DarkModeTransform;
use super::engine::DocumentEngine;
use super::error::{RenderError, ViewError, try_alloc_pixels};
use super::types::{PageBounds, Pixel, RenderOptions, VecExt};
use crate::viewport::PixelSource;

/// Full-document pixel buffer with per-page lazy rendering
pub struct PageCache<E> {
    engine: E,
    options: RenderOptions,
    page_heights: Vec<usize>,
    total_height: usize,
    buffer: Vec<Pixel>,
    rendered: Vec<bool>,
}

impl<E: DocumentEngine> PageCache<E> {
    /// Create an empty cache; geometry is computed on the first query
    #[must_use]
    pub fn new(engine: E, dark_mode: bool, brightness: f32) -> Self {
        let page_count = engine.page_count();
        Self {
            engine,
            options: RenderOptions::new(dark_mode, brightness),
            page_heights: vec![0; page_count],
            total_height: 0,
            buffer: Vec::new(),
            rendered: vec![false; page_count],
        }
    }

    /// Rebuild page geometry and the buffer for a new display width.
    ///
    /// No-op when the width is unchanged. On failure the cache keeps its
    /// previous geometry.
    pub fn set_width(&mut self, width: usize) -> Result<(), ViewError> {
        if width == self.options.target_width {
            return Ok(());
        }

        let page_count = self.engine.page_count();
        let mut heights = Vec::with_capacity(page_count);
        for page in 0..page_count {
            let bounds = self.engine.page_bounds(page)?;
            heights.push(bounds.scaled_height(width));
        }
        let total_height: usize = heights.iter().sum();
        let buffer = try_alloc_pixels(width.checked_mul(total_height), "page cache")?;

        log::info!(
            "page cache rebuilt: width {} -> {width}, {page_count} pages, {total_height} rows",
            self.options.target_width
        );
        self.options.target_width = width;
        self.page_heights = heights;
        self.total_height = total_height;
        self.buffer = buffer;
        self.rendered.reset_to_len(page_count);
        Ok(())
    }

    /// Rasterize page `index` into its buffer region unless already valid
    pub fn render_page(&mut self, index: usize) -> Result<(), RenderError> {
        let count = self.page_count();
        if index >= count {
            return Err(RenderError::PageOutOfRange { page: index, count });
        }
        if self.rendered[index] {
            return Ok(());
        }

        let width = self.options.target_width;
        let offset = self.page_offset(index);
        let rows = self.page_heights[index];
        let region = &mut self.buffer[offset * width..(offset + rows) * width];

        let started = Instant::now();
        let bounds = self.engine.page_bounds(index)?;
        let scale = bounds.scale_for_width(width);
        let regions = self
            .engine
            .rasterize_page_into(index, scale, width, region)?;

        if self.options.dark_mode {
            DarkModeTransform::new(self.options.brightness).apply(region, width, &regions);
        }
        self.rendered[index] = true;

        log::debug!(
            "rendered page {index}: {width}x{rows}, {} image regions, dark={}, {:?}",
            regions.len(),
            self.options.dark_mode,
            started.elapsed()
        );
        Ok(())
    }

    /// Pixels for rows `[y, y + h)` at width `width`.
    ///
    /// Rebuilds the cache if the width changed and renders every page the
    /// range overlaps. The result is shorter than `h` rows when the range runs
    /// past the end of the document.
    pub fn get(&mut self, y: usize, h: usize, width: usize) -> Result<&[Pixel], ViewError> {
        self.set_width(width)?;

        let end_row = y.saturating_add(h);
        let mut page_start = 0;
        for page in 0..self.page_heights.len() {
            let page_end = page_start + self.page_heights[page];
            if page_start < end_row && page_end > y && !self.rendered[page] {
                self.render_page(page)?;
            }
            page_start = page_end;
        }

        let len = self.buffer.len();
        let start = y.saturating_mul(width).min(len);
        let end = start.saturating_add(h.saturating_mul(width)).min(len);
        Ok(&self.buffer[start..end])
    }

    /// Toggle dark mode. Every page is re-rasterized on its next access.
    pub fn flip_dark_mode(&mut self) {
        self.options.dark_mode = !self.options.dark_mode;
        log::info!("dark mode {}", if self.options.dark_mode { "on" } else { "off" });
        self.invalidate();
    }

    /// Change the dark mode brightness, clamped into (0, 1]
    pub fn set_brightness(&mut self, brightness: f32) {
        let brightness = RenderOptions::clamp_brightness(brightness);
        if (self.options.brightness - brightness).abs() <= f32::EPSILON {
            return;
        }
        self.options.brightness = brightness;
        if self.options.dark_mode {
            self.invalidate();
        }
    }

    /// Render at most one unrendered page near the visible rows `[y, y + h)`.
    ///
    /// Looks `radius` pages beyond either end of the visible range, nearest
    /// first, preferring the page below on ties. Returns the page rendered,
    /// if any. A page that fails is skipped for the rest of the pass; its
    /// error is returned only when no other page could be rendered.
    pub fn prefetch_near(
        &mut self,
        y: usize,
        h: usize,
        radius: usize,
    ) -> Result<Option<usize>, RenderError> {
        if self.options.target_width == 0 || self.page_heights.is_empty() {
            return Ok(None);
        }
        let first = self.page_at(y);
        let last = self.page_at(y.saturating_add(h.saturating_sub(1)));

        let mut failure = None;
        for distance in 0..=radius {
            let below = last.checked_add(distance).filter(|&p| p < self.page_count());
            let above = first.checked_sub(distance);
            for page in [below, above].into_iter().flatten() {
                if self.rendered[page] {
                    continue;
                }
                match self.render_page(page) {
                    Ok(()) => return Ok(Some(page)),
                    Err(e) => {
                        log::debug!("prefetch skipped page {page}: {e}");
                        failure.get_or_insert(e);
                    }
                }
            }
        }
        failure.map_or(Ok(None), Err)
    }

    fn invalidate(&mut self) {
        let count = self.rendered.len();
        self.rendered.reset_to_len(count);
    }

    /// Index of the page containing row `y`, clamped to the last page
    fn page_at(&self, y: usize) -> usize {
        let mut page_start = 0;
        for (page, &rows) in self.page_heights.iter().enumerate() {
            page_start += rows;
            if y < page_start {
                return page;
            }
        }
        self.page_heights.len().saturating_sub(1)
    }

    /// First buffer row of page `index`
    #[must_use]
    pub fn page_offset(&self, index: usize) -> usize {
        self.page_heights.iter().take(index).sum()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_heights.len()
    }

    #[must_use]
    pub fn page_heights(&self) -> &[usize] {
        &self.page_heights
    }

    /// Total height in rows at the current width
    #[must_use]
    pub fn height(&self) -> usize {
        self.total_height
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.options.target_width
    }

    #[must_use]
    pub fn is_rendered(&self, index: usize) -> bool {
        self.rendered.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn rendered_count(&self) -> usize {
        self.rendered.iter().filter(|&&r| r).count()
    }

    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Intrinsic bounds of every page, as reported by the engine
    pub fn page_bounds(&self) -> Result<Vec<PageBounds>, RenderError> {
        (0..self.engine.page_count())
            .map(|page| self.engine.page_bounds(page))
            .collect()
    }
}

impl<E: DocumentEngine> PixelSource for PageCache<E> {
    fn height(&self) -> usize {
        PageCache::height(self)
    }

    fn width(&self) -> usize {
        PageCache::width(self)
    }

    fn set_width(&mut self, width: usize) -> Result<(), ViewError> {
        PageCache::set_width(self, width)
    }

    fn get(&mut self, y: usize, h: usize, width: usize) -> Result<&[Pixel], ViewError> {
        PageCache::get(self, y, h, width)
    }
}
