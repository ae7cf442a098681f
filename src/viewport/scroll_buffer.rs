//! Wraparound viewport store
//!
//! The store has exactly as many rows as the viewport. Row `zero` of the
//! store is shown at the top of the viewport and the rows after it wrap
//! around the end of the store, so scrolling only fetches and writes the
//! band of rows that just came into view.

use crate::pdf::error::try_alloc_pixels;
use crate::pdf::{Pixel, Rect, ViewError};

use super::target::PixelTarget;

/// Something the viewport can pull document rows from
pub trait PixelSource {
    /// Document height in rows at the current width
    fn height(&self) -> usize;

    /// Current width in pixels
    fn width(&self) -> usize;

    /// Switch the source to a new width, recomputing its height
    fn set_width(&mut self, width: usize) -> Result<(), ViewError>;

    /// Rows `[y, y + h)` at `width`; fewer rows at the end of the document
    fn get(&mut self, y: usize, h: usize, width: usize) -> Result<&[Pixel], ViewError>;
}

/// Fixed-size circular pixel store backing the visible viewport
pub struct ScrollBuffer<S> {
    source: S,
    width: usize,
    height: usize,
    store: Vec<Pixel>,
    /// Store row shown at the top of the viewport
    zero: usize,
    /// Document row shown at the top of the viewport
    y: usize,
}

impl<S: PixelSource> ScrollBuffer<S> {
    /// Allocate a viewport store. Call [`init`](Self::init) before rendering.
    pub fn new(source: S, width: usize, height: usize) -> Result<Self, ViewError> {
        let store = try_alloc_pixels(width.checked_mul(height), "scroll buffer")?;
        Ok(Self {
            source,
            width,
            height,
            store,
            zero: 0,
            y: 0,
        })
    }

    /// Fill the whole store from document row `y`.
    ///
    /// `y` is clamped so the viewport does not start past the last full
    /// screen of the document.
    pub fn init(&mut self, y: usize) -> Result<(), ViewError> {
        self.source.set_width(self.width)?;
        self.store.fill(Pixel::default());
        self.zero = 0;
        self.y = y.min(self.bottom());

        let pixels = self.source.get(self.y, self.height, self.width)?;
        write_wrapped(&mut self.store, self.width, self.height, 0, pixels);
        Ok(())
    }

    /// Refill the store at the current offset, e.g. after the source was invalidated
    pub fn reload(&mut self) -> Result<(), ViewError> {
        self.init(self.y)
    }

    /// Rebuild for a new viewport size, keeping the same relative position
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), ViewError> {
        let y = if self.width == 0 {
            0
        } else {
            (self.y as f64 * width as f64 / self.width as f64).round() as usize
        };
        log::debug!(
            "viewport resize {}x{} -> {width}x{height}, y {} -> {y}",
            self.width,
            self.height,
            self.y
        );

        self.store = Vec::new();
        self.width = 0;
        self.height = 0;
        self.store = try_alloc_pixels(width.checked_mul(height), "scroll buffer")?;
        self.width = width;
        self.height = height;
        self.init(y)
    }

    /// Whether scrolling in the direction of `sign` would move the viewport
    #[must_use]
    pub fn can_scroll(&self, sign: isize) -> bool {
        match sign.signum() {
            1 => self.y < self.bottom(),
            -1 => self.y > 0,
            _ => false,
        }
    }

    /// Scroll by a signed number of rows. Returns the rows actually scrolled.
    pub fn scroll(&mut self, offset: isize) -> Result<usize, ViewError> {
        if offset > 0 {
            self.scroll_down(offset.unsigned_abs())
        } else if offset < 0 {
            self.scroll_up(offset.unsigned_abs())
        } else {
            Ok(0)
        }
    }

    /// Move the viewport `h` rows down, clamped at the document end
    pub fn scroll_down(&mut self, h: usize) -> Result<usize, ViewError> {
        let bottom = self.bottom();
        if self.height == 0 || h == 0 || self.y >= bottom {
            return Ok(0);
        }
        let h = h.min(bottom - self.y);

        // Rows that scroll past entirely are never fetched; at most one
        // screen of new rows is written.
        let copy = h.min(self.height);
        let skip = h - copy;
        let start = (self.zero + skip) % self.height;

        let pixels = self
            .source
            .get(self.y + self.height + skip, copy, self.width)?;
        let rows = write_wrapped(&mut self.store, self.width, self.height, start, pixels);
        self.zero = (start + rows) % self.height;
        self.y += h;
        Ok(h)
    }

    /// Move the viewport `h` rows up, clamped at the document start
    pub fn scroll_up(&mut self, h: usize) -> Result<usize, ViewError> {
        if self.height == 0 || h == 0 || self.y == 0 {
            return Ok(0);
        }
        let h = h.min(self.y);
        let copy = h.min(self.height);
        let y = self.y - h;
        let zero = (self.zero + self.height - h % self.height) % self.height;

        let pixels = self.source.get(y, copy, self.width)?;
        write_wrapped(&mut self.store, self.width, self.height, zero, pixels);
        self.zero = zero;
        self.y = y;
        Ok(h)
    }

    /// Blit the store onto `target`, unrolled from row `zero`
    pub fn render<T: PixelTarget + ?Sized>(&self, target: &mut T) -> Result<(), ViewError> {
        let (width, height, zero) = (self.width, self.height, self.zero);
        if width == 0 || height == 0 {
            return Ok(());
        }
        target.update(
            Rect::new(0, 0, width, height - zero),
            &self.store[zero * width..],
            width,
        )?;
        if zero > 0 {
            target.update(
                Rect::new(0, height - zero, width, zero),
                &self.store[..zero * width],
                width,
            )?;
        }
        Ok(())
    }

    /// [`render`](Self::render), then present the target
    pub fn present<T: PixelTarget + ?Sized>(&self, target: &mut T) -> Result<(), ViewError> {
        self.render(target)?;
        target.present()
    }

    /// Last document offset the viewport top may reach
    fn bottom(&self) -> usize {
        self.source.height().saturating_sub(self.height)
    }

    #[must_use]
    pub fn document_y(&self) -> usize {
        self.y
    }

    #[must_use]
    pub fn document_height(&self) -> usize {
        self.source.height()
    }

    #[must_use]
    pub fn zero(&self) -> usize {
        self.zero
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Tear down the viewport, handing back the source
    #[must_use]
    pub fn into_source(self) -> S {
        self.source
    }
}

/// Write whole rows of `pixels` into `store` from `start_row`, wrapping to
/// row 0 at the end. Returns the number of rows written.
fn write_wrapped(
    store: &mut [Pixel],
    width: usize,
    height: usize,
    start_row: usize,
    pixels: &[Pixel],
) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }
    let rows = (pixels.len() / width).min(height);
    let first = rows.min(height - start_row);
    store[start_row * width..(start_row + first) * width].copy_from_slice(&pixels[..first * width]);

    let rest = rows - first;
    if rest > 0 {
        store[..rest * width].copy_from_slice(&pixels[first * width..rows * width]);
    }
    rows
}
