//! Deterministic stand-ins for the document engine, row sources and clocks

use std::cell::Cell;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::pdf::{DocumentEngine, ImageRegion, PageBounds, Pixel, RenderError, ViewError};
use crate::viewport::{Clock, PixelSource};

/// Text color of the synthetic pages
pub const INK: Pixel = Pixel::rgb(0x10, 0x20, 0x30);

/// Document engine drawing simple synthetic pages.
///
/// Every page is white with a dark text line every 8 rows on its left half
/// and one gradient "photo" on its right half, reported as an image region.
pub struct SyntheticEngine {
    pages: Vec<PageBounds>,
    failing: HashSet<usize>,
    render_counts: Vec<usize>,
    last_scale: Option<f32>,
}

impl SyntheticEngine {
    /// Pages given as intrinsic (width, height)
    pub fn new(pages: &[(f32, f32)]) -> Self {
        Self {
            pages: pages.iter().map(|&(w, h)| PageBounds::new(w, h)).collect(),
            failing: HashSet::new(),
            render_counts: vec![0; pages.len()],
            last_scale: None,
        }
    }

    /// `count` pages of identical bounds
    pub fn uniform(count: usize, width: f32, height: f32) -> Self {
        Self::new(&vec![(width, height); count])
    }

    /// Make every rasterization of `page` fail
    pub fn fail_page(&mut self, page: usize) {
        self.failing.insert(page);
    }

    pub fn heal_page(&mut self, page: usize) {
        self.failing.remove(&page);
    }

    /// Successful rasterizations of `page` so far
    pub fn render_count(&self, page: usize) -> usize {
        self.render_counts.get(page).copied().unwrap_or(0)
    }

    pub fn last_scale(&self) -> Option<f32> {
        self.last_scale
    }

    /// Image region drawn on every page of `rows` x `width` pixels
    pub fn image_region(width: usize, rows: usize) -> ImageRegion {
        let x = width * 5 / 8;
        let y = rows / 4;
        ImageRegion::new(x, y, width * 7 / 8 - x, rows / 2 - y)
    }
}

impl DocumentEngine for SyntheticEngine {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_bounds(&self, index: usize) -> Result<PageBounds, RenderError> {
        self.pages
            .get(index)
            .copied()
            .ok_or(RenderError::PageOutOfRange {
                page: index,
                count: self.pages.len(),
            })
    }

    fn rasterize_page_into(
        &mut self,
        index: usize,
        scale: f32,
        width: usize,
        out: &mut [Pixel],
    ) -> Result<Vec<ImageRegion>, RenderError> {
        self.page_bounds(index)?;
        if self.failing.contains(&index) {
            return Err(RenderError::generic(format!(
                "synthetic failure on page {index}"
            )));
        }
        self.last_scale = Some(scale);
        self.render_counts[index] += 1;

        out.fill(Pixel::WHITE);
        if width == 0 {
            return Ok(Vec::new());
        }
        let rows = out.len() / width;
        let image = Self::image_region(width, rows);

        for (y, row) in out.chunks_exact_mut(width).enumerate() {
            if y % 8 == 4 {
                row[width / 10..width / 2].fill(INK);
            }
            for (x, px) in row.iter_mut().enumerate() {
                if image.contains(x, y) {
                    *px = Pixel::rgb(
                        (x * 255 / width) as u8,
                        (y * 255 / rows) as u8,
                        (index * 40 % 256) as u8,
                    );
                }
            }
        }

        Ok(if image.is_empty() { Vec::new() } else { vec![image] })
    }
}

/// Pixel source whose rows encode their own document row index.
///
/// The document is `base_height` rows at `base_width` and scales with the
/// width, like a real page cache.
pub struct RowSource {
    base_width: usize,
    base_height: usize,
    width: usize,
    scratch: Vec<Pixel>,
    rows_fetched: usize,
}

impl RowSource {
    pub fn new(base_width: usize, base_height: usize) -> Self {
        Self {
            base_width,
            base_height,
            width: base_width,
            scratch: Vec::new(),
            rows_fetched: 0,
        }
    }

    pub fn encode(row: usize) -> Pixel {
        Pixel::rgb((row & 0xFF) as u8, ((row >> 8) & 0xFF) as u8, 0xAA)
    }

    pub fn decode(px: Pixel) -> usize {
        usize::from(px.r) | (usize::from(px.g) << 8)
    }

    /// Total rows handed out by `get`
    pub fn rows_fetched(&self) -> usize {
        self.rows_fetched
    }
}

impl PixelSource for RowSource {
    fn height(&self) -> usize {
        if self.base_width == 0 {
            0
        } else {
            self.base_height * self.width / self.base_width
        }
    }

    fn width(&self) -> usize {
        self.width
    }

    fn set_width(&mut self, width: usize) -> Result<(), ViewError> {
        self.width = width;
        Ok(())
    }

    fn get(&mut self, y: usize, h: usize, width: usize) -> Result<&[Pixel], ViewError> {
        self.set_width(width)?;
        let end = y.saturating_add(h).min(self.height());
        self.scratch.clear();
        for row in y..end.max(y) {
            self.scratch
                .extend(std::iter::repeat_n(Self::encode(row), width));
        }
        self.rows_fetched += end.saturating_sub(y);
        Ok(&self.scratch)
    }
}

/// Clock advancing by a fixed tick on every read
pub struct ManualClock {
    start: Instant,
    tick: Duration,
    reads: Cell<u32>,
}

impl ManualClock {
    pub fn new(tick: Duration) -> Self {
        Self {
            start: Instant::now(),
            tick,
            reads: Cell::new(0),
        }
    }

    /// Number of `now` calls so far
    pub fn reads(&self) -> u64 {
        u64::from(self.reads.get())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let n = self.reads.get();
        self.reads.set(n + 1);
        self.start + self.tick * n
    }
}

pub mod test_helpers {
    use crate::event_source::{Event, SimulatedEventSource};

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct ScenarioBuilder {
        events: Vec<Event>,
    }

    impl ScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Line scroll down `times` times
        pub fn scroll_down(mut self, times: usize) -> Self {
            self.events
                .extend(std::iter::repeat_n(Event::ScrollDown, times));
            self
        }

        /// Line scroll up `times` times
        pub fn scroll_up(mut self, times: usize) -> Self {
            self.events.extend(std::iter::repeat_n(Event::ScrollUp, times));
            self
        }

        pub fn page_down(mut self) -> Self {
            self.events.push(Event::PageDown);
            self
        }

        pub fn page_up(mut self) -> Self {
            self.events.push(Event::PageUp);
            self
        }

        pub fn toggle_dark_mode(mut self) -> Self {
            self.events.push(Event::ToggleDarkMode);
            self
        }

        pub fn resize(mut self, width: usize, height: usize) -> Self {
            self.events.push(Event::Resize { width, height });
            self
        }

        pub fn expose(mut self) -> Self {
            self.events.push(Event::Expose);
            self
        }

        pub fn quit(mut self) -> Self {
            self.events.push(Event::Quit);
            self
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;

    #[test]
    fn test_scenario_builder() {
        let scenario = ScenarioBuilder::new()
            .scroll_down(2)
            .page_down()
            .toggle_dark_mode()
            .scroll_up(1)
            .quit()
            .build();

        assert_eq!(scenario.events.len(), 6);
    }

    #[test]
    fn row_source_encodes_rows() {
        let mut source = RowSource::new(4, 300);
        let pixels = source.get(298, 5, 4).unwrap();
        assert_eq!(pixels.len(), 2 * 4);
        assert_eq!(RowSource::decode(pixels[0]), 298);
        assert_eq!(RowSource::decode(pixels[7]), 299);
    }

    #[test]
    fn synthetic_pages_report_their_photo() {
        let mut engine = SyntheticEngine::uniform(1, 100.0, 100.0);
        let mut out = vec![Pixel::default(); 80 * 80];
        let regions = engine.rasterize_page_into(0, 0.8, 80, &mut out).unwrap();

        assert_eq!(regions, vec![SyntheticEngine::image_region(80, 80)]);
        assert_eq!(out[0], Pixel::WHITE);
        assert_eq!(out[4 * 80 + 10], INK);
        assert_eq!(engine.render_count(0), 1);
        assert_eq!(engine.last_scale(), Some(0.8));
    }
}
