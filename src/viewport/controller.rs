//! Time-based smooth scrolling

use std::time::{Duration, Instant};

use crate::pdf::ViewError;

use super::scroll_buffer::{PixelSource, ScrollBuffer};
use super::target::PixelTarget;

/// Source of the current time
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Animation tunables
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollConfig {
    /// Frames per second the animation is stepped at
    pub fps: u32,
    /// Time a whole scroll gesture takes
    pub response_time: Duration,
    /// Rows moved by one line scroll
    pub scroll_step: usize,
    /// Fraction of the viewport height moved by one page scroll
    pub page_step_ratio: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            response_time: Duration::from_millis(130),
            scroll_step: 100,
            page_step_ratio: 0.9,
        }
    }
}

impl ScrollConfig {
    /// Minimum time between two animation steps
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    /// Rows moved by one page scroll in a viewport `height` rows high
    #[must_use]
    pub fn page_step(&self, height: usize) -> usize {
        (height as f64 * f64::from(self.page_step_ratio)).round() as usize
    }
}

/// Drives a [`ScrollBuffer`] with a linear animation
pub struct ScrollController<C = SystemClock> {
    config: ScrollConfig,
    clock: C,
}

impl ScrollController<SystemClock> {
    #[must_use]
    pub fn new(config: ScrollConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ScrollController<C> {
    #[must_use]
    pub fn with_clock(config: ScrollConfig, clock: C) -> Self {
        Self { config, clock }
    }

    #[must_use]
    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Scroll `offset` rows over the configured response time
    pub fn animate<S, T>(
        &self,
        view: &mut ScrollBuffer<S>,
        target: &mut T,
        offset: isize,
    ) -> Result<isize, ViewError>
    where
        S: PixelSource,
        T: PixelTarget + ?Sized,
    {
        self.smooth_scroll(view, target, offset, self.config.response_time)
    }

    /// Scroll `offset` rows (signed) linearly over `duration`.
    ///
    /// Busy-polls the clock and advances once per frame interval, rendering
    /// and presenting after every step. Stops early, without error, when the
    /// viewport hits either end of the document. Returns the rows moved.
    pub fn smooth_scroll<S, T>(
        &self,
        view: &mut ScrollBuffer<S>,
        target: &mut T,
        offset: isize,
        duration: Duration,
    ) -> Result<isize, ViewError>
    where
        S: PixelSource,
        T: PixelTarget + ?Sized,
    {
        if offset == 0 || !view.can_scroll(offset.signum()) {
            return Ok(0);
        }
        if duration.is_zero() {
            let moved = view.scroll(offset)? as isize;
            view.present(target)?;
            return Ok(moved * offset.signum());
        }

        let frame = self.config.frame_interval();
        let speed = offset as f64 / duration.as_secs_f64();
        let mut baseline = self.clock.now();
        let mut moved: isize = 0;

        while moved != offset {
            let elapsed = self.clock.now().saturating_duration_since(baseline);
            if elapsed < frame {
                std::hint::spin_loop();
                continue;
            }

            let remaining = offset - moved;
            let mut increment = (speed * elapsed.as_secs_f64()).round() as isize;
            if increment.abs() > remaining.abs() {
                increment = remaining;
            }
            if increment == 0 {
                continue;
            }

            if !view.can_scroll(increment.signum()) {
                log::debug!("smooth scroll stopped at document edge, {remaining} rows dropped");
                break;
            }
            let step = view.scroll(increment)? as isize * increment.signum();
            view.present(target)?;
            moved += step;
            baseline += elapsed;
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ManualClock, RowSource};
    use crate::viewport::FrameBuffer;

    fn setup(doc_height: usize) -> (ScrollBuffer<RowSource>, FrameBuffer) {
        let mut view = ScrollBuffer::new(RowSource::new(40, doc_height), 40, 50).unwrap();
        view.init(0).unwrap();
        (view, FrameBuffer::new(40, 50).unwrap())
    }

    fn controller() -> ScrollController<ManualClock> {
        let config = ScrollConfig {
            fps: 60,
            response_time: Duration::from_millis(130),
            ..ScrollConfig::default()
        };
        ScrollController::with_clock(config, ManualClock::new(Duration::from_millis(5)))
    }

    #[test]
    fn animation_reaches_the_full_offset() {
        let (mut view, mut frame) = setup(1_000);
        let moved = controller().animate(&mut view, &mut frame, 100).unwrap();

        assert_eq!(moved, 100);
        assert_eq!(view.document_y(), 100);
        // one present per step, several steps
        assert!(frame.frames() > 1);
        assert_eq!(RowSource::decode(frame.presented_row(0)[0]), 100);
    }

    #[test]
    fn animation_scrolls_up() {
        let (mut view, mut frame) = setup(1_000);
        view.scroll_down(300).unwrap();
        let moved = controller().animate(&mut view, &mut frame, -120).unwrap();

        assert_eq!(moved, -120);
        assert_eq!(view.document_y(), 180);
    }

    #[test]
    fn steps_wait_for_a_frame_interval() {
        let (mut view, mut frame) = setup(1_000);
        let controller = controller();
        controller.animate(&mut view, &mut frame, 100).unwrap();

        // 5 ms ticks, 16.7 ms frames: at least 4 clock reads per step
        let reads = controller.clock().reads();
        assert!(reads >= frame.frames() * 4, "{reads} reads, {} frames", frame.frames());
    }

    #[test]
    fn animation_stops_at_document_end() {
        let (mut view, mut frame) = setup(200);
        view.scroll_down(125).unwrap();
        let before = view.document_y();
        let moved = controller().animate(&mut view, &mut frame, 100).unwrap();

        assert_eq!(view.document_y(), 150);
        // the last step is clamped short of its 15 rows
        assert_eq!(moved, (view.document_y() - before) as isize);
        assert_eq!(moved, 25);
        assert!(!view.can_scroll(1));
    }

    #[test]
    fn single_row_waits_for_a_nonzero_increment() {
        let (mut view, mut frame) = setup(1_000);
        let controller = controller();
        let moved = controller.animate(&mut view, &mut frame, 1).unwrap();

        assert_eq!(moved, 1);
        assert_eq!(view.document_y(), 1);
        assert_eq!(frame.frames(), 1);
        // one row per 130 ms rounds to 0 until 65 ms have passed, so polling
        // runs past several frame intervals from the same baseline
        let reads = controller.clock().reads();
        assert!(reads * 5 > 3 * 1_000 / 60, "{reads} reads");
    }

    #[test]
    fn nothing_happens_at_the_limit() {
        let (mut view, mut frame) = setup(200);
        let moved = controller().animate(&mut view, &mut frame, -50).unwrap();
        assert_eq!(moved, 0);
        assert_eq!(frame.frames(), 0);
    }

    #[test]
    fn zero_duration_jumps() {
        let (mut view, mut frame) = setup(1_000);
        let moved = controller()
            .smooth_scroll(&mut view, &mut frame, 75, Duration::ZERO)
            .unwrap();
        assert_eq!(moved, 75);
        assert_eq!(frame.frames(), 1);
    }

    #[test]
    fn page_step_is_a_fraction_of_the_viewport() {
        let config = ScrollConfig::default();
        assert_eq!(config.page_step(480), 432);
        assert_eq!(config.frame_interval(), Duration::from_secs_f64(1.0 / 60.0));
    }
}
