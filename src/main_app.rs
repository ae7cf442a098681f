use anyhow::Result;
use log::{debug, info, warn};
use std::time::Duration;

use crate::event_source::{Event, EventSource};
use crate::pdf::{DocumentEngine, PageCache, RenderError, ViewError};
use crate::settings::Settings;
use crate::viewport::{
    Clock, FrameBuffer, PixelTarget, ScrollBuffer, ScrollController, SystemClock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Document viewer: page cache, viewport and presentation target
pub struct App<E, T, C = SystemClock> {
    view: ScrollBuffer<PageCache<E>>,
    target: T,
    controller: ScrollController<C>,
    settings: Settings,
}

impl<E: DocumentEngine, T: PixelTarget> App<E, T, SystemClock> {
    pub fn new(engine: E, target: T, settings: Settings) -> Result<Self> {
        Self::with_clock(engine, target, settings, SystemClock)
    }
}

impl<E: DocumentEngine, C: Clock> App<E, FrameBuffer, C> {
    /// Viewer drawing into an in-memory frame of the configured window size
    pub fn offscreen(engine: E, settings: Settings, clock: C) -> Result<Self> {
        let target = FrameBuffer::new(settings.window_width, settings.window_height)?;
        Self::with_clock(engine, target, settings, clock)
    }
}

impl<E: DocumentEngine, T: PixelTarget, C: Clock> App<E, T, C> {
    /// Build the viewer sized to `target` and show the top of the document
    pub fn with_clock(engine: E, target: T, settings: Settings, clock: C) -> Result<Self> {
        let (width, height) = target.size();
        let cache = PageCache::new(engine, settings.dark_mode, settings.brightness);
        let view = ScrollBuffer::new(cache, width, height)?;
        let controller = ScrollController::with_clock(settings.scroll_config(), clock);
        info!(
            "viewer {width}x{height}, {} pages, dark mode {}",
            view.source().page_count(),
            settings.dark_mode
        );

        let mut app = Self {
            view,
            target,
            controller,
            settings,
        };
        let shown = app.refresh();
        recover(shown)?;
        Ok(app)
    }

    /// React to one input event
    pub fn handle_event(&mut self, event: Event) -> Result<AppAction, ViewError> {
        debug!("event {event:?}");
        let line = self.controller.config().scroll_step as isize;
        let page = self.page_step();
        match event {
            Event::ScrollDown => self.scroll_by(line)?,
            Event::ScrollUp => self.scroll_by(-line)?,
            Event::PageDown => self.scroll_by(page)?,
            Event::PageUp => self.scroll_by(-page)?,
            Event::ToggleDarkMode => {
                self.view.source_mut().flip_dark_mode();
                self.refresh()?;
            }
            Event::Resize { width, height } => {
                self.target.resize(width, height)?;
                self.view.resize(width, height)?;
                self.view.present(&mut self.target)?;
            }
            Event::Expose => self.view.present(&mut self.target)?,
            Event::Quit => return Ok(AppAction::Quit),
        }
        Ok(AppAction::Continue)
    }

    /// Render one page near the viewport that is not cached yet
    pub fn prefetch_step(&mut self) -> Result<Option<usize>, RenderError> {
        let (y, height) = (self.view.document_y(), self.view.height());
        let radius = self.settings.prefetch_radius;
        self.view.source_mut().prefetch_near(y, height, radius)
    }

    fn scroll_by(&mut self, offset: isize) -> Result<(), ViewError> {
        self.controller
            .animate(&mut self.view, &mut self.target, offset)?;
        Ok(())
    }

    fn page_step(&self) -> isize {
        self.controller.config().page_step(self.view.height()) as isize
    }

    /// Refill the viewport at its current offset and show it
    fn refresh(&mut self) -> Result<(), ViewError> {
        self.view.reload()?;
        self.view.present(&mut self.target)
    }

    pub fn view(&self) -> &ScrollBuffer<PageCache<E>> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ScrollBuffer<PageCache<E>> {
        &mut self.view
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Log render failures and keep going; the next access retries the page
fn recover(result: Result<(), ViewError>) -> Result<(), ViewError> {
    match result {
        Err(ViewError::Render(e)) => {
            warn!("render failed, showing stale viewport: {e}");
            Ok(())
        }
        other => other,
    }
}

/// Dispatch events until `Quit`, prefetching pages whenever input is idle
pub fn run_app_with_event_source<E, T, C>(
    app: &mut App<E, T, C>,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    E: DocumentEngine,
    T: PixelTarget,
    C: Clock,
{
    loop {
        let event = if event_source.poll(Duration::ZERO)? {
            event_source.read()?
        } else {
            match app.prefetch_step() {
                Ok(Some(page)) => {
                    debug!("prefetched page {page}");
                    continue;
                }
                Ok(None) => {}
                Err(e) => warn!("prefetch failed: {e}"),
            }
            // Nothing left to do until the next event
            event_source.read()?
        };

        match app.handle_event(event) {
            Ok(AppAction::Quit) => break,
            Ok(AppAction::Continue) => {}
            Err(e) => recover(Err(e))?,
        }
    }
    info!("viewer closed");
    Ok(())
}
