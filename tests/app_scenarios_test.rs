use std::time::Duration;

use pdfroll::event_source::EventSource;
use pdfroll::pdf::{PageCache, Pixel};
use pdfroll::settings::Settings;
use pdfroll::test_utils::test_helpers::ScenarioBuilder;
use pdfroll::test_utils::{ManualClock, SyntheticEngine};
use pdfroll::viewport::{FrameBuffer, PixelTarget};
use pdfroll::{App, run_app_with_event_source};

const WIDTH: usize = 100;
const HEIGHT: usize = 80;

type TestApp = App<SyntheticEngine, FrameBuffer, ManualClock>;

fn create_app(pages: usize, dark_mode: bool) -> TestApp {
    let settings = Settings {
        dark_mode,
        prefetch_radius: 2,
        ..Settings::default()
    };
    App::with_clock(
        SyntheticEngine::uniform(pages, 100.0, 100.0),
        FrameBuffer::new(WIDTH, HEIGHT).unwrap(),
        settings,
        ManualClock::new(Duration::from_millis(5)),
    )
    .unwrap()
}

/// What a correct viewport shows at document row `y`
fn expected_frame(pages: usize, dark_mode: bool, y: usize, width: usize) -> Vec<Pixel> {
    let mut cache = PageCache::new(SyntheticEngine::uniform(pages, 100.0, 100.0), dark_mode, 0.5);
    cache.get(y, HEIGHT, width).unwrap().to_vec()
}

fn run(app: &mut TestApp, mut events: impl EventSource) {
    run_app_with_event_source(app, &mut events).unwrap();
}

#[test]
fn test_initial_frame_shows_document_top() {
    let app = create_app(5, true);

    assert_eq!(app.view().document_y(), 0);
    assert_eq!(app.view().document_height(), 500);
    assert_eq!(app.target().frames(), 1);
    assert_eq!(app.target().presented(), expected_frame(5, true, 0, WIDTH));
}

#[test]
fn test_line_and_page_scrolling() {
    let mut app = create_app(5, true);
    run(
        &mut app,
        ScenarioBuilder::new().scroll_down(2).page_down().quit().build(),
    );

    // two lines of 100 rows, one page of 0.9 * 80 rows
    assert_eq!(app.view().document_y(), 272);
    assert_eq!(app.target().presented(), expected_frame(5, true, 272, WIDTH));

    run(&mut app, ScenarioBuilder::new().page_up().scroll_up(1).quit().build());
    assert_eq!(app.view().document_y(), 100);
    assert_eq!(app.target().presented(), expected_frame(5, true, 100, WIDTH));
}

#[test]
fn test_scrolling_stops_at_document_edges() {
    let mut app = create_app(3, false);
    run(&mut app, ScenarioBuilder::new().scroll_up(3).quit().build());
    assert_eq!(app.view().document_y(), 0);

    run(&mut app, ScenarioBuilder::new().scroll_down(10).quit().build());
    assert_eq!(app.view().document_y(), 300 - HEIGHT);
    assert_eq!(
        app.target().presented(),
        expected_frame(3, false, 300 - HEIGHT, WIDTH)
    );
}

#[test]
fn test_dark_mode_toggle() {
    let mut app = create_app(2, true);
    let dark = app.target().presented().to_vec();
    assert_eq!(dark[WIDTH - 1], Pixel::BLACK);

    run(&mut app, ScenarioBuilder::new().toggle_dark_mode().quit().build());
    assert!(!app.view().source().options().dark_mode);
    assert_eq!(app.target().presented()[WIDTH - 1], Pixel::WHITE);

    run(&mut app, ScenarioBuilder::new().toggle_dark_mode().quit().build());
    assert_eq!(app.target().presented(), dark.as_slice());
}

#[test]
fn test_resize_keeps_relative_position() {
    let mut app = create_app(5, false);
    run(&mut app, ScenarioBuilder::new().scroll_down(1).quit().build());
    assert_eq!(app.view().document_y(), 100);

    run(
        &mut app,
        ScenarioBuilder::new().resize(WIDTH * 2, HEIGHT).quit().build(),
    );

    assert_eq!(app.target().size(), (WIDTH * 2, HEIGHT));
    assert_eq!(app.view().document_height(), 1000);
    assert_eq!(app.view().document_y(), 200);
    assert_eq!(
        app.target().presented(),
        expected_frame(5, false, 200, WIDTH * 2)
    );
}

#[test]
fn test_offscreen_app_uses_configured_window_size() {
    let settings = Settings {
        window_width: 120,
        window_height: 90,
        ..Settings::default()
    };
    let app = App::offscreen(
        SyntheticEngine::uniform(2, 100.0, 100.0),
        settings,
        ManualClock::new(Duration::from_millis(5)),
    )
    .unwrap();

    assert_eq!(app.target().size(), (120, 90));
    assert_eq!((app.view().width(), app.view().height()), (120, 90));
    assert_eq!(app.view().document_height(), 240);
    assert_eq!(app.target().frames(), 1);
}

#[test]
fn test_expose_redraws_without_moving() {
    let mut app = create_app(2, true);
    let before = app.target().frames();
    run(&mut app, ScenarioBuilder::new().expose().quit().build());

    assert_eq!(app.target().frames(), before + 1);
    assert_eq!(app.view().document_y(), 0);
}

#[test]
fn test_idle_prefetch_renders_nearby_pages() {
    let mut app = create_app(6, true);
    assert!(app.view().source().is_rendered(0));
    assert!(!app.view().source().is_rendered(1));

    run(&mut app, ScenarioBuilder::new().build());

    let cache = app.view().source();
    assert!(cache.is_rendered(1));
    assert!(cache.is_rendered(2));
    assert!(!cache.is_rendered(3));
}

#[test]
fn test_render_failure_does_not_stop_the_viewer() {
    let mut app = create_app(3, false);
    app.view_mut().source_mut().engine_mut().fail_page(1);

    run(&mut app, ScenarioBuilder::new().scroll_down(1).quit().build());
    // the viewport advanced up to the failing page and stayed consistent
    let y = app.view().document_y();
    assert!(y <= 100 - HEIGHT);
    assert!(!app.view().source().is_rendered(1));
    assert_eq!(app.target().presented(), expected_frame(3, false, y, WIDTH));

    app.view_mut().source_mut().engine_mut().heal_page(1);
    run(&mut app, ScenarioBuilder::new().scroll_down(1).quit().build());
    assert!(app.view().source().is_rendered(1));
    assert_eq!(app.view().document_y(), (y + 100).min(300 - HEIGHT));
}

#[test]
fn test_frame_exports_as_png() {
    let app = create_app(1, true);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");

    app.target().save_png(&path).unwrap();

    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (WIDTH as u32, HEIGHT as u32));
    let expected = app.target().presented()[WIDTH - 1];
    assert_eq!(image.get_pixel(WIDTH as u32 - 1, 0).0, [
        expected.r, expected.g, expected.b, expected.a
    ]);
}
