//! Viewport presentation: wraparound store, smooth scrolling and targets

mod controller;
mod scroll_buffer;
mod target;

pub use controller::{Clock, ScrollConfig, ScrollController, SystemClock};
pub use scroll_buffer::{PixelSource, ScrollBuffer};
pub use target::{FrameBuffer, PixelTarget};
