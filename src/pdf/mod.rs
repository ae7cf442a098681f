//! Page rendering infrastructure

mod cache;
mod dark_mode;
mod engine;
pub(crate) mod error;
#[cfg(feature = "pdf")]
mod mupdf_engine;
mod types;

pub use cache::PageCache;
pub use dark_mode::DarkModeTransform;
pub use engine::DocumentEngine;
pub use error::{RenderError, ViewError};
#[cfg(feature = "pdf")]
pub use mupdf_engine::MupdfEngine;
pub use types::*;
