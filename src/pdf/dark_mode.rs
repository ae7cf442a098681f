//! Brightness-aware dark mode for rendered pages
//!
//! Works on the HSV value channel only: hue and saturation are kept, so
//! colored text stays recognizably colored. Background and text get their
//! value inverted and scaled by the brightness; pixels inside an image region
//! are only darkened (by brightness squared) so photographs keep their detail.
//!
//! The transform is not an involution. A page must be re-rasterized from the
//! document before it is transformed again.

use super::types::{ImageRegion, Pixel};

const V_MAX: u8 = 0xFF;

/// Per-page dark mode transform for a fixed brightness
#[derive(Clone, Copy, Debug)]
pub struct DarkModeTransform {
    brightness: f32,
    image_factor: f32,
    // Pure white is by far the most common pixel; both of its outputs are
    // computed once through the general path.
    white_outside: Pixel,
    white_inside: Pixel,
}

impl DarkModeTransform {
    #[must_use]
    pub fn new(brightness: f32) -> Self {
        let mut transform = Self {
            brightness,
            image_factor: brightness * brightness,
            white_outside: Pixel::WHITE,
            white_inside: Pixel::WHITE,
        };
        transform.white_outside = transform.map_pixel(Pixel::WHITE, false);
        transform.white_inside = transform.map_pixel(Pixel::WHITE, true);
        transform
    }

    #[must_use]
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Transform one pixel. Alpha is preserved.
    #[must_use]
    pub fn map_pixel(&self, px: Pixel, in_image: bool) -> Pixel {
        let v = value(px);
        let target = if in_image {
            (self.image_factor * f32::from(v)) as u8
        } else {
            (self.brightness * f32::from(V_MAX - v)) as u8
        };
        with_value(px, v, target)
    }

    /// Transform a page raster in place.
    ///
    /// `pixels` holds rows of `width` pixels; `regions` are in the same local
    /// coordinates.
    pub fn apply(&self, pixels: &mut [Pixel], width: usize, regions: &[ImageRegion]) {
        if width == 0 {
            return;
        }
        let mut spans: Vec<(usize, usize)> = Vec::with_capacity(regions.len());
        for (y, row) in pixels.chunks_exact_mut(width).enumerate() {
            spans.clear();
            spans.extend(
                regions
                    .iter()
                    .filter(|r| !r.is_empty() && y >= r.y && y < r.bottom())
                    .map(|r| (r.x, r.right())),
            );

            for (x, px) in row.iter_mut().enumerate() {
                let in_image = spans.iter().any(|&(x0, x1)| x >= x0 && x < x1);
                *px = if px.is_white() {
                    let white = if in_image {
                        self.white_inside
                    } else {
                        self.white_outside
                    };
                    px.with_rgb(white.r, white.g, white.b)
                } else {
                    self.map_pixel(*px, in_image)
                };
            }
        }
    }
}

/// HSV value channel
#[inline]
fn value(px: Pixel) -> u8 {
    px.r.max(px.g).max(px.b)
}

/// Replace the HSV value of `px` (currently `v`) with `target`.
///
/// Scaling every channel by `target / v` keeps hue and saturation exact. A
/// black pixel has no hue, so it becomes gray.
#[inline]
fn with_value(px: Pixel, v: u8, target: u8) -> Pixel {
    if v == 0 {
        return px.with_rgb(target, target, target);
    }
    let v = u32::from(v);
    let t = u32::from(target);
    let scale = |c: u8| ((u32::from(c) * t + v / 2) / v) as u8;
    px.with_rgb(scale(px.r), scale(px.g), scale(px.b))
}
