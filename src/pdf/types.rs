//! Core types for page rendering

/// One RGBA pixel, 8 bits per channel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const WHITE: Pixel = Pixel::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Pixel = Pixel::rgb(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque pixel
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    #[must_use]
    pub const fn with_rgb(self, r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, self.a)
    }

    /// True when the color channels are pure white, whatever the alpha
    #[must_use]
    pub const fn is_white(self) -> bool {
        self.r == 0xFF && self.g == 0xFF && self.b == 0xFF
    }
}

/// Axis-aligned rectangle in device pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    #[must_use]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn right(&self) -> usize {
        self.x + self.width
    }

    #[must_use]
    pub const fn bottom(&self) -> usize {
        self.y + self.height
    }

    #[must_use]
    pub const fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Rectangle covering an embedded image, in the page's local device pixels.
///
/// Produced by the engine while rasterizing a page and consumed by the dark
/// mode transform, which darkens these pixels instead of inverting them.
pub type ImageRegion = Rect;

/// Intrinsic page size in document units (points for PDF)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PageBounds {
    pub width: f32,
    pub height: f32,
}

impl PageBounds {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Scale factor that maps this page onto `target_width` pixels
    #[must_use]
    pub fn scale_for_width(&self, target_width: usize) -> f32 {
        if self.width > 0.0 && self.width.is_finite() {
            target_width as f32 / self.width
        } else {
            0.0
        }
    }

    /// Pixel height of this page when rendered at `target_width`
    #[must_use]
    pub fn scaled_height(&self, target_width: usize) -> usize {
        let height = self.height * self.scale_for_width(target_width);
        if height.is_finite() && height > 0.0 {
            height.round() as usize
        } else {
            0
        }
    }
}

/// Parameters every page of the cache is rendered with
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Display width in pixels, 0 until the first query
    pub target_width: usize,
    pub dark_mode: bool,
    /// Dark mode brightness in (0, 1]
    pub brightness: f32,
}

impl RenderOptions {
    pub const DEFAULT_BRIGHTNESS: f32 = 0.5;

    #[must_use]
    pub fn new(dark_mode: bool, brightness: f32) -> Self {
        Self {
            target_width: 0,
            dark_mode,
            brightness: Self::clamp_brightness(brightness),
        }
    }

    /// Clamp brightness into (0, 1], handling NaN/Inf and non-positive values
    #[must_use]
    pub fn clamp_brightness(brightness: f32) -> f32 {
        if !brightness.is_finite() || brightness <= 0.0 {
            Self::DEFAULT_BRIGHTNESS
        } else {
            brightness.min(1.0)
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new(true, Self::DEFAULT_BRIGHTNESS)
    }
}

/// Extension trait for Vec operations
pub trait VecExt<T> {
    /// Reset vector to a given length, clearing existing items
    fn reset_to_len(&mut self, len: usize)
    where
        T: Default;
}

impl<T> VecExt<T> for Vec<T> {
    #[inline]
    fn reset_to_len(&mut self, len: usize)
    where
        T: Default,
    {
        self.clear();
        self.resize_with(len, T::default);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_height_rounds_to_nearest() {
        let letter = PageBounds::new(612.0, 792.0);
        // 792 * 100 / 612 = 129.41
        assert_eq!(letter.scaled_height(100), 129);
        // 792 * 200 / 612 = 258.82
        assert_eq!(letter.scaled_height(200), 259);
    }

    #[test]
    fn degenerate_bounds_have_no_height() {
        assert_eq!(PageBounds::new(0.0, 792.0).scaled_height(100), 0);
        assert_eq!(PageBounds::new(f32::NAN, 792.0).scaled_height(100), 0);
        assert_eq!(PageBounds::new(612.0, 792.0).scaled_height(0), 0);
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(2, 3, 4, 5);
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 7));
        assert!(!r.contains(6, 3));
        assert!(!r.contains(2, 8));
        assert!(!r.contains(1, 3));
    }

    #[test]
    fn brightness_is_clamped() {
        assert_eq!(RenderOptions::clamp_brightness(0.3), 0.3);
        assert_eq!(RenderOptions::clamp_brightness(4.0), 1.0);
        assert_eq!(RenderOptions::clamp_brightness(0.0), 0.5);
        assert_eq!(RenderOptions::clamp_brightness(f32::NAN), 0.5);
    }

    #[test]
    fn reset_to_len_clears_flags() {
        let mut flags = vec![true, true];
        flags.reset_to_len(3);
        assert_eq!(flags, vec![false, false, false]);
    }
}
