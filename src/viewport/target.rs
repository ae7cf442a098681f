//! Presentation surfaces

use std::path::Path;

use image::RgbaImage;

use crate::pdf::error::try_alloc_pixels;
use crate::pdf::{Pixel, Rect, ViewError};

/// A fixed-size pixel surface the viewport is drawn onto
pub trait PixelTarget {
    /// Current (width, height) in pixels
    fn size(&self) -> (usize, usize);

    /// Reallocate the surface for a new size. Contents are undefined afterwards.
    fn resize(&mut self, width: usize, height: usize) -> Result<(), ViewError>;

    /// Copy `pixels` into `dst`. Source rows are `stride` pixels apart.
    fn update(&mut self, dst: Rect, pixels: &[Pixel], stride: usize) -> Result<(), ViewError>;

    /// Make everything updated so far visible
    fn present(&mut self) -> Result<(), ViewError>;
}

/// In-memory surface
#[derive(Debug, Default)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
    presented: Vec<Pixel>,
    frames: u64,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Result<Self, ViewError> {
        let mut frame = Self::default();
        frame.resize(width, height)?;
        Ok(frame)
    }

    /// Pixels of the last presented frame
    #[must_use]
    pub fn presented(&self) -> &[Pixel] {
        &self.presented
    }

    /// Row `y` of the last presented frame
    #[must_use]
    pub fn presented_row(&self, y: usize) -> &[Pixel] {
        let start = (y * self.width).min(self.presented.len());
        let end = (start + self.width).min(self.presented.len());
        &self.presented[start..end]
    }

    /// Number of `present` calls since creation
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Last presented frame as an image
    pub fn to_image(&self) -> anyhow::Result<RgbaImage> {
        let bytes: Vec<u8> = self
            .presented
            .iter()
            .flat_map(|p| [p.r, p.g, p.b, p.a])
            .collect();
        RgbaImage::from_raw(self.width as u32, self.height as u32, bytes)
            .ok_or_else(|| anyhow::anyhow!("frame size {}x{} mismatch", self.width, self.height))
    }

    /// Write the last presented frame as a PNG file
    pub fn save_png(&self, path: &Path) -> anyhow::Result<()> {
        self.to_image()?.save(path)?;
        Ok(())
    }
}

impl PixelTarget for FrameBuffer {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: usize, height: usize) -> Result<(), ViewError> {
        let len = width.checked_mul(height);
        self.pixels = try_alloc_pixels(len, "frame buffer")?;
        self.presented = try_alloc_pixels(len, "frame buffer")?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn update(&mut self, dst: Rect, pixels: &[Pixel], stride: usize) -> Result<(), ViewError> {
        if dst.right() > self.width || dst.bottom() > self.height {
            return Err(ViewError::target(format!(
                "update {dst:?} outside {}x{} surface",
                self.width, self.height
            )));
        }
        if dst.is_empty() {
            return Ok(());
        }
        if stride < dst.width || pixels.len() < (dst.height - 1) * stride + dst.width {
            return Err(ViewError::target(format!(
                "{} source pixels too short for {dst:?} with stride {stride}",
                pixels.len()
            )));
        }

        for row in 0..dst.height {
            let src = &pixels[row * stride..row * stride + dst.width];
            let start = (dst.y + row) * self.width + dst.x;
            self.pixels[start..start + dst.width].copy_from_slice(src);
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), ViewError> {
        self.presented.copy_from_slice(&self.pixels);
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_invisible_until_present() {
        let mut frame = FrameBuffer::new(2, 2).unwrap();
        frame
            .update(Rect::new(0, 1, 2, 1), &[Pixel::WHITE; 2], 2)
            .unwrap();
        assert_eq!(frame.presented_row(1), &[Pixel::default(); 2]);

        frame.present().unwrap();
        assert_eq!(frame.presented_row(1), &[Pixel::WHITE; 2]);
        assert_eq!(frame.presented_row(0), &[Pixel::default(); 2]);
        assert_eq!(frame.frames(), 1);
    }

    #[test]
    fn update_honors_stride() {
        let mut frame = FrameBuffer::new(3, 2).unwrap();
        let src = [
            Pixel::WHITE,
            Pixel::BLACK,
            Pixel::rgb(1, 1, 1),
            Pixel::rgb(2, 2, 2),
            Pixel::rgb(3, 3, 3),
        ];
        frame.update(Rect::new(1, 0, 1, 2), &src, 3).unwrap();
        frame.present().unwrap();
        assert_eq!(frame.presented()[1], Pixel::WHITE);
        assert_eq!(frame.presented()[4], Pixel::rgb(2, 2, 2));
    }

    #[test]
    fn update_outside_surface_is_rejected() {
        let mut frame = FrameBuffer::new(2, 2).unwrap();
        let err = frame
            .update(Rect::new(0, 1, 2, 2), &[Pixel::WHITE; 4], 2)
            .unwrap_err();
        assert!(matches!(err, ViewError::Target { .. }));
    }

    #[test]
    fn short_source_is_rejected() {
        let mut frame = FrameBuffer::new(2, 2).unwrap();
        assert!(
            frame
                .update(Rect::new(0, 0, 2, 2), &[Pixel::WHITE; 3], 2)
                .is_err()
        );
    }

    #[test]
    fn frame_exports_as_png() {
        let mut frame = FrameBuffer::new(4, 3).unwrap();
        frame
            .update(Rect::new(0, 0, 4, 3), &[Pixel::rgb(10, 20, 30); 12], 4)
            .unwrap();
        frame.present().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        frame.save_png(&path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(3, 2).0, [10, 20, 30, 255]);
    }
}
