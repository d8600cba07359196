//! Packing from `image` crate buffers.

use image::DynamicImage;

use super::packer::Packer;
use crate::error::PackError;
use crate::options::ColorType;

/// Convert any decoded image into the raw sample layout the packer expects.
///
/// 16-bit samples are written big-endian, as PNG stores them.
pub fn pixels_from_image(image: &DynamicImage, color_type: ColorType, bit_depth: u8) -> Vec<u8> {
    match (color_type, bit_depth) {
        (ColorType::Truecolor, 16) => image
            .to_rgb16()
            .into_raw()
            .into_iter()
            .flat_map(u16::to_be_bytes)
            .collect(),
        (ColorType::TruecolorAlpha, 16) => image
            .to_rgba16()
            .into_raw()
            .into_iter()
            .flat_map(u16::to_be_bytes)
            .collect(),
        (ColorType::Truecolor, _) => image.to_rgb8().into_raw(),
        (ColorType::TruecolorAlpha, _) => image.to_rgba8().into_raw(),
    }
}

impl Packer {
    /// Pack a `DynamicImage`, converting it to the configured color type and depth.
    pub fn pack_image(&self, image: &DynamicImage, gamma: Option<f64>) -> Result<Vec<u8>, PackError> {
        let options = self.options();
        let pixels = pixels_from_image(image, options.color_type, options.bit_depth);
        self.pack_to_vec(&pixels, image.width(), image.height(), gamma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::PackerOptions;
    use image::{ImageBuffer, ImageFormat, Rgb, Rgba};

    fn decode(png: &[u8]) -> DynamicImage {
        image::load_from_memory_with_format(png, ImageFormat::Png).unwrap()
    }

    fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x * 20) as u8, (y * 30) as u8, ((x + y) * 7) as u8, 255 - x as u8])
        }))
    }

    #[test]
    fn test_rgba8_decodes_with_image_crate() {
        let source = gradient_rgba(9, 6);
        let png = Packer::new(PackerOptions::default())
            .unwrap()
            .pack_image(&source, None)
            .unwrap();

        let decoded = decode(&png);
        assert_eq!(decoded.width(), 9);
        assert_eq!(decoded.height(), 6);
        assert_eq!(decoded.to_rgba8().into_raw(), source.to_rgba8().into_raw());
    }

    #[test]
    fn test_rgb8_decodes_with_image_crate() {
        let mut opts = PackerOptions::default();
        opts.color_type = ColorType::Truecolor;
        let packer = Packer::new(opts).unwrap();

        let source = DynamicImage::ImageRgb8(ImageBuffer::from_fn(5, 5, |x, y| {
            Rgb([(x * 50) as u8, (y * 50) as u8, 128])
        }));
        let png = packer.pack_image(&source, Some(2.2)).unwrap();

        let decoded = decode(&png);
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
        assert_eq!(decoded.to_rgb8().into_raw(), source.to_rgb8().into_raw());
    }

    #[test]
    fn test_rgba16_decodes_with_image_crate() {
        let mut opts = PackerOptions::default();
        opts.bit_depth = 16;
        let packer = Packer::new(opts).unwrap();

        let source = DynamicImage::ImageRgba16(ImageBuffer::from_fn(4, 3, |x, y| {
            Rgba([x as u16 * 1000, y as u16 * 2000, 0xABCD, 0xFFFF])
        }));
        let png = packer.pack_image(&source, None).unwrap();

        let decoded = decode(&png);
        assert!(matches!(decoded, DynamicImage::ImageRgba16(_)));
        assert_eq!(decoded.to_rgba16().into_raw(), source.to_rgba16().into_raw());
    }

    #[test]
    fn test_one_pixel_image() {
        let source = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(1, 1, Rgba([1, 2, 3, 4])));
        let png = Packer::new(PackerOptions::default())
            .unwrap()
            .pack_image(&source, None)
            .unwrap();

        assert_eq!(&png[0..8], &crate::encode::PNG_SIGNATURE);
        assert_eq!(decode(&png).to_rgba8().into_raw(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_sixteen_bit_samples_are_big_endian() {
        let source = DynamicImage::ImageRgb16(ImageBuffer::from_pixel(1, 1, Rgb([0x0102, 0x0304, 0x0506])));
        let pixels = pixels_from_image(&source, ColorType::Truecolor, 16);
        assert_eq!(pixels, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_alpha_added_for_rgb_source() {
        let source = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(1, 1, Rgb([10, 20, 30])));
        let pixels = pixels_from_image(&source, ColorType::TruecolorAlpha, 8);
        assert_eq!(pixels, vec![10, 20, 30, 255]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
