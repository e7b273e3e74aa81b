use image::{imageops, DynamicImage, ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};

/// Composite `image` over an opaque canvas filled with `colour` and drop the
/// alpha channel.
///
/// Fully transparent pixels come out as exactly `colour`; fully opaque pixels
/// keep their source colour channels.
pub fn flatten_onto(image: &RgbaImage, colour: Rgb<u8>) -> RgbImage {
    let Rgb([r, g, b]) = colour;
    let mut canvas: RgbaImage =
        ImageBuffer::from_pixel(image.width(), image.height(), Rgba([r, g, b, 255]));
    imageops::overlay(&mut canvas, image, 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn transparent_pixels_take_the_background_colour() {
        let image = RgbaImage::from_pixel(3, 3, Rgba([200, 10, 10, 0]));
        let flat = flatten_onto(&image, Rgb([0, 128, 255]));
        assert_eq!(flat.get_pixel(1, 1), &Rgb([0, 128, 255]));
    }

    #[test]
    fn opaque_pixels_keep_their_colour() {
        let image = RgbaImage::from_pixel(3, 3, Rgba([200, 10, 10, 255]));
        let flat = flatten_onto(&image, WHITE);
        assert_eq!(flat.get_pixel(0, 0), &Rgb([200, 10, 10]));
    }

    #[test]
    fn flattening_opaque_input_is_identity_on_colour_channels() {
        let image = RgbaImage::from_fn(4, 4, |x, y| {
            Rgba([(x * 60) as u8, (y * 60) as u8, 77, 255])
        });
        let flat = flatten_onto(&image, WHITE);
        for (x, y, Rgba([r, g, b, _])) in image.enumerate_pixels() {
            assert_eq!(flat.get_pixel(x, y), &Rgb([*r, *g, *b]));
        }
    }

    #[test]
    fn output_dimensions_match_input() {
        let image = RgbaImage::new(7, 5);
        let flat = flatten_onto(&image, WHITE);
        assert_eq!(flat.dimensions(), (7, 5));
    }
}
