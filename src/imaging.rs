// Decoding photos to display size and rendering them as terminal half-blocks

use crate::domain::Size;
use image::{DynamicImage, GenericImageView, Pixel};
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};
use std::io;
use std::path::Path;

/// Image extensions a directory store treats as photos
pub const PHOTO_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff",
];

/// Returns true if the extension names a decodable photo format
pub fn is_photo_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    PHOTO_EXTENSIONS.contains(&ext.as_str())
}

/// Loads an image from a file path
pub fn load_image(path: &Path) -> io::Result<DynamicImage> {
    image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io_err) => io_err,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    })
}

/// Calculates new dimensions to fit an image within a bound while preserving aspect ratio
pub fn calculate_resize_dimensions(
    original_width: u32,
    original_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    if original_width == 0 || original_height == 0 {
        return (0, 0);
    }

    if original_width <= max_width && original_height <= max_height {
        // Never upscale
        return (original_width, original_height);
    }

    scale_into(original_width, original_height, max_width, max_height)
}

/// Scales to the largest size within the bound, pinning the limiting side exactly
fn scale_into(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let width_ratio = max_width as f64 / width as f64;
    let height_ratio = max_height as f64 / height as f64;

    if width_ratio <= height_ratio {
        let scaled = (height as f64 * width_ratio).round() as u32;
        (max_width, scaled.max(1))
    } else {
        let scaled = (width as f64 * height_ratio).round() as u32;
        (scaled.max(1), max_height)
    }
}

/// Downscales an image so it fits within `target`
pub fn fit_to(img: DynamicImage, target: Size) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (new_width, new_height) =
        calculate_resize_dimensions(width, height, target.width, target.height);

    if (new_width, new_height) == (width, height) || new_width == 0 || new_height == 0 {
        img
    } else {
        // Triangle is fast enough for large originals and looks fine at display size
        img.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle)
    }
}

/// Decodes the photo at `path` bounded to `target`
pub fn decode_to_fit(path: &Path, target: Size) -> io::Result<DynamicImage> {
    load_image(path).map(|img| fit_to(img, target))
}

/// Converts an image to styled lines using half-block characters.
///
/// Each cell shows two vertical pixels: the upper one as the foreground of `▀`, the
/// lower one as the background.
pub fn image_to_halfblock_lines(img: &DynamicImage, width: u32, height: u32) -> Vec<Line<'static>> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let height = height + height % 2;
    let img = img
        .resize_exact(width, height, image::imageops::FilterType::Triangle)
        .to_rgb8();

    (0..height / 2)
        .map(|row| {
            let upper_y = row * 2;
            let lower_y = upper_y + 1;
            let spans: Vec<Span<'static>> = (0..width)
                .map(|x| {
                    let upper = img.get_pixel(x, upper_y).to_rgb();
                    let lower = img.get_pixel(x, lower_y).to_rgb();
                    let style = Style::default()
                        .fg(Color::Rgb(upper[0], upper[1], upper[2]))
                        .bg(Color::Rgb(lower[0], lower[1], lower[2]));
                    Span::styled("▀", style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Renders a photo to fit a terminal area of `cols` x `rows` cells
pub fn render_to_cells(img: &DynamicImage, cols: u16, rows: u16) -> Vec<Line<'static>> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 || cols == 0 || rows == 0 {
        return Vec::new();
    }
    // Two pixels per row; small photos are scaled up to fill the area
    let (fit_width, fit_height) = scale_into(width, height, cols as u32, rows as u32 * 2);
    image_to_halfblock_lines(img, fit_width, fit_height)
}
