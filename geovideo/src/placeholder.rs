//! Synthetic tiles served in offline mode.
//!
//! Every placeholder is a PNG with a pastel background derived from the tile address, a border,
//! and the zoom, x and y printed in the middle, one number per line. The same address always
//! gives byte-identical output.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::TileAddress;
use crate::mercator::TILE_SIZE;

const BORDER: u32 = 2;
const BORDER_COLOR: Rgba<u8> = Rgba([96, 96, 96, 255]);
const TEXT_COLOR: Rgba<u8> = Rgba([32, 32, 32, 255]);

/// Size of one font pixel.
const SCALE: u32 = 4;
const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
const GLYPH_SPACING: u32 = 1;
const LINE_SPACING: u32 = 2;

/// 3x5 bitmaps of digits, one row per entry, most significant bit on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Render the placeholder for `address` and encode it as PNG.
pub fn placeholder_tile(address: TileAddress) -> Result<Vec<u8>, image::ImageError> {
    let image = render(address);

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

fn render(address: TileAddress) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, background(address));

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if x < BORDER || y < BORDER || x >= TILE_SIZE - BORDER || y >= TILE_SIZE - BORDER {
            *pixel = BORDER_COLOR;
        }
    }

    let lines = [
        address.zoom.to_string(),
        address.x.to_string(),
        address.y.to_string(),
    ];

    let line_height = (GLYPH_HEIGHT + LINE_SPACING) * SCALE;
    let text_height = lines.len() as u32 * line_height - LINE_SPACING * SCALE;
    let mut top = TILE_SIZE.saturating_sub(text_height) / 2;

    for line in &lines {
        draw_line(&mut image, line, top);
        top += line_height;
    }

    image
}

/// Draw a horizontally centered line of digits.
fn draw_line(image: &mut RgbaImage, text: &str, top: u32) {
    let advance = (GLYPH_WIDTH + GLYPH_SPACING) * SCALE;
    let width = text.len() as u32 * advance - GLYPH_SPACING * SCALE;
    let mut left = TILE_SIZE.saturating_sub(width) / 2;

    for digit in text.chars().filter_map(|c| c.to_digit(10)) {
        draw_digit(image, digit as usize, left, top);
        left += advance;
    }
}

fn draw_digit(image: &mut RgbaImage, digit: usize, left: u32, top: u32) {
    for (row, bits) in DIGITS[digit].iter().enumerate() {
        for column in 0..GLYPH_WIDTH {
            if bits & (1 << (GLYPH_WIDTH - 1 - column)) == 0 {
                continue;
            }

            let x0 = left + column * SCALE;
            let y0 = top + row as u32 * SCALE;
            for y in y0..y0 + SCALE {
                for x in x0..x0 + SCALE {
                    if let Some(pixel) = image.get_pixel_mut_checked(x, y) {
                        *pixel = TEXT_COLOR;
                    }
                }
            }
        }
    }
}

/// Light color derived from the address, so that neighboring tiles are easy to tell apart.
fn background(address: TileAddress) -> Rgba<u8> {
    let mut key = vec![address.zoom];
    key.extend(address.x.to_le_bytes());
    key.extend(address.y.to_le_bytes());

    let [r, g, b, ..] = fnv1a(&key).to_le_bytes();

    // Keep it pastel, so the text stays readable.
    let pastel = |channel: u8| 160 + channel % 80;
    Rgba([pastel(r), pastel(g), pastel(b), 255])
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}
