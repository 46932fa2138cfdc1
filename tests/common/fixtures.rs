use floorplan_zones::Color;
use image::{ImageBuffer, Rgba, RgbaImage};
use tempfile::NamedTempFile;

/// Fill colors used by the synthetic floor plans
pub const APARTMENT_GREEN: Color = Color { r: 120, g: 190, b: 110 };
pub const APARTMENT_BLUE: Color = Color { r: 90, g: 140, b: 220 };
pub const APARTMENT_ORANGE: Color = Color { r: 240, g: 160, b: 70 };

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const WALL: Rgba<u8> = Rgba([30, 30, 30, 255]);

/// A filled rectangle, `[x0, x1) x [y0, y1)`
#[derive(Debug, Clone, Copy)]
pub struct Room {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
    pub color: Color,
}

pub fn room(x0: u32, y0: u32, x1: u32, y1: u32, color: Color) -> Room {
    Room { x0, y0, x1, y1, color }
}

impl Room {
    fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

/// White plan with the given rooms painted in; later rooms win on overlap
pub fn floor_plan(width: u32, height: u32, rooms: &[Room]) -> RgbaImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        rooms
            .iter()
            .rev()
            .find(|r| r.contains(x, y))
            .map(|r| rgba(r.color))
            .unwrap_or(WHITE)
    })
}

/// 200x200 image filled with one color except a 1px white border
pub fn solid_rectangle_plan(color: Color) -> RgbaImage {
    floor_plan(200, 200, &[room(1, 1, 199, 199, color)])
}

/// Six apartments in two rows of three, separated by dark walls,
/// alternating two fill colors
pub fn two_row_building() -> RgbaImage {
    let mut rooms = Vec::new();
    for row in 0..2u32 {
        for col in 0..3u32 {
            let color = if (row + col) % 2 == 0 { APARTMENT_GREEN } else { APARTMENT_BLUE };
            let x0 = 20 + col * 130;
            let y0 = 20 + row * 150;
            rooms.push(room(x0, y0, x0 + 110, y0 + 120, color));
        }
    }

    let mut image = floor_plan(420, 330, &rooms);
    // Walls between the units
    for y in 0..330 {
        for x in 0..420 {
            if image.get_pixel(x, y) == &WHITE && (x % 130 < 6 || y % 150 < 6) {
                image.put_pixel(x, y, WALL);
            }
        }
    }
    image
}

/// Save `image` as a PNG temp file, deleted when dropped
pub fn write_png(image: &RgbaImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    image
        .save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}
