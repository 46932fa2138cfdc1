use image::{Rgba, RgbaImage};

/// Three apartments per row, two rows, two fill colors, dark walls
fn main() -> anyhow::Result<()> {
    let colors = [Rgba([120u8, 190, 110, 255]), Rgba([90u8, 140, 220, 255])];
    let mut img = RgbaImage::from_pixel(800, 600, Rgba([255, 255, 255, 255]));

    for row in 0..2u32 {
        for col in 0..3u32 {
            let color = colors[((row + col) % 2) as usize];
            let (x0, y0) = (40 + col * 250, 40 + row * 270);
            for y in y0..y0 + 230 {
                for x in x0..x0 + 220 {
                    img.put_pixel(x, y, color);
                }
            }
        }
    }

    // Walls
    for y in 0..600 {
        for x in 0..800 {
            if x % 250 < 8 || y % 270 < 8 {
                img.put_pixel(x, y, Rgba([30, 30, 30, 255]));
            }
        }
    }

    img.save("floor_plan.png")?;
    println!("Created floor_plan.png (800x600, 6 apartments in 2 colors)");
    Ok(())
}
