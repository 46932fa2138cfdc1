use super::mask::Mask;
use crate::models::Point;

/// Moore neighborhood, clockwise in image coordinates starting from east
const DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Minimum number of traced points for a usable contour
pub const MIN_CONTOUR_POINTS: usize = 4;

/// Trace the outer boundary of the (single) blob in `mask`.
///
/// Starts at the first boundary pixel in row-major order and follows the
/// 8-connected boundary until it returns to the start, or gives up after
/// `width * height` steps. The loop is closed implicitly; the start point
/// is not repeated. Returns `None` for fewer than four points.
pub fn trace_outer_contour(mask: &Mask) -> Option<Vec<Point>> {
    trace_outer_contour_with_limit(mask, mask.width() as usize * mask.height() as usize)
}

/// Same as [`trace_outer_contour`], with an explicit step budget.
/// Used on cropped region masks, which keep the full image's budget.
pub fn trace_outer_contour_with_limit(mask: &Mask, max_iterations: usize) -> Option<Vec<Point>> {
    let (width, height) = (mask.width(), mask.height());

    let (start_x, start_y) = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .find(|&(x, y)| mask.is_boundary(x, y))?;

    let mut contour = Vec::new();
    let (mut x, mut y) = (start_x, start_y);
    let mut dir = 7usize;
    let mut iterations = 0;

    loop {
        contour.push(Point::new(x as f64, y as f64));

        let next = (0..8).map(|i| (dir + i) % 8).find_map(|d| {
            let (dx, dy) = DIRECTIONS[d];
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                return None;
            }
            mask.is_boundary(nx as u32, ny as u32)
                .then_some((nx as u32, ny as u32, d))
        });

        let Some((nx, ny, d)) = next else {
            break;
        };
        x = nx;
        y = ny;
        // Back up counter-clockwise before the next search
        dir = (d + 5) % 8;
        iterations += 1;

        if (x == start_x && y == start_y) || iterations >= max_iterations {
            break;
        }
    }

    (contour.len() >= MIN_CONTOUR_POINTS).then_some(contour)
}
