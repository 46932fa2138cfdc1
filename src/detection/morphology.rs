//! Binary morphology on [`Mask`]es with a square structuring element.
//!
//! The square kernel is separable, so each operation runs as a horizontal
//! sweep followed by a vertical sweep with a sliding window. Every operation
//! returns a fresh mask; the input is never modified.

use super::mask::Mask;

#[derive(Clone, Copy)]
enum Op {
    Dilate,
    Erode,
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Set a pixel if any pixel in the `(2r+1)²` square around it is set
pub fn dilate(mask: &Mask, radius: u32) -> Mask {
    let pass = sweep(mask, radius, Axis::Horizontal, Op::Dilate);
    sweep(&pass, radius, Axis::Vertical, Op::Dilate)
}

/// Keep a pixel only if every pixel in the `(2r+1)²` square around it is set.
/// Out-of-bounds pixels count as unset, so regions touching the image edge
/// shrink away from it.
pub fn erode(mask: &Mask, radius: u32) -> Mask {
    let pass = sweep(mask, radius, Axis::Horizontal, Op::Erode);
    sweep(&pass, radius, Axis::Vertical, Op::Erode)
}

/// Dilate then erode: fills holes and gaps narrower than the kernel
pub fn close(mask: &Mask, radius: u32) -> Mask {
    erode(&dilate(mask, radius), radius)
}

/// Erode then dilate: removes blobs narrower than the kernel
pub fn open(mask: &Mask, radius: u32) -> Mask {
    dilate(&erode(mask, radius), radius)
}

/// Closing at `radius`, closing at `radius / 2`, then opening at `radius - 1`
/// (the smaller radii never drop below 1).
pub fn cleanup_mask(mask: &Mask, radius: u32) -> Mask {
    let result = close(mask, radius);
    let result = close(&result, (radius / 2).max(1));
    open(&result, radius.saturating_sub(1).max(1))
}

fn sweep(mask: &Mask, radius: u32, axis: Axis, op: Op) -> Mask {
    let (width, height) = (mask.width() as usize, mask.height() as usize);
    let src = mask.as_slice();
    let mut out = vec![0u8; src.len()];

    let (lines, len) = match axis {
        Axis::Horizontal => (height, width),
        Axis::Vertical => (width, height),
    };
    let at = |line: usize, i: usize| match axis {
        Axis::Horizontal => line * width + i,
        Axis::Vertical => i * width + line,
    };

    let r = radius as usize;
    let mut prefix = vec![0u32; len + 1];

    for line in 0..lines {
        for i in 0..len {
            prefix[i + 1] = prefix[i] + (src[at(line, i)] != 0) as u32;
        }

        for i in 0..len {
            let set = match op {
                Op::Dilate => {
                    let lo = i.saturating_sub(r);
                    let hi = (i + r).min(len - 1);
                    prefix[hi + 1] - prefix[lo] > 0
                }
                Op::Erode => {
                    if i < r || i + r >= len {
                        false
                    } else {
                        prefix[i + r + 1] - prefix[i - r] == (2 * r + 1) as u32
                    }
                }
            };
            out[at(line, i)] = set as u8;
        }
    }

    Mask::from_raw(mask.width(), mask.height(), out).unwrap_or_else(|| mask.clone())
}
