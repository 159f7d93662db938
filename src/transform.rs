// transform.rs -- Index-mapping engine behind transpose, rotate and flip.
//
// Every geometric transform is the same copy loop:
//
//   for each source cell (i, j):
//       target[selector(i, j, height, width)] = source[i * width + j]
//
// Only the destination index formula changes. Keeping one loop and a closed
// `Selector` enum means the bounds checks live in exactly one place and the
// compiler can inline each formula into its own monomorphic loop body.
//
// Index formulas (h = source height, w = source width):
//
//   Identity        i*w + j                 shape (h, w)
//   Transpose       j*h + i                 shape (w, h)
//   Rotate90        (w-1-j)*h + i           shape (w, h)
//   Rotate180       w*h - 1 - (i*w + j)     shape (h, w)
//   Rotate270       j*h + (h-1-i)           shape (w, h)
//   FlipHorizontal  i*w + (w-1-j)           shape (h, w)
//   FlipVertical    (h-1-i)*w + j           shape (h, w)
//
// Rotate90 turns the image a quarter counter-clockwise: the last column of
// the source becomes the first row of the result.

use crate::error::{ImageError, Result};

/// Destination index formula for one transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    Identity,
    Transpose,
    Rotate90,
    Rotate180,
    Rotate270,
    FlipHorizontal,
    FlipVertical,
}

impl Selector {
    /// Linear destination offset for source cell `(i, j)`.
    #[inline(always)]
    pub fn target_index(self, i: usize, j: usize, height: usize, width: usize) -> usize {
        match self {
            Selector::Identity => i * width + j,
            Selector::Transpose => j * height + i,
            Selector::Rotate90 => (width - 1 - j) * height + i,
            Selector::Rotate180 => width * height - 1 - (i * width + j),
            Selector::Rotate270 => j * height + (height - 1 - i),
            Selector::FlipHorizontal => i * width + (width - 1 - j),
            Selector::FlipVertical => (height - 1 - i) * width + j,
        }
    }

    /// Shape `(height, width)` of the result for a `height × width` source.
    pub fn output_shape(self, height: usize, width: usize) -> (usize, usize) {
        match self {
            Selector::Transpose | Selector::Rotate90 | Selector::Rotate270 => (width, height),
            Selector::Identity
            | Selector::Rotate180
            | Selector::FlipHorizontal
            | Selector::FlipVertical => (height, width),
        }
    }
}

/// Quarter-turn rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// `None` for anything other than 0, 90, 180 or 270.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

impl From<Rotation> for Selector {
    fn from(rotation: Rotation) -> Self {
        match rotation {
            Rotation::Deg0 => Selector::Identity,
            Rotation::Deg90 => Selector::Rotate90,
            Rotation::Deg180 => Selector::Rotate180,
            Rotation::Deg270 => Selector::Rotate270,
        }
    }
}

/// Mirror axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlipDirection {
    /// Mirror left-right: column `j` moves to `width - 1 - j`.
    Horizontal,
    /// Mirror top-bottom: row `i` moves to `height - 1 - i`.
    Vertical,
}

impl From<FlipDirection> for Selector {
    fn from(direction: FlipDirection) -> Self {
        match direction {
            FlipDirection::Horizontal => Selector::FlipHorizontal,
            FlipDirection::Vertical => Selector::FlipVertical,
        }
    }
}

/// Copy `source` (a row-major `height × width` grid) into `target`,
/// placing each cell where `selector` says.
///
/// # Errors
/// `InvalidShape` if `target` is shorter than `source` or than
/// `height * width`, or if `source` holds fewer than `height * width`
/// elements. Nothing is written in that case.
pub fn transform<T: Copy>(
    source: &[T],
    target: &mut [T],
    height: usize,
    width: usize,
    selector: Selector,
) -> Result<()> {
    let cells = height
        .checked_mul(width)
        .ok_or_else(|| ImageError::InvalidShape(format!("{height}×{width} overflows usize")))?;
    if target.len() < source.len() {
        return Err(ImageError::InvalidShape(format!(
            "target holds {} elements, source holds {}",
            target.len(),
            source.len()
        )));
    }
    if target.len() < cells || source.len() < cells {
        return Err(ImageError::InvalidShape(format!(
            "{height}×{width} needs {cells} elements (source {}, target {})",
            source.len(),
            target.len()
        )));
    }

    apply(source, target, height, width, selector);
    Ok(())
}

/// The copy loop without precondition checks. Callers guarantee both
/// buffers hold at least `height * width` elements.
pub(crate) fn apply<T: Copy>(
    source: &[T],
    target: &mut [T],
    height: usize,
    width: usize,
    selector: Selector,
) {
    log::trace!("transform {selector:?} over {height}×{width}");
    for i in 0..height {
        let row = &source[i * width..(i + 1) * width];
        for (j, &value) in row.iter().enumerate() {
            target[selector.target_index(i, j, height, width)] = value;
        }
    }
}
