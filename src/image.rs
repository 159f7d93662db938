// image.rs -- Dense, immutable 2D container generic over the element kind.
//
// An `Image<T>` owns a contiguous row-major buffer of exactly
// `height * width` elements. Once constructed it never changes: transforms,
// casts and arithmetic all return a fresh Image. That is what makes the
// cached statistics safe. A value computed once stays true for the whole
// lifetime of the buffer, so no cache ever needs invalidating.
//
// Memory layout (height = 2, width = 3):
//
//   data index:  0  1  2  3  4  5
//   cell:       (0,0)(0,1)(0,2)(1,0)(1,1)(1,2)
//   row:         |-- row 0 --| |-- row 1 --|
//
// Coordinates are always (row, col). There is no stride or padding: the
// byte view of the buffer is exactly what `from_bytes` accepts back.
//
// New concepts this file introduces:
// - `FnOnce(&mut [T])` initializers: the closure gets a zeroed buffer before
//   the Image exists, so no half-built Image is ever observable.
// - bytemuck `cast_slice` / `cast_slice_mut` for checked reinterpretation
//   between `[T]` and `[u8]` with no unsafe code here.
// - Borrowed views (`SubView<'_, T>`) whose lifetime is tied to `&self`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use log::trace;

use crate::element::{ElementKind, NumericElement};
use crate::error::{ImageError, Result};
use crate::hash;
use crate::stats::{self, Samples, StatCache, Statistics};
use crate::subview::{Selection, SubView};
use crate::transform::{self, FlipDirection, Rotation, Selector};

// ---------------------------------------------------------------------------
// Image<T>
// ---------------------------------------------------------------------------

/// A 2D array of numeric elements with value semantics.
///
/// Both dimensions are at least 1. Statistics (`max`, `min`, `median`,
/// `mean`, `sample_variance`) are computed lazily, at most once, and may be
/// requested concurrently from any number of threads.
pub struct Image<T: NumericElement> {
    /// Elements in row-major order. Length = height * width.
    data: Vec<T>,
    /// Number of rows.
    height: usize,
    /// Number of columns.
    width: usize,
    stats: StatCache<T>,
}

// Manual Clone rather than derive: the clone is a deep copy of the buffer,
// and it carries over whatever statistics are already cached since they
// describe identical content.
impl<T: NumericElement> Clone for Image<T> {
    fn clone(&self) -> Self {
        Image {
            data: self.data.clone(),
            height: self.height,
            width: self.width,
            stats: self.stats.clone(),
        }
    }
}

/// Validate a shape and return its element count.
fn element_count(height: usize, width: usize) -> Result<usize> {
    if height == 0 || width == 0 {
        return Err(ImageError::InvalidShape(format!(
            "height and width must be at least 1, got {height}×{width}"
        )));
    }
    height
        .checked_mul(width)
        .ok_or_else(|| ImageError::InvalidShape(format!("{height}×{width} overflows usize")))
}

impl<T: NumericElement> Image<T> {
    // --- Constructors ---

    /// Build from a buffer already known to hold `height * width` elements.
    pub(crate) fn from_parts(height: usize, width: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), height * width);
        Image {
            data,
            height,
            width,
            stats: StatCache::new(),
        }
    }

    /// An all-zero image.
    ///
    /// # Errors
    /// `InvalidShape` if either dimension is zero.
    pub fn zeros(height: usize, width: usize) -> Result<Self> {
        let count = element_count(height, width)?;
        Ok(Self::from_parts(height, width, vec![T::zeroed(); count]))
    }

    /// Copy the leading `height * width` elements of `data`.
    ///
    /// # Errors
    /// `InvalidShape` for a zero dimension, `SizeMismatch` if `data` is too
    /// short.
    pub fn from_slice(height: usize, width: usize, data: &[T]) -> Result<Self> {
        let count = element_count(height, width)?;
        if data.len() < count {
            return Err(ImageError::SizeMismatch {
                required: count,
                actual: data.len(),
                unit: "elements",
            });
        }
        trace!("Image<{}>::from_slice {height}×{width}", T::KIND);
        Ok(Self::from_parts(height, width, data[..count].to_vec()))
    }

    /// Take ownership of `data`. Extra trailing elements are dropped.
    ///
    /// # Errors
    /// Same as [`from_slice`](Self::from_slice).
    pub fn from_vec(height: usize, width: usize, mut data: Vec<T>) -> Result<Self> {
        let count = element_count(height, width)?;
        if data.len() < count {
            return Err(ImageError::SizeMismatch {
                required: count,
                actual: data.len(),
                unit: "elements",
            });
        }
        data.truncate(count);
        Ok(Self::from_parts(height, width, data))
    }

    /// Reinterpret native-endian bytes as elements.
    ///
    /// Only the leading `height * width * size_of::<T>()` bytes are read.
    /// `bytes` may have any alignment: it is copied into an aligned buffer
    /// rather than cast in place.
    ///
    /// # Errors
    /// `InvalidShape` for a zero dimension, `SizeMismatch` if `bytes` is too
    /// short.
    pub fn from_bytes(height: usize, width: usize, bytes: &[u8]) -> Result<Self> {
        let count = element_count(height, width)?;
        let required = count
            .checked_mul(T::KIND.size())
            .ok_or_else(|| ImageError::InvalidShape(format!("{height}×{width} overflows usize")))?;
        if bytes.len() < required {
            return Err(ImageError::SizeMismatch {
                required,
                actual: bytes.len(),
                unit: "bytes",
            });
        }
        trace!("Image<{}>::from_bytes {height}×{width} ({required} bytes)", T::KIND);
        let mut data = vec![T::zeroed(); count];
        bytemuck::cast_slice_mut::<T, u8>(&mut data).copy_from_slice(&bytes[..required]);
        Ok(Self::from_parts(height, width, data))
    }

    /// Fill a zeroed buffer through `init`, called exactly once before the
    /// image exists.
    ///
    /// # Errors
    /// `InvalidShape` for a zero dimension; `init` is not called then.
    pub fn with_initializer<F>(height: usize, width: usize, init: F) -> Result<Self>
    where
        F: FnOnce(&mut [T]),
    {
        let count = element_count(height, width)?;
        let mut data = vec![T::zeroed(); count];
        init(&mut data);
        Ok(Self::from_parts(height, width, data))
    }

    /// Like [`with_initializer`](Self::with_initializer) but `init` sees the
    /// zeroed buffer as native-endian bytes.
    pub fn with_raw_initializer<F>(height: usize, width: usize, init: F) -> Result<Self>
    where
        F: FnOnce(&mut [u8]),
    {
        let count = element_count(height, width)?;
        let mut data = vec![T::zeroed(); count];
        init(bytemuck::cast_slice_mut(&mut data));
        Ok(Self::from_parts(height, width, data))
    }

    /// Build from equal-length rows.
    ///
    /// # Errors
    /// `InvalidShape` if there are no rows, the rows are empty, or their
    /// lengths differ.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let count = element_count(height, width)?;

        let mut data = Vec::with_capacity(count);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(ImageError::InvalidShape(format!(
                    "row {i} has {} elements, row 0 has {width}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self::from_parts(height, width, data))
    }

    // --- Accessors ---

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Number of elements, `height * width`.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: both dimensions are at least 1.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        T::KIND
    }

    /// Element at `(row, col)`.
    ///
    /// # Errors
    /// `IndexOutOfRange` if either coordinate is outside the image.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        if row >= self.height || col >= self.width {
            return Err(ImageError::IndexOutOfRange(format!(
                "({row}, {col}) outside {}×{}",
                self.height, self.width
            )));
        }
        Ok(self.data[row * self.width + col])
    }

    /// Element at row-major offset `index`.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `index >= len()`.
    #[inline]
    pub fn get_linear(&self, index: usize) -> Result<T> {
        self.data.get(index).copied().ok_or_else(|| {
            ImageError::IndexOutOfRange(format!("{index} outside {} elements", self.data.len()))
        })
    }

    /// Borrow one row.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `row >= height`.
    pub fn row(&self, row: usize) -> Result<&[T]> {
        if row >= self.height {
            return Err(ImageError::IndexOutOfRange(format!(
                "row {row} outside height {}",
                self.height
            )));
        }
        let start = row * self.width;
        Ok(&self.data[start..start + self.width])
    }

    /// Iterate elements in row-major order.
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, T>> {
        self.data.iter().copied()
    }

    /// Iterate all cells as `(row, col, value)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(k, &v)| (k / width, k % width, v))
    }

    /// Typed view of the backing buffer. No copy.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Native-endian byte view of the backing buffer. No copy.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Copy the elements out.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }

    // --- Geometry ---

    fn remap(&self, selector: Selector) -> Self {
        let (height, width) = selector.output_shape(self.height, self.width);
        let mut out = vec![T::zeroed(); self.data.len()];
        transform::apply(&self.data, &mut out, self.height, self.width, selector);
        Self::from_parts(height, width, out)
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Self {
        self.remap(Selector::Transpose)
    }

    /// Rotate counter-clockwise by a quarter-turn multiple. 90 and 270
    /// swap height and width.
    pub fn rotate(&self, rotation: Rotation) -> Self {
        self.remap(rotation.into())
    }

    /// Mirror along one axis. The shape is unchanged.
    pub fn flip(&self, direction: FlipDirection) -> Self {
        self.remap(direction.into())
    }

    // --- Element-wise ---

    fn map<U: NumericElement>(&self, f: impl FnMut(T) -> U) -> Image<U> {
        Image::from_parts(self.height, self.width, self.data.iter().copied().map(f).collect())
    }

    fn zip_with(&self, other: &Self, f: impl Fn(T, T) -> T) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(ImageError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self::from_parts(self.height, self.width, data))
    }

    /// Native `as` conversion of every element.
    /// See [`NumericElement`] for the per-pair semantics.
    pub fn cast_to<U: NumericElement>(&self) -> Image<U> {
        self.map(|v| v.cast::<U>())
    }

    /// Element-wise conversion through a caller-supplied function.
    pub fn cast_with<U, F>(&self, caster: F) -> Image<U>
    where
        U: NumericElement,
        F: FnMut(T) -> U,
    {
        self.map(caster)
    }

    /// Saturate every element into `[low, high]`. NaN elements stay NaN.
    ///
    /// # Errors
    /// `InvalidRange` unless `low <= high` (which also rejects NaN bounds).
    pub fn clamp(&self, low: T, high: T) -> Result<Self> {
        if !(low <= high) {
            return Err(ImageError::InvalidRange {
                low: format!("{low}"),
                high: format!("{high}"),
            });
        }
        Ok(self.map(|v| {
            if v < low {
                low
            } else if v > high {
                high
            } else {
                v
            }
        }))
    }

    /// Linearly map the value range `[min, max]` onto `[low, high]`.
    ///
    /// Computed as `low + (x - min) * (high - low) / (max - min)` in f64 and
    /// cast back, so integer kinds cannot overflow in the intermediate
    /// product. Elements equal to `min` or `max` map exactly to
    /// `low` or `high`. A constant image (max == min) becomes `(low + high) / 2`
    /// everywhere.
    pub fn scale(&self, low: T, high: T) -> Self {
        let min = Statistics::min(self);
        let max = Statistics::max(self);
        if max == min {
            let fill = T::from_f64((low.to_f64() + high.to_f64()) / 2.0);
            return Self::from_parts(self.height, self.width, vec![fill; self.data.len()]);
        }

        let base = min.to_f64();
        let range = max.to_f64() - base;
        let offset = low.to_f64();
        let span = high.to_f64() - offset;
        // The endpoints are pinned: for 64-bit integers `range * span` can
        // round, and the truncating cast would land one short of `high`.
        self.map(|v| {
            if v == max {
                high
            } else if v == min {
                low
            } else {
                T::from_f64((v.to_f64() - base) * span / range + offset)
            }
        })
    }

    /// Add `item` to every element (wrapping for integers).
    pub fn add_scalar(&self, item: T) -> Self {
        self.map(|v| v.add(item))
    }

    /// Multiply every element by `item` (wrapping for integers).
    pub fn multiply_by(&self, item: T) -> Self {
        self.map(|v| v.mul(item))
    }

    /// Divide every element by `item`.
    ///
    /// # Panics
    /// For integer kinds when `item` is zero, like the `/` operator.
    pub fn divide_by(&self, item: T) -> Self {
        self.map(|v| v.div(item))
    }

    /// Element-wise sum.
    ///
    /// # Errors
    /// `ShapeMismatch` if the shapes differ.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, NumericElement::add)
    }

    /// Element-wise difference `self - other`.
    ///
    /// # Errors
    /// `ShapeMismatch` if the shapes differ.
    pub fn subtract(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, NumericElement::sub)
    }

    // --- Slicing ---

    /// View over an explicit coordinate list, in the given order.
    /// Duplicates are kept and counted.
    ///
    /// # Errors
    /// `EmptySelection` for an empty list, `IndexOutOfRange` for any
    /// coordinate outside the image.
    pub fn slice<I>(&self, coords: I) -> Result<SubView<'_, T>>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        SubView::new(self, coords.into_iter().collect())
    }

    /// Select the elements whose value satisfies `selector`.
    ///
    /// Returns [`Selection::Whole`] without building a coordinate list when
    /// every element matches.
    ///
    /// # Errors
    /// `EmptySelection` when nothing matches.
    pub fn slice_where<F>(&self, mut selector: F) -> Result<Selection<'_, T>>
    where
        F: FnMut(T) -> bool,
    {
        self.slice_where_at(|_, _, v| selector(v))
    }

    /// Select by `(row, col, value)`.
    ///
    /// # Errors
    /// `EmptySelection` when nothing matches.
    pub fn slice_where_at<F>(&self, mut selector: F) -> Result<Selection<'_, T>>
    where
        F: FnMut(usize, usize, T) -> bool,
    {
        let indices: Vec<(usize, usize)> = self
            .cells()
            .filter(|&(row, col, v)| selector(row, col, v))
            .map(|(row, col, _)| (row, col))
            .collect();
        Selection::from_unique(self, indices)
    }

    /// Select the rectangle `rows × cols`.
    ///
    /// # Errors
    /// `IndexOutOfRange` if a range ends past the image, `EmptySelection` if
    /// either range is empty.
    pub fn slice_rect(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Selection<'_, T>> {
        if rows.end > self.height || cols.end > self.width {
            return Err(ImageError::IndexOutOfRange(format!(
                "rows {rows:?} × cols {cols:?} outside {}×{}",
                self.height, self.width
            )));
        }
        let indices: Vec<(usize, usize)> = rows
            .flat_map(|row| cols.clone().map(move |col| (row, col)))
            .collect();
        Selection::from_unique(self, indices)
    }

    // --- Equality & hashing ---

    /// Shape plus raw byte comparison. Unlike `==` this tells `-0.0` from
    /// `0.0` and considers identical NaN payloads equal.
    pub fn bitwise_eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.as_bytes() == other.as_bytes()
    }

    /// CRC-32 based hash of content, kind and shape.
    pub fn content_hash(&self) -> u32 {
        hash::content_hash(&self.data, self.height, self.width)
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

impl<T: NumericElement> Samples<T> for Image<T> {
    fn count(&self) -> usize {
        self.data.len()
    }

    fn samples(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().copied()
    }

    fn cache(&self) -> &StatCache<T> {
        &self.stats
    }
}

impl<T: NumericElement> Statistics for Image<T> {
    type Elem = T;

    fn len(&self) -> usize {
        self.data.len()
    }

    fn max(&self) -> T {
        stats::max(self)
    }

    fn min(&self) -> T {
        stats::min(self)
    }

    fn percentile(&self, level: T) -> Result<T> {
        stats::percentile(self, level)
    }

    fn median(&self) -> T {
        stats::median(self)
    }

    fn mean(&self) -> f64 {
        stats::mean(self)
    }

    fn sample_variance(&self) -> f64 {
        stats::sample_variance(self)
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

/// Numeric equality: same shape and `a == b` for every element pair. For
/// floats this is IEEE comparison, so an image holding NaN is not equal to
/// itself. Use [`Image::bitwise_eq`] for representation equality.
impl<T: NumericElement> PartialEq for Image<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.data.iter().zip(&other.data).all(|(a, b)| a == b)
    }
}

impl<T: NumericElement> Hash for Image<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.content_hash());
    }
}

impl<T: NumericElement> std::ops::Index<(usize, usize)> for Image<T> {
    type Output = T;

    /// # Panics
    /// If `(row, col)` is out of bounds. Use [`Image::get`] for a `Result`.
    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.height && col < self.width,
            "cell ({row},{col}) out of bounds for image {}×{}",
            self.height,
            self.width,
        );
        &self.data[row * self.width + col]
    }
}

impl<'a, T: NumericElement> IntoIterator for &'a Image<T> {
    type Item = T;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Debug formatting -- shape plus the top-left corner, enough for test output.
impl<T: NumericElement> fmt::Debug for Image<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Image<{}> {{ {}×{} }}", T::KIND, self.height, self.width)?;
        for row in 0..self.height.min(8) {
            write!(f, "  row {row}: [")?;
            for col in 0..self.width.min(16) {
                if col > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", self.data[row * self.width + col])?;
            }
            if self.width > 16 {
                write!(f, ", ...")?;
            }
            writeln!(f, "]")?;
        }
        if self.height > 8 {
            writeln!(f, "  ...")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Image<i32> {
        // 2×3:
        //   1 2 3
        //   4 5 6
        Image::from_slice(2, 3, &[1, 2, 3, 4, 5, 6]).unwrap()
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(Image::<u8>::zeros(0, 4), Err(ImageError::InvalidShape(_))));
        assert!(matches!(Image::<u8>::zeros(4, 0), Err(ImageError::InvalidShape(_))));
    }

    #[test]
    fn short_data_is_rejected() {
        let err = Image::<u16>::from_slice(2, 2, &[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            ImageError::SizeMismatch {
                required: 4,
                actual: 3,
                unit: "elements"
            }
        );
        let err = Image::<u16>::from_bytes(2, 2, &[0u8; 7]).unwrap_err();
        assert!(matches!(err, ImageError::SizeMismatch { required: 8, actual: 7, .. }));
    }

    #[test]
    fn longer_data_keeps_prefix() {
        let img = Image::from_slice(1, 2, &[7u8, 8, 9]).unwrap();
        assert_eq!(img.as_slice(), &[7, 8]);
        let img = Image::from_vec(1, 2, vec![7u8, 8, 9]).unwrap();
        assert_eq!(img.as_slice(), &[7, 8]);
    }

    #[test]
    fn from_bytes_accepts_unaligned_input() {
        let values = [1.5f64, -2.25];
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(bytemuck::cast_slice(&values));
        let img = Image::<f64>::from_bytes(1, 2, &bytes[1..]).unwrap();
        assert_eq!(img.as_slice(), &values);
    }

    #[test]
    fn initializer_runs_once_on_zeroed_buffer() {
        let mut calls = 0;
        let img = Image::<i64>::with_initializer(2, 2, |buf| {
            calls += 1;
            assert!(buf.iter().all(|&v| v == 0));
            buf[3] = 9;
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(img.as_slice(), &[0, 0, 0, 9]);
    }

    #[test]
    fn initializer_not_called_for_bad_shape() {
        let mut called = false;
        let result = Image::<u8>::with_initializer(0, 3, |_| called = true);
        assert!(result.is_err());
        assert!(!called);
    }

    #[test]
    fn raw_initializer_sees_bytes() {
        let img = Image::<u16>::with_raw_initializer(1, 2, |bytes| {
            assert_eq!(bytes.len(), 4);
            bytes[..2].copy_from_slice(&0x0102u16.to_ne_bytes());
        })
        .unwrap();
        assert_eq!(img.as_slice(), &[0x0102, 0]);
    }

    #[test]
    fn from_rows_checks_lengths() {
        let img = Image::from_rows(&[[1u8, 2], [3, 4]]).unwrap();
        assert_eq!(img.shape(), (2, 2));
        assert_eq!(img.get(1, 0).unwrap(), 3);

        let ragged: [&[u8]; 2] = [&[1, 2], &[3]];
        assert!(matches!(Image::from_rows(&ragged), Err(ImageError::InvalidShape(_))));
        let none: [&[u8]; 0] = [];
        assert!(matches!(Image::from_rows(&none), Err(ImageError::InvalidShape(_))));
    }

    #[test]
    fn indexing_is_row_major() {
        let img = grid();
        assert_eq!(img.get(0, 2).unwrap(), 3);
        assert_eq!(img.get(1, 0).unwrap(), 4);
        assert_eq!(img.get_linear(4).unwrap(), 5);
        assert_eq!(img[(1, 2)], 6);
        assert_eq!(img.row(1).unwrap(), &[4, 5, 6]);
        assert!(matches!(img.get(2, 0), Err(ImageError::IndexOutOfRange(_))));
        assert!(matches!(img.get(0, 3), Err(ImageError::IndexOutOfRange(_))));
        assert!(matches!(img.get_linear(6), Err(ImageError::IndexOutOfRange(_))));
        assert!(img.row(2).is_err());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn index_operator_panics_out_of_bounds() {
        let img = grid();
        let _ = img[(0, 3)];
    }

    #[test]
    fn cells_report_coordinates() {
        let img = grid();
        let cells: Vec<_> = img.cells().collect();
        assert_eq!(cells[0], (0, 0, 1));
        assert_eq!(cells[3], (1, 0, 4));
        assert_eq!(cells[5], (1, 2, 6));
    }

    #[test]
    fn statistics() {
        let img = grid();
        assert_eq!(img.max(), 6);
        assert_eq!(img.min(), 1);
        assert_eq!(img.median(), 3); // rank ceil(3.0) = 3
        assert_eq!(img.average(), 3); // 3.5 truncated
        assert!((img.mean() - 3.5).abs() < 1e-12);
        // Deviations are taken from the truncated average 3: (4+1+0+1+4+9)/5.
        assert!((img.sample_variance() - 3.8).abs() < 1e-12);
        assert_eq!(img.variance(), 3);
    }

    #[test]
    fn transforms_change_shape() {
        let img = grid();
        let t = img.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.as_slice(), &[1, 4, 2, 5, 3, 6]);

        let r = img.rotate(Rotation::Deg90);
        assert_eq!(r.shape(), (3, 2));
        assert_eq!(r.as_slice(), &[3, 6, 2, 5, 1, 4]);

        let r = img.rotate(Rotation::Deg180);
        assert_eq!(r.shape(), (2, 3));
        assert_eq!(r.as_slice(), &[6, 5, 4, 3, 2, 1]);

        let f = img.flip(FlipDirection::Vertical);
        assert_eq!(f.as_slice(), &[4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn clamp_validates_bounds() {
        let img = grid();
        let c = img.clamp(2, 5).unwrap();
        assert_eq!(c.as_slice(), &[2, 2, 3, 4, 5, 5]);
        assert!(matches!(img.clamp(5, 2), Err(ImageError::InvalidRange { .. })));

        let f = Image::from_slice(1, 2, &[0.5f32, 3.0]).unwrap();
        assert!(f.clamp(f32::NAN, 1.0).is_err());
    }

    #[test]
    fn scale_maps_range() {
        let img = grid();
        let s = img.scale(0, 100);
        assert_eq!(s.as_slice(), &[0, 20, 40, 60, 80, 100]);
    }

    #[test]
    fn scale_pins_endpoints_for_wide_integers() {
        let img = Image::from_slice(1, 3, &[0i64, 1_000_000_007, 3_178_589_831_600_331_300]).unwrap();
        let s = img.scale(0, 1000);
        assert_eq!(s.get(0, 0).unwrap(), 0);
        assert_eq!(s.get(0, 2).unwrap(), 1000);
        assert_eq!(s.get(0, 1).unwrap(), 0);
    }

    #[test]
    fn scale_of_constant_image_fills_midpoint() {
        let img = Image::from_slice(2, 2, &[7u8; 4]).unwrap();
        let s = img.scale(10, 21);
        assert_eq!(s.as_slice(), &[15, 15, 15, 15]);
    }

    #[test]
    fn scalar_arithmetic() {
        let img = grid();
        assert_eq!(img.add_scalar(10).as_slice(), &[11, 12, 13, 14, 15, 16]);
        assert_eq!(img.multiply_by(-1).as_slice(), &[-1, -2, -3, -4, -5, -6]);
        assert_eq!(img.divide_by(2).as_slice(), &[0, 1, 1, 2, 2, 3]);
    }

    #[test]
    fn shape_mismatch_on_binary_ops() {
        let a = grid();
        let b = a.transpose();
        assert!(matches!(a.add(&b), Err(ImageError::ShapeMismatch { .. })));
        // Only one dimension differs.
        let c = Image::<i32>::zeros(2, 4).unwrap();
        assert!(matches!(a.subtract(&c), Err(ImageError::ShapeMismatch { .. })));
    }

    #[test]
    fn cast_preserves_shape() {
        let img = Image::from_slice(1, 3, &[-1.7f32, 0.2, 300.0]).unwrap();
        let c: Image<u8> = img.cast_to();
        assert_eq!(c.shape(), (1, 3));
        assert_eq!(c.as_slice(), &[0, 0, 255]);

        let doubled: Image<i64> = img.cast_with(|v| (v * 2.0).round() as i64);
        assert_eq!(doubled.as_slice(), &[-3, 0, 600]);
    }

    #[test]
    fn value_and_bitwise_equality_differ_on_signed_zero() {
        let a = Image::from_slice(1, 1, &[0.0f64]).unwrap();
        let b = Image::from_slice(1, 1, &[-0.0f64]).unwrap();
        assert_eq!(a, b);
        assert!(!a.bitwise_eq(&b));
    }

    #[test]
    fn nan_is_bitwise_but_not_numerically_equal() {
        let a = Image::from_slice(1, 2, &[f32::NAN, 1.0]).unwrap();
        let b = a.clone();
        assert_ne!(a, b);
        assert!(a.bitwise_eq(&b));
    }

    #[test]
    fn debug_prints_shape() {
        let s = format!("{:?}", grid());
        assert!(s.starts_with("Image<i32> { 2×3 }"));
        assert!(s.contains("row 1: [4, 5, 6]"));
    }
}
