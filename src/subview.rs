// subview.rs -- Masked, read-only views over an Image.
//
// A SubView is a borrowed image plus an ordered list of (row, col)
// coordinates. It never copies the buffer: every read goes through to the
// source. The borrow ties the view's lifetime to the image, so a view can
// never outlive the data it points into.
//
// Statistics over a view use the same kernels as the image itself
// (see stats.rs) and range over the selected coordinates only.
//
// `Selection` is what predicate slicing returns. When every element of the
// image matches there is no point building a coordinate list of the full
// image: the result is `Selection::Whole`, which hands out the image's own
// statistics (and their caches).

use crate::element::NumericElement;
use crate::error::{ImageError, Result};
use crate::image::Image;
use crate::stats::{self, Samples, StatCache, Statistics};

/// A non-empty, ordered selection of cells in an [`Image`].
///
/// Coordinates may repeat; a repeated cell counts once per occurrence.
#[derive(Clone)]
pub struct SubView<'a, T: NumericElement> {
    source: &'a Image<T>,
    indices: Vec<(usize, usize)>,
    stats: StatCache<T>,
}

impl<'a, T: NumericElement> SubView<'a, T> {
    /// # Errors
    /// `EmptySelection` when `indices` is empty, `IndexOutOfRange` when any
    /// coordinate lies outside `source`.
    pub(crate) fn new(source: &'a Image<T>, indices: Vec<(usize, usize)>) -> Result<Self> {
        if indices.is_empty() {
            return Err(ImageError::EmptySelection);
        }
        let (height, width) = source.shape();
        if let Some(&(row, col)) = indices.iter().find(|&&(r, c)| r >= height || c >= width) {
            return Err(ImageError::IndexOutOfRange(format!(
                "({row}, {col}) outside {height}×{width}"
            )));
        }
        Ok(Self::new_unchecked(source, indices))
    }

    /// Callers guarantee `indices` is non-empty and in bounds.
    fn new_unchecked(source: &'a Image<T>, indices: Vec<(usize, usize)>) -> Self {
        debug_assert!(!indices.is_empty());
        SubView {
            source,
            indices,
            stats: StatCache::new(),
        }
    }

    /// The `k`-th selected element.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `k >= len()`.
    pub fn get(&self, k: usize) -> Result<T> {
        let &(row, col) = self.indices.get(k).ok_or_else(|| {
            ImageError::IndexOutOfRange(format!("{k} outside {} selected cells", self.indices.len()))
        })?;
        self.source.get(row, col)
    }

    pub fn indices(&self) -> &[(usize, usize)] {
        &self.indices
    }

    pub fn source(&self) -> &'a Image<T> {
        self.source
    }

    /// Selected elements in selection order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.indices.iter().map(|&(row, col)| self.source[(row, col)])
    }
}

impl<T: NumericElement> std::fmt::Debug for SubView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubView")
            .field("kind", &T::KIND)
            .field("source_shape", &self.source.shape())
            .field("len", &self.indices.len())
            .finish()
    }
}

impl<T: NumericElement> Samples<T> for SubView<'_, T> {
    fn count(&self) -> usize {
        self.indices.len()
    }

    fn samples(&self) -> impl Iterator<Item = T> + '_ {
        self.iter()
    }

    fn cache(&self) -> &StatCache<T> {
        &self.stats
    }
}

impl<T: NumericElement> Statistics for SubView<'_, T> {
    type Elem = T;

    fn len(&self) -> usize {
        self.indices.len()
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
// Selection
// ---------------------------------------------------------------------------

/// Result of predicate or rectangle slicing.
#[derive(Debug, Clone)]
pub enum Selection<'a, T: NumericElement> {
    /// Every element matched.
    Whole(&'a Image<T>),
    /// A strict subset matched.
    Masked(SubView<'a, T>),
}

impl<'a, T: NumericElement> Selection<'a, T> {
    /// `indices` holds distinct in-bounds coordinates, so covering the whole
    /// image is a plain length comparison.
    pub(crate) fn from_unique(source: &'a Image<T>, indices: Vec<(usize, usize)>) -> Result<Self> {
        if indices.is_empty() {
            return Err(ImageError::EmptySelection);
        }
        if indices.len() == Statistics::len(source) {
            return Ok(Selection::Whole(source));
        }
        Ok(Selection::Masked(SubView::new_unchecked(source, indices)))
    }

    pub fn is_whole(&self) -> bool {
        matches!(self, Selection::Whole(_))
    }

    pub fn source(&self) -> &'a Image<T> {
        match self {
            Selection::Whole(image) => image,
            Selection::Masked(view) => view.source(),
        }
    }

    /// Selected elements in row-major order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = T> + '_> {
        match self {
            Selection::Whole(image) => Box::new(image.iter()),
            Selection::Masked(view) => Box::new(view.iter()),
        }
    }
}

macro_rules! delegate {
    ($self:ident, $s:ident => $body:expr) => {
        match $self {
            Selection::Whole($s) => $body,
            Selection::Masked($s) => $body,
        }
    };
}

impl<T: NumericElement> Statistics for Selection<'_, T> {
    type Elem = T;

    fn len(&self) -> usize {
        delegate!(self, s => s.len())
    }

    fn max(&self) -> T {
        delegate!(self, s => s.max())
    }

    fn min(&self) -> T {
        delegate!(self, s => s.min())
    }

    fn percentile(&self, level: T) -> Result<T> {
        delegate!(self, s => s.percentile(level))
    }

    fn median(&self) -> T {
        delegate!(self, s => s.median())
    }

    fn mean(&self) -> f64 {
        delegate!(self, s => s.mean())
    }

    fn sample_variance(&self) -> f64 {
        delegate!(self, s => s.sample_variance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Image<i16> {
        // 3×3:
        //   0 1 2
        //   3 4 5
        //   6 7 8
        Image::from_slice(3, 3, &[0, 1, 2, 3, 4, 5, 6, 7, 8]).unwrap()
    }

    #[test]
    fn view_reads_through_to_source() {
        let img = ramp();
        let view = img.slice([(2, 2), (0, 1), (1, 0)]).unwrap();
        assert_eq!(view.len(), 3);
        assert_eq!(view.get(0).unwrap(), 8);
        assert_eq!(view.get(2).unwrap(), 3);
        assert!(matches!(view.get(3), Err(ImageError::IndexOutOfRange(_))));
        assert_eq!(view.iter().collect::<Vec<_>>(), vec![8, 1, 3]);
        assert!(std::ptr::eq(view.source(), &img));
    }

    #[test]
    fn empty_and_out_of_bounds_are_rejected() {
        let img = ramp();
        let none: [(usize, usize); 0] = [];
        assert_eq!(img.slice(none).unwrap_err(), ImageError::EmptySelection);
        assert!(matches!(img.slice([(0, 0), (3, 0)]), Err(ImageError::IndexOutOfRange(_))));
    }

    #[test]
    fn duplicates_count_twice() {
        let img = ramp();
        let view = img.slice([(0, 0), (0, 0), (2, 2)]).unwrap();
        // [0, 0, 8]
        assert_eq!(view.median(), 0);
        assert!((view.mean() - 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn view_statistics_cover_only_selection() {
        let img = ramp();
        let view = img.slice([(0, 2), (1, 1), (2, 0)]).unwrap();
        assert_eq!(view.max(), 6);
        assert_eq!(view.min(), 2);
        assert_eq!(view.median(), 4);
        assert_eq!(view.percentile(0).unwrap(), 2);
        assert_eq!(view.percentile(100).unwrap(), 6);
        assert_eq!(view.average(), 4);
        assert!((view.sample_variance() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn view_variance_uses_truncated_average() {
        let img = ramp();
        // [1, 2]: average 1, deviations 0 and 1
        let view = img.slice([(0, 1), (0, 2)]).unwrap();
        assert_eq!(view.average(), 1);
        assert_eq!(view.sample_variance(), 1.0);
        assert_eq!(view.variance(), 1);
    }

    #[test]
    fn full_predicate_returns_whole() {
        let img = ramp();
        let all = img.slice_where(|v| v >= 0).unwrap();
        assert!(all.is_whole());
        assert_eq!(all.len(), 9);
        assert_eq!(all.max(), img.max());
    }

    #[test]
    fn partial_predicate_returns_masked() {
        let img = ramp();
        let odd = img.slice_where(|v| v % 2 == 1).unwrap();
        assert!(!odd.is_whole());
        assert_eq!(odd.iter().collect::<Vec<_>>(), vec![1, 3, 5, 7]);
        assert_eq!(odd.min(), 1);
        assert_eq!(odd.max(), 7);
    }

    #[test]
    fn predicate_matching_nothing_is_an_error() {
        let img = ramp();
        assert_eq!(img.slice_where(|v| v > 100).unwrap_err(), ImageError::EmptySelection);
    }

    #[test]
    fn positional_predicate() {
        let img = ramp();
        let diagonal = img.slice_where_at(|r, c, _| r == c).unwrap();
        assert_eq!(diagonal.iter().collect::<Vec<_>>(), vec![0, 4, 8]);
    }

    #[test]
    fn rectangle() {
        let img = ramp();
        let rect = img.slice_rect(1..3, 0..2).unwrap();
        assert_eq!(rect.iter().collect::<Vec<_>>(), vec![3, 4, 6, 7]);
        assert!(img.slice_rect(0..3, 0..3).unwrap().is_whole());
        assert!(matches!(img.slice_rect(0..4, 0..1), Err(ImageError::IndexOutOfRange(_))));
        assert_eq!(img.slice_rect(1..1, 0..3).unwrap_err(), ImageError::EmptySelection);
    }
}
