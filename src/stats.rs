// stats.rs -- Cached reductions shared by Image and SubView.
//
// Both containers expose the same statistics contract (`Statistics`) and
// compute it with the same kernels. The only thing that differs is where the
// samples come from: an Image walks its buffer, a SubView walks its
// coordinate list. That difference is captured by the crate-private
// `Samples` trait; everything else lives here once.
//
// CACHING:
// Each statistic gets its own `OnceLock`. `get_or_init` gives exactly the
// double-checked pattern we want:
//   - already set   → lock-free read
//   - not yet set   → one caller runs the closure, concurrent callers block
//                     until it finishes, then all see the same value
// One lock per field (not one per container) means a slow median never
// stalls a caller that only wants `max()`.
//
// Percentiles other than the median are not cached: there is one cell per
// field, and an arbitrary level has no field to live in.
//
// NEW RUST CONCEPTS:
// - `std::sync::OnceLock<T>` -- write-once cell that is `Sync` whenever `T`
//   is `Send + Sync`.
// - Return-position `impl Trait` in a trait method (`fn samples(&self) ->
//   impl Iterator<...>`), so each container yields its own iterator type
//   without boxing.

use std::sync::OnceLock;

use log::debug;

use crate::element::NumericElement;
use crate::error::{ImageError, Result};

/// Read-only statistics over a non-empty collection of elements.
///
/// Implemented by [`Image`](crate::Image), [`SubView`](crate::SubView) and
/// [`Selection`](crate::Selection). `max`, `min`, `median`, `mean` and
/// `sample_variance` are computed at most once per instance.
pub trait Statistics {
    type Elem: NumericElement;

    /// Number of elements the statistics range over (always ≥ 1).
    fn len(&self) -> usize;

    /// Largest element. A linear scan seeded by the first element, keeping
    /// the later of equal values (`>=`).
    fn max(&self) -> Self::Elem;

    /// Smallest element, seeded by the first element (`<=`).
    fn min(&self) -> Self::Elem;

    /// Nearest-rank percentile.
    ///
    /// `level == 0` returns [`min`](Self::min), `level == 100` returns
    /// [`max`](Self::max). Otherwise `rank = ceil(level * len / 100)`,
    /// clamped to `[1, len]`, and the result is the `rank`-th smallest
    /// element. No interpolation.
    ///
    /// # Errors
    /// `OutOfRange` if `level` is below 0, above 100, or NaN.
    fn percentile(&self, level: Self::Elem) -> Result<Self::Elem>;

    /// `percentile(50)`, cached.
    fn median(&self) -> Self::Elem;

    /// Arithmetic mean accumulated in f64, cached.
    fn mean(&self) -> f64;

    /// Mean cast back to the element type (truncating for integers).
    fn average(&self) -> Self::Elem {
        Self::Elem::from_f64(self.mean())
    }

    /// Sample variance `Σ(x - avg)² / (len - 1)` in f64, cached, where
    /// `avg` is [`average`](Self::average) (the mean in the element type).
    /// Zero for a single element.
    fn sample_variance(&self) -> f64;

    /// Sample variance cast back to the element type.
    fn variance(&self) -> Self::Elem {
        Self::Elem::from_f64(self.sample_variance())
    }
}

// ---------------------------------------------------------------------------
// Memo cells
// ---------------------------------------------------------------------------

/// One write-once cell per cached statistic.
#[derive(Debug, Clone)]
pub(crate) struct StatCache<T> {
    max: OnceLock<T>,
    min: OnceLock<T>,
    median: OnceLock<T>,
    mean: OnceLock<f64>,
    variance: OnceLock<f64>,
}

impl<T> StatCache<T> {
    pub(crate) fn new() -> Self {
        StatCache {
            max: OnceLock::new(),
            min: OnceLock::new(),
            median: OnceLock::new(),
            mean: OnceLock::new(),
            variance: OnceLock::new(),
        }
    }
}

impl<T> Default for StatCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a container's samples come from.
pub(crate) trait Samples<T: NumericElement> {
    /// Number of samples; never zero.
    fn count(&self) -> usize;
    /// Samples in container order.
    fn samples(&self) -> impl Iterator<Item = T> + '_;
    fn cache(&self) -> &StatCache<T>;
}

fn memo<T: NumericElement, V: Copy>(
    cell: &OnceLock<V>,
    field: &'static str,
    count: usize,
    compute: impl FnOnce() -> V,
) -> V {
    *cell.get_or_init(|| {
        debug!("computing {field} over {count} {} elements", T::KIND);
        compute()
    })
}

// ---------------------------------------------------------------------------
// Kernels
// ---------------------------------------------------------------------------

/// Linear scan keeping `candidate` whenever `keep(candidate, best)` holds.
/// Seeded by the first sample, not by zero, so all-negative or all-positive
/// data is handled correctly.
fn extreme<T: NumericElement>(mut values: impl Iterator<Item = T>, keep: fn(&T, &T) -> bool) -> T {
    // Containers are never empty; the fallback only exists to stay total.
    let Some(seed) = values.next() else {
        return T::default();
    };
    values.fold(seed, |best, v| if keep(&v, &best) { v } else { best })
}

pub(crate) fn max<T: NumericElement, S: Samples<T>>(src: &S) -> T {
    memo::<T, _>(&src.cache().max, "max", src.count(), || {
        extreme(src.samples(), |v, best| v >= best)
    })
}

pub(crate) fn min<T: NumericElement, S: Samples<T>>(src: &S) -> T {
    memo::<T, _>(&src.cache().min, "min", src.count(), || {
        extreme(src.samples(), |v, best| v <= best)
    })
}

pub(crate) fn mean<T: NumericElement, S: Samples<T>>(src: &S) -> f64 {
    let count = src.count();
    memo::<T, _>(&src.cache().mean, "mean", count, || {
        let sum = src.samples().fold(0.0f64, |acc, v| acc + v.to_f64());
        sum / count as f64
    })
}

pub(crate) fn sample_variance<T: NumericElement, S: Samples<T>>(src: &S) -> f64 {
    let count = src.count();
    memo::<T, _>(&src.cache().variance, "variance", count, || {
        if count <= 1 {
            return 0.0;
        }
        // Deviations are measured from the average in T (truncated for
        // integers), subtracted in f64 so unsigned kinds cannot wrap.
        let avg = T::from_f64(mean(src)).to_f64();
        let sum = src.samples().fold(0.0f64, |acc, v| {
            let diff = v.to_f64() - avg;
            acc + diff * diff
        });
        sum / (count - 1) as f64
    })
}

/// Reject levels outside `[0, 100]`. The negated comparison also rejects NaN.
pub(crate) fn check_level<T: NumericElement>(level: T) -> Result<()> {
    if !(level >= T::from_i32(0) && level <= T::from_i32(100)) {
        return Err(ImageError::OutOfRange(format!("{level}")));
    }
    Ok(())
}

/// 0-based index of the nearest-rank element for a valid `level` strictly
/// between 0 and 100.
///
/// `ceil(level * count / 100)` is evaluated in f64: multiplying in `T` would
/// overflow small integer kinds (a `u8` level times any realistic count).
pub(crate) fn rank_index<T: NumericElement>(level: T, count: usize) -> usize {
    let rank = (level.to_f64() * count as f64 / 100.0).ceil() as usize;
    rank.clamp(1, count) - 1
}

/// `index`-th smallest element under `NumericElement::compare`.
///
/// `select_nth_unstable_by` places exactly the element a full ascending sort
/// would put at `index`, in linear time.
pub(crate) fn nth_smallest<T: NumericElement>(mut values: Vec<T>, index: usize) -> T {
    let (_, nth, _) = values.select_nth_unstable_by(index, |a, b| a.compare(*b));
    *nth
}

fn select<T: NumericElement, S: Samples<T>>(src: &S, level: T) -> T {
    if level == T::from_i32(0) {
        return min(src);
    }
    if level == T::from_i32(100) {
        return max(src);
    }
    let index = rank_index(level, src.count());
    nth_smallest(src.samples().collect(), index)
}

pub(crate) fn percentile<T: NumericElement, S: Samples<T>>(src: &S, level: T) -> Result<T> {
    check_level(level)?;
    Ok(select(src, level))
}

pub(crate) fn median<T: NumericElement, S: Samples<T>>(src: &S) -> T {
    memo::<T, _>(&src.cache().median, "median", src.count(), || {
        select(src, T::from_i32(50))
    })
}
