// element.rs -- The closed set of numeric element kinds an Image can hold.
//
// Ten primitive kinds are supported: 8/16/32/64-bit signed and unsigned
// integers plus f32 and f64. The set is closed with a sealed trait, so an
// `Image<bool>` or `Image<char>` is rejected at compile time rather than at
// construction time. `ElementKind` is the runtime tag of the same set; it is
// what persisted records carry and what the content hasher mixes in.
//
// NEW RUST CONCEPTS:
// - Sealed traits: `NumericElement` has a supertrait that lives in a private
//   module, so downstream crates can name the trait but never implement it.
// - Supertraits over concrete types: `AsPrimitive<u8> + ... + AsPrimitive<f64>`
//   lets generic code perform an `as` cast from any `S: NumericElement` into
//   any concrete kind without a runtime match.
// - `macro_rules!` to stamp out one impl per primitive instead of ten
//   hand-written copies.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_traits::AsPrimitive;

use crate::error::ImageError;

mod private {
    pub trait Sealed {}
}

// ---------------------------------------------------------------------------
// ElementKind
// ---------------------------------------------------------------------------

/// Runtime tag for each supported element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ElementKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [ElementKind; 10] = [
        ElementKind::U8,
        ElementKind::U16,
        ElementKind::U32,
        ElementKind::U64,
        ElementKind::I8,
        ElementKind::I16,
        ElementKind::I32,
        ElementKind::I64,
        ElementKind::F32,
        ElementKind::F64,
    ];

    /// The kind id string written into persisted records.
    pub const fn name(self) -> &'static str {
        match self {
            ElementKind::U8 => "u8",
            ElementKind::U16 => "u16",
            ElementKind::U32 => "u32",
            ElementKind::U64 => "u64",
            ElementKind::I8 => "i8",
            ElementKind::I16 => "i16",
            ElementKind::I32 => "i32",
            ElementKind::I64 => "i64",
            ElementKind::F32 => "f32",
            ElementKind::F64 => "f64",
        }
    }

    /// Size of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            ElementKind::U8 | ElementKind::I8 => 1,
            ElementKind::U16 | ElementKind::I16 => 2,
            ElementKind::U32 | ElementKind::I32 | ElementKind::F32 => 4,
            ElementKind::U64 | ElementKind::I64 | ElementKind::F64 => 8,
        }
    }

    /// Stable numeric id mixed into content hashes. Never reorder these:
    /// changing a value changes every hash of that kind.
    pub const fn type_id(self) -> u32 {
        match self {
            ElementKind::U8 => 1,
            ElementKind::U16 => 2,
            ElementKind::U32 => 3,
            ElementKind::U64 => 4,
            ElementKind::I8 => 5,
            ElementKind::I16 => 6,
            ElementKind::I32 => 7,
            ElementKind::I64 => 8,
            ElementKind::F32 => 9,
            ElementKind::F64 => 10,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, ElementKind::F32 | ElementKind::F64)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementKind {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ImageError::TypeNotSupported(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// NumericElement Trait
// ---------------------------------------------------------------------------
// Trait bounds explained:
//   Pod       -- plain bytes with no padding, so a &[T] can be viewed as &[u8]
//                (and back) without unsafe code on our side
//   PartialOrd -- native <, <=, >, >= (IEEE semantics for floats)
//   Send+Sync -- images are shared read-only across threads
//   AsPrimitive<_> for every kind -- native `as` conversions in generic code
//
// Equality and ordering (eq, ne, lt, le, gt, ge) come straight from
// PartialEq/PartialOrd. The arithmetic methods below are named after the
// operation; `std::ops::Add` and friends are not in the prelude, so calls like
// `a.add(b)` on a `T: NumericElement` resolve here unambiguously.

/// A primitive numeric type that can be stored in an [`Image`](crate::Image).
///
/// Implemented for `u8, u16, u32, u64, i8, i16, i32, i64, f32, f64` only.
///
/// Arithmetic follows native unchecked semantics: integers wrap on overflow,
/// floats follow IEEE 754. Integer division by zero panics exactly like the
/// `/` operator does; float division by zero yields ±infinity or NaN.
///
/// Casting uses Rust's `as` conversion for every pair:
/// - integer → integer truncates to the target width (two's complement wrap),
/// - integer → float rounds to the nearest representable value,
/// - float → integer rounds toward zero and saturates at the target bounds,
///   NaN becomes 0,
/// - f64 → f32 rounds to nearest, overflowing to ±infinity.
pub trait NumericElement:
    private::Sealed
    + bytemuck::Pod
    + PartialOrd
    + Default
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + 'static
    + AsPrimitive<u8>
    + AsPrimitive<u16>
    + AsPrimitive<u32>
    + AsPrimitive<u64>
    + AsPrimitive<i8>
    + AsPrimitive<i16>
    + AsPrimitive<i32>
    + AsPrimitive<i64>
    + AsPrimitive<f32>
    + AsPrimitive<f64>
{
    /// Runtime tag of this type.
    const KIND: ElementKind;

    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    /// # Panics
    /// Integer kinds panic when `rhs` is zero.
    fn div(self, rhs: Self) -> Self;
    fn neg(self) -> Self;

    /// Total order used for sorting. Integers use `Ord`; floats place NaN
    /// below every number and treat `-0.0` and `0.0` as equal.
    fn compare(self, other: Self) -> Ordering;

    /// Native `as` conversion from any other supported kind.
    fn cast_from<S: NumericElement>(value: S) -> Self;

    /// Native `as` conversion into any other supported kind.
    #[inline]
    fn cast<U: NumericElement>(self) -> U {
        U::cast_from(self)
    }

    /// Small integer literal (0, 1, 2, 50, 100, ...) in this kind.
    #[inline]
    fn from_i32(value: i32) -> Self {
        Self::cast_from(value)
    }

    /// Widen into the f64 accumulator used by the statistics.
    #[inline]
    fn to_f64(self) -> f64 {
        self.cast::<f64>()
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        Self::cast_from(value)
    }
}

macro_rules! impl_integer_element {
    ($($t:ty => $kind:ident),* $(,)?) => {$(
        impl private::Sealed for $t {}

        impl NumericElement for $t {
            const KIND: ElementKind = ElementKind::$kind;

            #[inline]
            fn add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            #[inline]
            fn sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            #[inline]
            fn mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }

            #[inline]
            fn div(self, rhs: Self) -> Self {
                // wrapping_div still panics on a zero divisor; only MIN / -1 wraps.
                self.wrapping_div(rhs)
            }

            #[inline]
            fn neg(self) -> Self {
                self.wrapping_neg()
            }

            #[inline]
            fn compare(self, other: Self) -> Ordering {
                Ord::cmp(&self, &other)
            }

            #[inline]
            fn cast_from<S: NumericElement>(value: S) -> Self {
                AsPrimitive::<$t>::as_(value)
            }
        }
    )*};
}

macro_rules! impl_float_element {
    ($($t:ty => $kind:ident),* $(,)?) => {$(
        impl private::Sealed for $t {}

        impl NumericElement for $t {
            const KIND: ElementKind = ElementKind::$kind;

            #[inline]
            fn add(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn sub(self, rhs: Self) -> Self {
                self - rhs
            }

            #[inline]
            fn mul(self, rhs: Self) -> Self {
                self * rhs
            }

            #[inline]
            fn div(self, rhs: Self) -> Self {
                self / rhs
            }

            #[inline]
            fn neg(self) -> Self {
                -self
            }

            #[inline]
            fn compare(self, other: Self) -> Ordering {
                match self.partial_cmp(&other) {
                    Some(ordering) => ordering,
                    // At least one NaN: NaN sorts first, two NaNs tie.
                    None => other.is_nan().cmp(&self.is_nan()),
                }
            }

            #[inline]
            fn cast_from<S: NumericElement>(value: S) -> Self {
                AsPrimitive::<$t>::as_(value)
            }
        }
    )*};
}

impl_integer_element! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
}

impl_float_element! {
    f32 => F32,
    f64 => F64,
}
