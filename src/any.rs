//! Type-erased image that can hold any supported element kind.
//!
//! `Image<T>` is the fast, statically typed container. `AnyImage` is for the
//! places where the kind is only known at runtime: a persisted record, a
//! kind name from configuration, or a collection mixing kinds. Statistics
//! come back widened to `f64` so callers need not know the kind.

use std::any::Any;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::element::{ElementKind, NumericElement};
use crate::error::{ImageError, Result};
use crate::image::Image;
use crate::persist::PersistedImage;
use crate::stats::{self, Statistics};
use crate::transform::{FlipDirection, Rotation};

/// An [`Image`] of any of the ten element kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyImage {
    U8(Image<u8>),
    U16(Image<u16>),
    U32(Image<u32>),
    U64(Image<u64>),
    I8(Image<i8>),
    I16(Image<i16>),
    I32(Image<i32>),
    I64(Image<i64>),
    F32(Image<f32>),
    F64(Image<f64>),
}

/// Run `$body` with `$img` bound to the inner `&Image<T>`.
macro_rules! dispatch {
    ($value:expr, $img:ident => $body:expr) => {
        match $value {
            AnyImage::U8($img) => $body,
            AnyImage::U16($img) => $body,
            AnyImage::U32($img) => $body,
            AnyImage::U64($img) => $body,
            AnyImage::I8($img) => $body,
            AnyImage::I16($img) => $body,
            AnyImage::I32($img) => $body,
            AnyImage::I64($img) => $body,
            AnyImage::F32($img) => $body,
            AnyImage::F64($img) => $body,
        }
    };
}

/// Like `dispatch!` but rewraps the resulting `Image<T>` in the same variant.
macro_rules! map_same {
    ($value:expr, $img:ident => $body:expr) => {
        match $value {
            AnyImage::U8($img) => AnyImage::U8($body),
            AnyImage::U16($img) => AnyImage::U16($body),
            AnyImage::U32($img) => AnyImage::U32($body),
            AnyImage::U64($img) => AnyImage::U64($body),
            AnyImage::I8($img) => AnyImage::I8($body),
            AnyImage::I16($img) => AnyImage::I16($body),
            AnyImage::I32($img) => AnyImage::I32($body),
            AnyImage::I64($img) => AnyImage::I64($body),
            AnyImage::F32($img) => AnyImage::F32($body),
            AnyImage::F64($img) => AnyImage::F64($body),
        }
    };
}

/// Pairwise dispatch for two images of the same kind.
macro_rules! zip_same {
    ($left:expr, $right:expr, $a:ident, $b:ident => $body:expr) => {
        match ($left, $right) {
            (AnyImage::U8($a), AnyImage::U8($b)) => Ok(AnyImage::U8($body?)),
            (AnyImage::U16($a), AnyImage::U16($b)) => Ok(AnyImage::U16($body?)),
            (AnyImage::U32($a), AnyImage::U32($b)) => Ok(AnyImage::U32($body?)),
            (AnyImage::U64($a), AnyImage::U64($b)) => Ok(AnyImage::U64($body?)),
            (AnyImage::I8($a), AnyImage::I8($b)) => Ok(AnyImage::I8($body?)),
            (AnyImage::I16($a), AnyImage::I16($b)) => Ok(AnyImage::I16($body?)),
            (AnyImage::I32($a), AnyImage::I32($b)) => Ok(AnyImage::I32($body?)),
            (AnyImage::I64($a), AnyImage::I64($b)) => Ok(AnyImage::I64($body?)),
            (AnyImage::F32($a), AnyImage::F32($b)) => Ok(AnyImage::F32($body?)),
            (AnyImage::F64($a), AnyImage::F64($b)) => Ok(AnyImage::F64($body?)),
            (left, right) => Err(ImageError::TypeMismatch {
                expected: left.kind(),
                found: right.kind(),
            }),
        }
    };
}

/// Build the variant for `$kind` from an expression generic over `$t`.
macro_rules! for_kind {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            ElementKind::U8 => {
                type $t = u8;
                AnyImage::U8($body)
            }
            ElementKind::U16 => {
                type $t = u16;
                AnyImage::U16($body)
            }
            ElementKind::U32 => {
                type $t = u32;
                AnyImage::U32($body)
            }
            ElementKind::U64 => {
                type $t = u64;
                AnyImage::U64($body)
            }
            ElementKind::I8 => {
                type $t = i8;
                AnyImage::I8($body)
            }
            ElementKind::I16 => {
                type $t = i16;
                AnyImage::I16($body)
            }
            ElementKind::I32 => {
                type $t = i32;
                AnyImage::I32($body)
            }
            ElementKind::I64 => {
                type $t = i64;
                AnyImage::I64($body)
            }
            ElementKind::F32 => {
                type $t = f32;
                AnyImage::F32($body)
            }
            ElementKind::F64 => {
                type $t = f64;
                AnyImage::F64($body)
            }
        }
    };
}

fn widened_percentile<T: NumericElement>(image: &Image<T>, level: f64) -> f64 {
    if level == 0.0 {
        return image.min().to_f64();
    }
    if level == 100.0 {
        return image.max().to_f64();
    }
    let index = stats::rank_index(level, image.len());
    stats::nth_smallest(image.to_vec(), index).to_f64()
}

impl AnyImage {
    pub fn kind(&self) -> ElementKind {
        dispatch!(self, img => img.kind())
    }

    pub fn height(&self) -> usize {
        dispatch!(self, img => img.height())
    }

    pub fn width(&self) -> usize {
        dispatch!(self, img => img.width())
    }

    pub fn shape(&self) -> (usize, usize) {
        dispatch!(self, img => img.shape())
    }

    pub fn len(&self) -> usize {
        dispatch!(self, img => img.len())
    }

    /// Always false: images hold at least one element.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_bytes(&self) -> &[u8] {
        dispatch!(self, img => img.as_bytes())
    }

    // --- Statistics, widened to f64 ---

    pub fn max(&self) -> f64 {
        dispatch!(self, img => img.max().to_f64())
    }

    pub fn min(&self) -> f64 {
        dispatch!(self, img => img.min().to_f64())
    }

    pub fn median(&self) -> f64 {
        dispatch!(self, img => img.median().to_f64())
    }

    /// Mean cast to the element kind and widened back, so integer images
    /// report a truncated value like [`Statistics::average`] does.
    pub fn average(&self) -> f64 {
        dispatch!(self, img => img.average().to_f64())
    }

    pub fn mean(&self) -> f64 {
        dispatch!(self, img => img.mean())
    }

    pub fn variance(&self) -> f64 {
        dispatch!(self, img => img.variance().to_f64())
    }

    pub fn sample_variance(&self) -> f64 {
        dispatch!(self, img => img.sample_variance())
    }

    /// Nearest-rank percentile with the level given as f64 for every kind,
    /// so fractional levels work on integer images too.
    ///
    /// # Errors
    /// `OutOfRange` unless `0 <= level <= 100`.
    pub fn percentile(&self, level: f64) -> Result<f64> {
        stats::check_level(level)?;
        Ok(dispatch!(self, img => widened_percentile(img, level)))
    }

    // --- Equality & hashing ---

    /// Same kind, same shape and identical bytes.
    pub fn bitwise_eq(&self, other: &AnyImage) -> bool {
        self.kind() == other.kind() && self.shape() == other.shape() && self.as_bytes() == other.as_bytes()
    }

    pub fn content_hash(&self) -> u32 {
        dispatch!(self, img => img.content_hash())
    }

    // --- Transforms ---

    pub fn transpose(&self) -> AnyImage {
        map_same!(self, img => img.transpose())
    }

    pub fn rotate(&self, rotation: Rotation) -> AnyImage {
        map_same!(self, img => img.rotate(rotation))
    }

    pub fn flip(&self, direction: FlipDirection) -> AnyImage {
        map_same!(self, img => img.flip(direction))
    }

    /// Convert every element to `kind` with native `as` semantics.
    pub fn cast_to(&self, kind: ElementKind) -> AnyImage {
        dispatch!(self, img => for_kind!(kind, U => img.cast_to::<U>()))
    }

    /// Clamp with bounds given as f64 and cast to the element kind.
    ///
    /// # Errors
    /// `InvalidRange` unless `low <= high`, checked before the cast.
    pub fn clamp(&self, low: f64, high: f64) -> Result<AnyImage> {
        if !(low <= high) {
            return Err(ImageError::InvalidRange {
                low: format!("{low}"),
                high: format!("{high}"),
            });
        }
        Ok(map_same!(self, img => img.clamp(NumericElement::from_f64(low), NumericElement::from_f64(high))?))
    }

    /// # Errors
    /// `TypeMismatch` for different kinds, `ShapeMismatch` for different
    /// shapes.
    pub fn add(&self, other: &AnyImage) -> Result<AnyImage> {
        zip_same!(self, other, a, b => a.add(b))
    }

    /// # Errors
    /// Same as [`add`](Self::add).
    pub fn subtract(&self, other: &AnyImage) -> Result<AnyImage> {
        zip_same!(self, other, a, b => a.subtract(b))
    }

    // --- Typed access ---

    /// Borrow the inner image if it holds `T`.
    pub fn downcast_ref<T: NumericElement>(&self) -> Option<&Image<T>> {
        dispatch!(self, img => (img as &dyn Any).downcast_ref::<Image<T>>())
    }

    /// Unwrap into the typed image.
    ///
    /// # Errors
    /// `TypeMismatch` if the image does not hold `T`.
    pub fn into_image<T: NumericElement>(self) -> Result<Image<T>> {
        let found = self.kind();
        let boxed: Box<dyn Any> = dispatch!(self, img => Box::new(img));
        boxed.downcast::<Image<T>>().map(|img| *img).map_err(|_| ImageError::TypeMismatch {
            expected: T::KIND,
            found,
        })
    }

    // --- Persistence ---

    /// Restore whatever kind the record names.
    ///
    /// # Errors
    /// `TypeNotSupported` for an unknown kind id, then the same checks as
    /// [`Image::from_persisted`].
    pub fn from_persisted(record: &PersistedImage) -> Result<AnyImage> {
        let kind = record.kind()?;
        Ok(match kind {
            ElementKind::U8 => AnyImage::U8(Image::from_persisted(record)?),
            ElementKind::U16 => AnyImage::U16(Image::from_persisted(record)?),
            ElementKind::U32 => AnyImage::U32(Image::from_persisted(record)?),
            ElementKind::U64 => AnyImage::U64(Image::from_persisted(record)?),
            ElementKind::I8 => AnyImage::I8(Image::from_persisted(record)?),
            ElementKind::I16 => AnyImage::I16(Image::from_persisted(record)?),
            ElementKind::I32 => AnyImage::I32(Image::from_persisted(record)?),
            ElementKind::I64 => AnyImage::I64(Image::from_persisted(record)?),
            ElementKind::F32 => AnyImage::F32(Image::from_persisted(record)?),
            ElementKind::F64 => AnyImage::F64(Image::from_persisted(record)?),
        })
    }

    pub fn to_persisted(&self) -> Result<PersistedImage> {
        dispatch!(self, img => img.to_persisted())
    }
}

macro_rules! impl_from_image {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl From<Image<$t>> for AnyImage {
            fn from(image: Image<$t>) -> Self {
                AnyImage::$variant(image)
            }
        }
    )*};
}

impl_from_image! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

#[cfg(feature = "serde")]
impl Serialize for AnyImage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_persisted()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for AnyImage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = PersistedImage::deserialize(deserializer)?;
        AnyImage::from_persisted(&record).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_image() -> AnyImage {
        Image::from_slice(2, 2, &[10u8, 200, 30, 40]).unwrap().into()
    }

    #[test]
    fn reports_kind_and_shape() {
        let any = bytes_image();
        assert_eq!(any.kind(), ElementKind::U8);
        assert_eq!(any.shape(), (2, 2));
        assert_eq!(any.len(), 4);
        assert_eq!(any.as_bytes(), &[10, 200, 30, 40]);
    }

    #[test]
    fn statistics_are_widened() {
        let any = bytes_image();
        assert_eq!(any.max(), 200.0);
        assert_eq!(any.min(), 10.0);
        assert_eq!(any.median(), 30.0);
        assert_eq!(any.mean(), 70.0);
        assert_eq!(any.average(), 70.0);
    }

    #[test]
    fn fractional_percentile_on_integers() {
        let any = bytes_image();
        // sorted [10, 30, 40, 200]; ceil(62.5 * 4 / 100) = 3
        assert_eq!(any.percentile(62.5).unwrap(), 40.0);
        assert_eq!(any.percentile(0.0).unwrap(), 10.0);
        assert_eq!(any.percentile(100.0).unwrap(), 200.0);
        assert!(matches!(any.percentile(101.0), Err(ImageError::OutOfRange(_))));
        assert!(matches!(any.percentile(f64::NAN), Err(ImageError::OutOfRange(_))));
    }

    #[test]
    fn downcast_checks_kind() {
        let any = bytes_image();
        assert!(any.downcast_ref::<u8>().is_some());
        assert!(any.downcast_ref::<i8>().is_none());

        let err = any.clone().into_image::<u16>().unwrap_err();
        assert_eq!(
            err,
            ImageError::TypeMismatch {
                expected: ElementKind::U16,
                found: ElementKind::U8
            }
        );
        let img: Image<u8> = any.into_image().unwrap();
        assert_eq!(img.as_slice(), &[10, 200, 30, 40]);
    }

    #[test]
    fn binary_ops_need_same_kind() {
        let a = bytes_image();
        let b = a.cast_to(ElementKind::I32);
        assert_eq!(b.kind(), ElementKind::I32);
        assert!(matches!(a.add(&b), Err(ImageError::TypeMismatch { .. })));

        let doubled = b.add(&b).unwrap();
        assert_eq!(doubled.max(), 400.0);
        let zero = b.subtract(&b).unwrap();
        assert_eq!(zero.max(), 0.0);
    }

    #[test]
    fn clamp_checks_bounds_before_cast() {
        let any = bytes_image();
        let clamped = any.clamp(20.0, 100.0).unwrap();
        assert_eq!(clamped.as_bytes(), &[20, 100, 30, 40]);
        assert!(matches!(any.clamp(5.0, 1.0), Err(ImageError::InvalidRange { .. })));
        assert!(any.clamp(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn transforms_keep_kind() {
        let any = bytes_image();
        let t = any.transpose();
        assert_eq!(t.kind(), ElementKind::U8);
        assert_eq!(t.as_bytes(), &[10, 30, 200, 40]);
        assert!(any.rotate(Rotation::Deg180).rotate(Rotation::Deg180).bitwise_eq(&any));
        assert!(any.flip(FlipDirection::Horizontal).flip(FlipDirection::Horizontal).bitwise_eq(&any));
    }

    #[test]
    fn restores_any_kind_from_record() {
        let img = Image::from_slice(1, 3, &[-1.5f32, 0.0, 2.5]).unwrap();
        let record = img.to_persisted().unwrap();
        let any = AnyImage::from_persisted(&record).unwrap();
        assert_eq!(any.kind(), ElementKind::F32);
        assert_eq!(any.downcast_ref::<f32>(), Some(&img));

        let mut bad = record;
        bad.element_kind_id = "bf16".to_string();
        assert_eq!(
            AnyImage::from_persisted(&bad).unwrap_err(),
            ImageError::TypeNotSupported("bf16".to_string())
        );
    }
}
