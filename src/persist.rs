// persist.rs -- Flat record an Image is saved as and restored from.
//
// The record carries the shape, the element kind id ("u8", "f64", ...) and
// the raw native-endian bytes of the buffer. Restoring checks, in order:
//
//   1. kind id names a supported kind        else TypeNotSupported
//   2. kind id equals the requested T        else TypeMismatch
//   3. width >= 1 and height >= 1            else InvalidShape
//   4. raw_bytes holds width*height elements else SizeMismatch
//
// With the `serde` feature the record derives Serialize/Deserialize (field
// names in camelCase) and `Image<T>` serializes through it, so any serde
// format can carry an image without knowing about element kinds.

use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::element::{ElementKind, NumericElement};
use crate::error::{ImageError, Result};
use crate::image::Image;

/// Persisted form of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PersistedImage {
    pub width: i32,
    pub height: i32,
    /// [`ElementKind::name`] of the element type.
    pub element_kind_id: String,
    pub raw_bytes: Vec<u8>,
}

impl PersistedImage {
    /// Parse the kind id.
    ///
    /// # Errors
    /// `TypeNotSupported` for an unknown id.
    pub fn kind(&self) -> Result<ElementKind> {
        self.element_kind_id.parse()
    }

    /// Validated `(height, width)`.
    pub(crate) fn shape(&self) -> Result<(usize, usize)> {
        match (usize::try_from(self.height), usize::try_from(self.width)) {
            (Ok(height), Ok(width)) if height >= 1 && width >= 1 => Ok((height, width)),
            _ => Err(ImageError::InvalidShape(format!(
                "persisted shape {}×{} must be at least 1×1",
                self.height, self.width
            ))),
        }
    }
}

fn dimension(value: usize, axis: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| ImageError::InvalidShape(format!("{axis} {value} does not fit a persisted i32")))
}

impl<T: NumericElement> Image<T> {
    /// Snapshot into a persisted record.
    ///
    /// # Errors
    /// `InvalidShape` if a dimension exceeds `i32::MAX`.
    pub fn to_persisted(&self) -> Result<PersistedImage> {
        Ok(PersistedImage {
            width: dimension(self.width(), "width")?,
            height: dimension(self.height(), "height")?,
            element_kind_id: T::KIND.name().to_string(),
            raw_bytes: self.as_bytes().to_vec(),
        })
    }

    /// Restore from a persisted record.
    ///
    /// # Errors
    /// See the module docs for the order of checks.
    pub fn from_persisted(record: &PersistedImage) -> Result<Self> {
        let restored = restore(record);
        if let Err(err) = &restored {
            debug!("rejected persisted {} record: {err}", T::KIND);
        }
        restored
    }
}

fn restore<T: NumericElement>(record: &PersistedImage) -> Result<Image<T>> {
    let kind = record.kind()?;
    if kind != T::KIND {
        return Err(ImageError::TypeMismatch {
            expected: T::KIND,
            found: kind,
        });
    }
    let (height, width) = record.shape()?;
    Image::from_bytes(height, width, &record.raw_bytes)
}

impl<T: NumericElement> TryFrom<&PersistedImage> for Image<T> {
    type Error = ImageError;

    fn try_from(record: &PersistedImage) -> Result<Self> {
        Image::from_persisted(record)
    }
}

impl<T: NumericElement> TryFrom<PersistedImage> for Image<T> {
    type Error = ImageError;

    fn try_from(record: PersistedImage) -> Result<Self> {
        Image::from_persisted(&record)
    }
}

#[cfg(feature = "serde")]
impl<T: NumericElement> Serialize for Image<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_persisted()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T: NumericElement> Deserialize<'de> for Image<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = PersistedImage::deserialize(deserializer)?;
        Image::from_persisted(&record).map_err(serde::de::Error::custom)
    }
}
