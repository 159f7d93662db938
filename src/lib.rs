// numimage: typed dense 2D numeric arrays
//
// Immutable row-major containers over ten primitive element kinds, with
// lazily cached statistics, masked views, index-mapping transforms and
// content hashing.
//
// Layering (each module only depends on the ones above it):
//   error      -- ImageError / Result
//   element    -- NumericElement trait + ElementKind tag
//   transform  -- Selector copy loop behind transpose/rotate/flip
//   hash       -- CRC-32 content hash
//   stats      -- Statistics trait, memo cells, reduction kernels
//   image      -- Image<T>
//   subview    -- SubView<'a, T>, Selection<'a, T>
//   persist    -- PersistedImage record (+ serde)
//   any        -- AnyImage, runtime-kinded wrapper

pub mod error;
pub mod element;
pub mod transform;
pub mod hash;
pub mod stats;
pub mod image;
pub mod subview;
pub mod persist;
pub mod any;

pub use any::AnyImage;
pub use element::{ElementKind, NumericElement};
pub use error::{ImageError, Result};
pub use image::Image;
pub use persist::PersistedImage;
pub use stats::Statistics;
pub use subview::{Selection, SubView};
pub use transform::{transform, FlipDirection, Rotation, Selector};

/// Glob-import for the common types and the `Statistics` trait.
pub mod prelude {
    pub use crate::{
        AnyImage, ElementKind, FlipDirection, Image, ImageError, NumericElement, Rotation,
        Selection, Statistics, SubView,
    };
}
