//! Library for turning a single raster image into the icon containers that
//! desktop platforms expect: a Windows ICO file, a macOS ICNS file, and a
//! set of standalone PNG files for Linux.
//!
//! The pipeline has three stages: decode the source once into a
//! [`SourceImage`], rasterize it to every pixel size the selected platforms
//! require (one square PNG-encoded [`SizedBitmap`] per size), then pack the
//! bitmaps into each platform's container format. The whole run is driven by
//! [`convert`]:
//!
//! ```no_run
//! use iconpack::{convert, Platform, SourceImage};
//!
//! let bytes = std::fs::read("logo.png").unwrap();
//! let source = SourceImage::decode(&bytes).unwrap();
//! for result in convert(&source, &[Platform::Windows, Platform::MacOs]) {
//!     for file in &result.files {
//!         std::fs::write(&file.name, &file.data).unwrap();
//!     }
//! }
//! ```
//!
//! Platform branches fail independently: a size that cannot be rasterized
//! or an entry an encoder cannot use only affects the platforms that need
//! it, and each [`ConversionResult`] reports its own success or error.
//! The container encoders ([`encode_ico`], [`encode_icns`]) are also usable
//! directly with pre-made PNG bitmaps.

#![warn(missing_docs)]

mod cancel;
mod convert;
mod error;
mod icns;
mod ico;
mod platform;
mod raster;

pub use cancel::CancelToken;
pub use convert::{convert, convert_cancelable, ConversionResult, GeneratedFile};
pub use error::Error;
pub use icns::{encode_icns, os_type_for_edge, OsType};
pub use ico::encode_ico;
pub use platform::{ContainerFormat, Platform, PlatformProfile};
pub use raster::{rasterize, rasterize_cancelable, SizedBitmap, SourceImage, PNG_SIGNATURE};
