//! Image references and their resolution into uploadable pixel data.

mod resolver;
mod types;

pub use resolver::{ImageResolver, LocalImageResolver, DEFAULT_MAX_EDGE};
pub use types::{ImageFormat, ImageRef, ResolvedImage};
