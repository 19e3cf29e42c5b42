#![warn(missing_docs)]
//! Bannr - promotional banners from product photos.
//!
//! A submission runs two requests in sequence:
//!
//! 1. the selected photos go to a multimodal model (Gemini) that lists the
//!    products it sees, streamed back and joined into one description;
//! 2. that description becomes a banner prompt, posted to an
//!    image-generation endpoint that answers with the banner's URL.
//!
//! A [`SessionController`] owns the observable [`SessionState`] and chains
//! the second request as soon as the first one succeeds.
//!
//! # Quick Start
//!
//! ```no_run
//! use bannr::{Config, ImageRef, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> bannr::Result<()> {
//!     // GOOGLE_API_KEY and BANNR_BANNER_URL come from the environment
//!     let session = Config::from_env()?.controller()?;
//!
//!     let images = vec![ImageRef::new("shelf.jpg"), ImageRef::new("counter.jpg")];
//!     match session.run(images, Some("Diwali sale".into())).await {
//!         Some(SessionState::ImageReady { url }) => println!("banner: {url}"),
//!         Some(other) => println!("{other}"),
//!         None => println!("superseded"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli`: the `bannr` command-line tool (default)

pub mod banner;
mod config;
pub mod describe;
mod error;
pub mod image;
pub mod session;

// Re-export error types at crate root
pub use error::{BannrError, Result};

pub use config::Config;

pub use banner::{
    build_banner_prompt, BannerProvider, BannerRequest, BannerRequester, GeneratedBanner,
    HttpBannerProvider, HttpBannerProviderBuilder,
};
pub use describe::{
    DescriptionProvider, DescriptionRequester, GeminiModel, GeminiProvider,
    GeminiProviderBuilder, InputPart, PRODUCT_PROMPT,
};
pub use crate::image::{ImageRef, ImageResolver, LocalImageResolver, ResolvedImage};
pub use session::{SessionController, SessionState};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::banner::{BannerProvider, BannerRequester, HttpBannerProvider};
    pub use crate::describe::{DescriptionProvider, DescriptionRequester, GeminiProvider};
    pub use crate::error::{BannrError, Result};
    pub use crate::image::{ImageRef, ImageResolver, LocalImageResolver};
    pub use crate::session::{SessionController, SessionState};
    pub use crate::Config;
}
