//! Promotional banner generation from a product description.

mod http;
mod prompt;
mod provider;
mod requester;

pub use http::{HttpBannerProvider, HttpBannerProviderBuilder};
pub use prompt::build_banner_prompt;
pub use provider::{BannerMetadata, BannerProvider, BannerRequest, GeneratedBanner};
pub use requester::BannerRequester;
