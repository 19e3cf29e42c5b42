//! Runtime configuration gathered from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `GOOGLE_API_KEY` | required to describe images |
//! | `BANNR_MODEL` | `gemini-1.5-flash-latest` |
//! | `BANNR_TEMPERATURE` | `0.7` |
//! | `BANNR_GEMINI_BASE_URL` | public Gemini host |
//! | `BANNR_BANNER_URL` | required to generate banners |
//! | `BANNR_BANNER_API_KEY` | none |
//! | `BANNR_MAX_IMAGE_EDGE` | `768` |
//! | `BANNR_REQUEST_TIMEOUT_SECS` | none |

use crate::banner::{BannerRequester, HttpBannerProvider};
use crate::describe::{DescriptionRequester, GeminiModel, GeminiProvider, DEFAULT_TEMPERATURE};
use crate::error::{BannrError, Result};
use crate::image::{LocalImageResolver, DEFAULT_MAX_EDGE};
use crate::session::SessionController;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Everything needed to wire up a [`SessionController`].
///
/// Providers built from a `Config` use only the values held here; the
/// environment is read once, by [`Config::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Gemini API key.
    pub google_api_key: Option<String>,
    /// Gemini model.
    pub model: GeminiModel,
    /// Sampling temperature for descriptions.
    pub temperature: f32,
    /// Gemini host override.
    pub gemini_base_url: Option<String>,
    /// Image-generation endpoint base URL.
    pub banner_url: Option<String>,
    /// Bearer token for the image-generation endpoint.
    pub banner_api_key: Option<String>,
    /// Long-edge bound for uploaded images.
    pub max_image_edge: u32,
    /// Timeout for banner requests.
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_api_key: None,
            model: GeminiModel::default(),
            temperature: DEFAULT_TEMPERATURE,
            gemini_base_url: None,
            banner_url: None,
            banner_api_key: None,
            max_image_edge: DEFAULT_MAX_EDGE,
            request_timeout: None,
        }
    }
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let model = match get("BANNR_MODEL") {
            Some(id) => GeminiModel::from_id(&id)
                .ok_or_else(|| BannrError::Config(format!("unknown BANNR_MODEL: {id}")))?,
            None => GeminiModel::default(),
        };

        let max_image_edge = parse_or(
            "BANNR_MAX_IMAGE_EDGE",
            get("BANNR_MAX_IMAGE_EDGE"),
            DEFAULT_MAX_EDGE,
        )?;
        if max_image_edge == 0 {
            return Err(BannrError::Config(
                "BANNR_MAX_IMAGE_EDGE must be at least 1".into(),
            ));
        }

        Ok(Self {
            google_api_key: get("GOOGLE_API_KEY"),
            model,
            temperature: parse_or("BANNR_TEMPERATURE", get("BANNR_TEMPERATURE"), DEFAULT_TEMPERATURE)?,
            gemini_base_url: get("BANNR_GEMINI_BASE_URL"),
            banner_url: get("BANNR_BANNER_URL"),
            banner_api_key: get("BANNR_BANNER_API_KEY"),
            max_image_edge,
            request_timeout: get("BANNR_REQUEST_TIMEOUT_SECS")
                .map(|raw| parse_or("BANNR_REQUEST_TIMEOUT_SECS", Some(raw), 0u64))
                .transpose()?
                .map(Duration::from_secs),
        })
    }

    /// Builds the image resolver.
    pub fn resolver(&self) -> LocalImageResolver {
        LocalImageResolver::new().with_max_edge(self.max_image_edge)
    }

    /// Builds the Gemini description provider.
    pub fn description_provider(&self) -> Result<GeminiProvider> {
        let mut builder = GeminiProvider::builder()
            .ignore_env()
            .model(self.model)
            .temperature(self.temperature);
        if let Some(key) = &self.google_api_key {
            builder = builder.api_key(key);
        }
        if let Some(url) = &self.gemini_base_url {
            builder = builder.base_url(url);
        }
        builder.build()
    }

    /// Builds the HTTP banner provider.
    pub fn banner_provider(&self) -> Result<HttpBannerProvider> {
        let mut builder = HttpBannerProvider::builder().ignore_env();
        if let Some(url) = &self.banner_url {
            builder = builder.base_url(url);
        }
        if let Some(key) = &self.banner_api_key {
            builder = builder.api_key(key);
        }
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Builds the Description Requester.
    pub fn description_requester(&self) -> Result<DescriptionRequester> {
        Ok(DescriptionRequester::new(
            Arc::new(self.description_provider()?),
            Arc::new(self.resolver()),
        ))
    }

    /// Builds the Banner Requester.
    pub fn banner_requester(&self) -> Result<BannerRequester> {
        Ok(BannerRequester::new(Arc::new(self.banner_provider()?)))
    }

    /// Builds a controller wired to both requesters.
    pub fn controller(&self) -> Result<SessionController> {
        Ok(SessionController::new(
            self.description_requester()?,
            self.banner_requester()?,
        ))
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|e| BannrError::Config(format!("invalid {key} '{raw}': {e}"))),
        None => Ok(default),
    }
}
