//! Session state values.

use serde::{Deserialize, Serialize};

/// Progress of the current submission. Exactly one variant is live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing submitted since the last image selection.
    #[default]
    Initial,
    /// A request is in flight.
    Loading,
    /// The product description is available; the banner request follows.
    DescriptionReady {
        /// Accumulated description text.
        text: String,
    },
    /// The banner was generated.
    ImageReady {
        /// Location of the generated banner.
        url: String,
    },
    /// The submission failed.
    Failed {
        /// Human-readable diagnostic.
        message: String,
    },
}

impl SessionState {
    /// Returns the state name used in logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Loading => "loading",
            Self::DescriptionReady { .. } => "description_ready",
            Self::ImageReady { .. } => "image_ready",
            Self::Failed { .. } => "failed",
        }
    }

    /// Returns true once a submission has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ImageReady { .. } | Self::Failed { .. })
    }

    /// Returns true while work is pending, including the hand-off between stages.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading | Self::DescriptionReady { .. })
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial | Self::Loading => f.write_str(self.name()),
            Self::DescriptionReady { text } => write!(f, "{}: {text}", self.name()),
            Self::ImageReady { url } => write!(f, "{}: {url}", self.name()),
            Self::Failed { message } => write!(f, "{}: {message}", self.name()),
        }
    }
}
