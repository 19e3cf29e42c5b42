//! Session Controller: drives description then banner for one submission.

use crate::banner::BannerRequester;
use crate::describe::DescriptionRequester;
use crate::error::{BannrError, Result};
use crate::image::ImageRef;
use crate::session::cell::{StateCell, Ticket};
use crate::session::state::SessionState;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Pipeline stage, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Images to product description.
    Description,
    /// Description to banner URL.
    Banner,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Description => f.write_str("description request"),
            Self::Banner => f.write_str("banner request"),
        }
    }
}

/// Owns the session state and runs submissions against it.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct SessionController {
    cell: Arc<StateCell>,
    describer: Arc<DescriptionRequester>,
    banner: Arc<BannerRequester>,
}

impl SessionController {
    /// Creates a controller in [`SessionState::Initial`].
    pub fn new(describer: DescriptionRequester, banner: BannerRequester) -> Self {
        Self {
            cell: Arc::new(StateCell::new()),
            describer: Arc::new(describer),
            banner: Arc::new(banner),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> SessionState {
        self.cell.current()
    }

    /// Returns a receiver tracking the latest state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.cell.subscribe()
    }

    /// Registers a callback run synchronously on every transition.
    pub fn observe(&self, observer: impl Fn(&SessionState) + Send + Sync + 'static) {
        self.cell.observe(observer);
    }

    /// Returns to `Initial` (new image selection).
    ///
    /// In-flight requests keep running, but their results are discarded.
    pub fn reset(&self) {
        self.cell.reset();
        tracing::debug!("session reset");
    }

    /// Submits images: the state is `Loading` when this returns, and the
    /// pipeline continues on a spawned task.
    ///
    /// The task yields the terminal state it published, or `None` if the
    /// submission was superseded by [`reset`](Self::reset) or a newer submission.
    ///
    /// # Errors
    ///
    /// Returns [`BannrError::Runtime`] when called outside a tokio runtime.
    /// The state is left as it was.
    pub fn submit(
        &self,
        images: Vec<ImageRef>,
        customization: Option<String>,
    ) -> Result<JoinHandle<Option<SessionState>>> {
        let runtime = Handle::try_current().map_err(|e| BannrError::Runtime(e.to_string()))?;
        let ticket = self.cell.begin();
        let controller = self.clone();
        Ok(runtime.spawn(async move { controller.pipeline(ticket, images, customization).await }))
    }

    /// Like [`submit`](Self::submit), but runs the pipeline on the caller's task.
    pub async fn run(
        &self,
        images: Vec<ImageRef>,
        customization: Option<String>,
    ) -> Option<SessionState> {
        let ticket = self.cell.begin();
        self.pipeline(ticket, images, customization).await
    }

    async fn pipeline(
        &self,
        ticket: Ticket,
        images: Vec<ImageRef>,
        customization: Option<String>,
    ) -> Option<SessionState> {
        tracing::debug!(images = images.len(), "submission started");

        let text = match self.describer.describe(&images).await {
            Ok(text) => text,
            Err(e) => return self.fail(ticket, Stage::Description, &e),
        };

        if !self
            .cell
            .publish(ticket, SessionState::DescriptionReady { text: text.clone() })
        {
            return None;
        }
        self.on_description_ready(ticket, &text, customization.as_deref())
            .await
    }

    /// Second stage, chained as soon as a description is published.
    async fn on_description_ready(
        &self,
        ticket: Ticket,
        description: &str,
        customization: Option<&str>,
    ) -> Option<SessionState> {
        if !self.cell.publish(ticket, SessionState::Loading) {
            return None;
        }

        match self.banner.request(description, customization).await {
            Ok(banner) => {
                tracing::info!(url = %banner.image_url, "banner ready");
                self.finish(
                    ticket,
                    SessionState::ImageReady {
                        url: banner.image_url,
                    },
                )
            }
            Err(e) => self.fail(ticket, Stage::Banner, &e),
        }
    }

    fn fail(&self, ticket: Ticket, stage: Stage, error: &BannrError) -> Option<SessionState> {
        tracing::warn!(stage = %stage, "submission failed: {error}");
        self.finish(
            ticket,
            SessionState::Failed {
                message: format!("{stage} failed: {error}"),
            },
        )
    }

    fn finish(&self, ticket: Ticket, state: SessionState) -> Option<SessionState> {
        self.cell.publish(ticket, state.clone()).then_some(state)
    }
}
