//! External collaborator definitions.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use derive_more::{Display, Error as StdError};
use tracing as log;

use crate::domain::{contract, user, Booking, Contract};
#[cfg(doc)]
use crate::Service;

/// External collaborators the [`Service`] delegates side effects to.
///
/// Every delegation is best-effort: a failing collaborator is logged and
/// never fails the operation that triggered it.
#[derive(Clone, Debug)]
pub struct Collaborators {
    /// [`Notifier`] delivering notifications to users.
    pub notifier: Arc<dyn Notifier>,

    /// [`DocumentRenderer`] producing signed [`Contract`] documents.
    pub document_renderer: Arc<dyn DocumentRenderer>,
}

impl Collaborators {
    /// Creates [`Collaborators`] that only write to the log, for use until
    /// real integrations are wired in.
    #[must_use]
    pub fn log_only() -> Self {
        Self {
            notifier: Arc::new(LogNotifier),
            document_renderer: Arc::new(UrlOnlyRenderer::default()),
        }
    }
}

/// Collaborator delivering [`Notification`]s to users.
#[async_trait]
pub trait Notifier: fmt::Debug + Send + Sync {
    /// Delivers the provided [`Notification`].
    ///
    /// # Errors
    ///
    /// If the delivery fails.
    async fn notify(
        &self,
        notification: Notification,
    ) -> Result<(), NotifyError>;
}

/// Notification to be delivered to a user.
#[derive(Clone, Debug)]
pub enum Notification {
    /// A new [`Booking`] was created upon an owner's property.
    BookingCreated {
        /// The created [`Booking`].
        booking: Booking,
    },

    /// A [`Booking`] was confirmed by the property owner.
    BookingConfirmed {
        /// The confirmed [`Booking`].
        booking: Booking,
    },

    /// A generated [`Contract`] is ready for the client to review.
    ContractReady {
        /// ID of the generated [`Contract`].
        contract_id: contract::Id,

        /// Email address to deliver the [`Contract`] to.
        email: user::Email,
    },
}

/// Error of a [`Notifier`] delivery.
#[derive(Debug, Display, StdError)]
#[display("notification delivery failed: {reason}")]
pub struct NotifyError {
    /// Reason of the failure.
    pub reason: String,
}

/// Collaborator rendering a signed [`Contract`] into a final document.
#[async_trait]
pub trait DocumentRenderer: fmt::Debug + Send + Sync {
    /// Renders the provided [`Contract`] and returns the URL of the
    /// produced document.
    ///
    /// # Errors
    ///
    /// If the rendering fails.
    async fn render(
        &self,
        contract: &Contract,
    ) -> Result<contract::DocumentUrl, RenderError>;
}

/// Error of a [`DocumentRenderer`] run.
#[derive(Debug, Display, StdError)]
#[display("document rendering failed: {reason}")]
pub struct RenderError {
    /// Reason of the failure.
    pub reason: String,
}

/// [`Notifier`] writing notifications to the log only.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        notification: Notification,
    ) -> Result<(), NotifyError> {
        log::info!("notification: {notification:?}");
        Ok(())
    }
}

/// [`DocumentRenderer`] deriving the target document URL only, leaving the
/// actual rendering to an external pipeline.
#[derive(Clone, Debug)]
pub struct UrlOnlyRenderer {
    /// Base URL the derived document URLs are rooted at.
    pub base_url: String,
}

impl Default for UrlOnlyRenderer {
    fn default() -> Self {
        Self {
            base_url: "file:///var/lib/stayhub/documents".to_owned(),
        }
    }
}

#[async_trait]
impl DocumentRenderer for UrlOnlyRenderer {
    async fn render(
        &self,
        contract: &Contract,
    ) -> Result<contract::DocumentUrl, RenderError> {
        let Self { base_url } = self;
        Ok(format!("{base_url}/{id}.pdf", id = contract.id).into())
    }
}
