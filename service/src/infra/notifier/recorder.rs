//! [`Recorder`] definitions.

use std::{collections::HashSet, sync::Arc};

use common::operations::Notify;
use tokio::sync::Mutex;
use tracerr::Traced;

use crate::{
    domain::user,
    infra::{notifier, Notifier},
    notice::Notice,
};

/// [`Notifier`] recording the delivered [`Notice`]s instead of sending them.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    /// Delivered [`Notice`]s.
    sent: Arc<Mutex<Vec<Sent>>>,

    /// Recipients refusing any [`Notice`].
    rejected: Arc<Mutex<HashSet<user::Email>>>,
}

/// [`Notice`] delivered by a [`Recorder`].
#[derive(Clone, Debug, PartialEq)]
pub struct Sent {
    /// Template of the delivered [`Notice`].
    pub template: &'static str,

    /// Recipient of the delivered [`Notice`].
    pub to: user::Email,

    /// Encoded payload of the delivered [`Notice`].
    pub payload: serde_json::Value,
}

impl Recorder {
    /// Creates a new empty [`Recorder`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes this [`Recorder`] fail the delivery of any [`Notice`] to the
    /// provided recipient.
    pub async fn reject(&self, recipient: user::Email) {
        _ = self.rejected.lock().await.insert(recipient);
    }

    /// Returns all the [`Notice`]s delivered so far.
    pub async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    /// Returns the [`Notice`]s delivered so far with the provided template.
    pub async fn sent_with(&self, template: &str) -> Vec<Sent> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|s| s.template == template)
            .cloned()
            .collect()
    }
}

impl<N: Notice> Notifier<Notify<N>> for Recorder {
    type Ok = ();
    type Err = Traced<notifier::Error>;

    async fn execute(
        &self,
        Notify(notice): Notify<N>,
    ) -> Result<Self::Ok, Self::Err> {
        let to = notice.recipient().clone();
        if self.rejected.lock().await.contains(&to) {
            return Err(tracerr::new!(notifier::Error::Rejected(to)));
        }

        let payload = serde_json::to_value(&notice)
            .map_err(tracerr::from_and_wrap!(=> notifier::Error))?;
        self.sent.lock().await.push(Sent {
            template: N::TEMPLATE,
            to,
            payload,
        });
        Ok(())
    }
}
