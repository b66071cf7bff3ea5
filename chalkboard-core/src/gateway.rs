//! Create, update and delete events against a store.
//!
//! Ids handed to the gateway may be synthetic occurrence ids; writes always
//! target the base record. Nothing is cached here: callers refetch and
//! re-expand after a successful write.

use std::sync::Arc;

use chrono_tz::Tz;

use crate::error::ChalkboardResult;
use crate::event::{Event, EventDraft};
use crate::notice::{Notice, Notifier};
use crate::occurrence::real_id;
use crate::store::EventStore;

pub struct MutationGateway<S> {
    store: Arc<S>,
    tz: Tz,
    notifier: Notifier,
}

impl<S: EventStore> MutationGateway<S> {
    /// `tz` is the zone all-day bounds are normalized in.
    pub fn new(store: Arc<S>, tz: Tz) -> Self {
        MutationGateway {
            store,
            tz,
            notifier: Notifier::silent(),
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Insert a new base record.
    #[tracing::instrument(skip(self, draft), fields(user_id = %draft.user_id, title = %draft.title))]
    pub async fn create(&self, draft: EventDraft) -> ChalkboardResult<Event> {
        let result = async {
            let draft = draft.normalized(&self.tz);
            draft.validate(&self.tz)?;
            self.store.insert(&draft).await
        }
        .await;
        self.report(&result, "Event created", "Could not create event");
        result
    }

    /// Overwrite the whole series behind `id`.
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn update(&self, id: &str, draft: EventDraft) -> ChalkboardResult<Event> {
        let result = async {
            let draft = draft.normalized(&self.tz);
            draft.validate(&self.tz)?;
            self.store.update(real_id(id), &draft).await
        }
        .await;
        self.report(&result, "Event updated", "Could not update event");
        result
    }

    /// Delete the base record behind `id`, and with it every occurrence.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> ChalkboardResult<()> {
        let result = self.store.delete(real_id(id)).await;
        self.report(&result, "Event deleted", "Could not delete event");
        result
    }

    fn report<T>(&self, result: &ChalkboardResult<T>, done: &str, failed: &str) {
        match result {
            Ok(_) => {
                tracing::info!("{done}");
                self.notifier.send(Notice::success(done));
            }
            Err(e) => {
                tracing::warn!(error = %e, "{failed}");
                self.notifier.send(Notice::error(format!("{failed}: {e}")));
            }
        }
    }
}
