//! Folding change-feed events into a participant's local session list.
//!
//! The list holds upcoming sessions only (start in the future, status
//! pending, confirmed or reschedule_requested) ordered by start time.
//! Events may arrive twice or out of order; applying an event that was
//! already applied leaves the list untouched.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::event::{ChangeEvent, SessionPatch};
use crate::models::session::{Negotiation, Session, SessionListing, SessionStatus};

/// What applying one event did to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// A listing changed.
    Merged,
    /// The event matched a listing but carried nothing new.
    Unchanged,
    /// A listing left the list.
    Removed,
    /// The event is older than the listing it targets.
    Stale,
    /// The event does not concern this list.
    Ignored,
    /// The list cannot be updated from the event alone; fetch it again.
    RefetchRequired,
}

#[derive(Debug, Clone)]
pub struct SessionList {
    owner_id: Uuid,
    listings: Vec<SessionListing>,
}

impl SessionList {
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            listings: Vec::new(),
        }
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn listings(&self) -> &[SessionListing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&SessionListing> {
        self.listings.iter().find(|l| l.session.id == id)
    }

    /// Installs a freshly fetched baseline.
    ///
    /// Negotiation data held locally survives for sessions still awaiting a
    /// reschedule answer whose fetched row does not carry it.
    pub fn replace_all(&mut self, fetched: Vec<SessionListing>, now: DateTime<Utc>) {
        let mut next: Vec<SessionListing> = fetched
            .into_iter()
            .filter(|l| self.keeps(&l.session, now))
            .collect();

        for listing in &mut next {
            let session = &mut listing.session;
            if session.status == SessionStatus::RescheduleRequested && session.negotiation.is_none()
            {
                session.negotiation = self
                    .get(session.id)
                    .filter(|local| local.session.status == SessionStatus::RescheduleRequested)
                    .and_then(|local| local.session.negotiation.clone());
            }
        }

        sort_by_start(&mut next);
        self.listings = next;
    }

    pub fn apply(&mut self, event: &ChangeEvent, now: DateTime<Utc>) -> Reconciled {
        match event {
            ChangeEvent::Insert { new } => {
                if new.involves(self.owner_id) {
                    Reconciled::RefetchRequired
                } else {
                    Reconciled::Ignored
                }
            }
            ChangeEvent::Update { new, old } => self.apply_update(new, old.as_ref(), now),
            ChangeEvent::Delete { old } => match self.position(old.id) {
                Some(index) => {
                    self.listings.remove(index);
                    Reconciled::Removed
                }
                None => Reconciled::Ignored,
            },
        }
    }

    fn apply_update(
        &mut self,
        new: &SessionPatch,
        old: Option<&SessionPatch>,
        now: DateTime<Utc>,
    ) -> Reconciled {
        let Some(index) = self.position(new.id) else {
            let may_belong = new.status.is_some_and(|s| s.is_upcoming())
                && new.involves(self.owner_id);
            return if may_belong {
                Reconciled::RefetchRequired
            } else {
                Reconciled::Ignored
            };
        };

        let current = &self.listings[index].session;
        if new.version.is_some_and(|v| v < current.version) {
            return Reconciled::Stale;
        }

        let mut merged = current.clone();
        merge_fields(&mut merged, new);
        merged.negotiation = merge_negotiation(current, merged.status, new, old);

        if !self.keeps(&merged, now) {
            self.listings.remove(index);
            return Reconciled::Removed;
        }
        if merged == *current {
            return Reconciled::Unchanged;
        }

        self.listings[index].session = merged;
        sort_by_start(&mut self.listings);
        Reconciled::Merged
    }

    fn keeps(&self, session: &Session, now: DateTime<Utc>) -> bool {
        session.is_participant(self.owner_id) && session.is_upcoming(now)
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.listings.iter().position(|l| l.session.id == id)
    }
}

fn merge_fields(session: &mut Session, patch: &SessionPatch) {
    if let Some(student_id) = patch.student_id {
        session.student_id = student_id;
    }
    if let Some(tutor_id) = patch.tutor_id {
        session.tutor_id = tutor_id;
    }
    if let Some(subject) = &patch.subject {
        session.subject = subject.clone();
    }
    if let Some(start_time) = patch.start_time {
        session.start_time = start_time;
    }
    if let Some(end_time) = patch.end_time {
        session.end_time = end_time;
    }
    if let Some(status) = patch.status {
        session.status = status;
    }
    if let Some(notes) = &patch.notes {
        session.notes = notes.clone();
    }
    if let Some(reason) = &patch.cancellation_reason {
        session.cancellation_reason = reason.clone();
    }
    if let Some(room_id) = &patch.room_id {
        session.room_id = room_id.clone();
    }
    if let Some(version) = patch.version {
        session.version = version;
    }
    if let Some(created_at) = patch.created_at {
        session.created_at = created_at;
    }
    if let Some(updated_at) = patch.updated_at {
        session.updated_at = updated_at;
    }
}

/// Decides the negotiation a merged session carries.
///
/// Persisted negotiation columns on the event win. Without them the local
/// data is cleared when the status leaves `reschedule_requested`, captured
/// from the prior state when it enters it, and kept otherwise.
fn merge_negotiation(
    prior: &Session,
    status: SessionStatus,
    new: &SessionPatch,
    old: Option<&SessionPatch>,
) -> Option<Negotiation> {
    if let Some(carried) = new.negotiation() {
        return Some(carried);
    }
    if status != SessionStatus::RescheduleRequested {
        return None;
    }

    if prior.status != SessionStatus::RescheduleRequested {
        let from_event = old.and_then(|o| match (o.start_time, o.end_time, o.status) {
            (Some(start), Some(end), Some(status))
                if status != SessionStatus::RescheduleRequested =>
            {
                Some((start, end, status))
            }
            _ => None,
        });
        let (original_start, original_end, original_status) =
            from_event.unwrap_or((prior.start_time, prior.end_time, prior.status));

        return Some(Negotiation {
            original_start,
            original_end,
            original_status,
            proposed_by: new.proposed_by,
        });
    }

    prior.negotiation.clone().map(|mut kept| {
        if new.proposed_by.is_some() {
            kept.proposed_by = new.proposed_by;
        }
        kept
    })
}

fn sort_by_start(listings: &mut [SessionListing]) {
    listings.sort_by(|a, b| {
        a.session
            .start_time
            .cmp(&b.session.start_time)
            .then_with(|| a.session.id.cmp(&b.session.id))
    });
}
