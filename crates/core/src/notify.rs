//! Inbox messages sent to the other party when a reschedule is proposed,
//! accepted or declined.

use chrono::{DateTime, Utc};

use crate::context::{ActorContext, Role};
use crate::lifecycle::Action;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::session::Session;

pub fn session_link(session: &Session) -> String {
    format!("/dashboard/sessions/{}", session.id)
}

/// Builds the notification an action owes the counter-party, if any.
///
/// `session` is the row after the action. Proposals go to the other party;
/// answers go back to the proposer, who is the other party of whoever answers.
pub fn notice_for(
    action: Action,
    session: &Session,
    actor: &ActorContext,
) -> Option<NewNotification> {
    let recipient_id = session.counterpart_of(actor.user_id)?;
    let who = actor_label(actor.role);

    let (kind, content) = match action {
        Action::ProposeReschedule => (
            NotificationKind::RescheduleRequest,
            format!(
                "Your {} proposed a new time for {}: {}",
                who,
                session.subject,
                format_slot(session.start_time, session.end_time)
            ),
        ),
        Action::AcceptReschedule => (
            NotificationKind::RescheduleAccepted,
            format!(
                "Your {} accepted the new time for {}: {}",
                who,
                session.subject,
                format_slot(session.start_time, session.end_time)
            ),
        ),
        Action::DeclineReschedule => (
            NotificationKind::RescheduleDeclined,
            format!(
                "Your {} declined the new time for {}. The session stays at {}",
                who,
                session.subject,
                format_slot(session.start_time, session.end_time)
            ),
        ),
        Action::Confirm | Action::Cancel | Action::Complete => return None,
    };

    Some(NewNotification {
        recipient_id,
        sender_id: actor.user_id,
        content,
        kind,
        link: Some(session_link(session)),
    })
}

fn actor_label(role: Role) -> &'static str {
    match role {
        Role::Student => "student",
        Role::Tutor => "tutor",
        Role::System => "organizer",
    }
}

/// e.g. `Tue 20 Oct 2026, 16:00 to 17:00 UTC`
pub fn format_slot(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    if start.date_naive() == end.date_naive() {
        format!(
            "{} to {} UTC",
            start.format("%a %d %b %Y, %H:%M"),
            end.format("%H:%M")
        )
    } else {
        format!(
            "{} to {} UTC",
            start.format("%a %d %b %Y, %H:%M"),
            end.format("%a %d %b %Y, %H:%M")
        )
    }
}
