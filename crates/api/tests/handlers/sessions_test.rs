use axum::http::StatusCode;
use chrono::{Duration, Utc};
use mockall::predicate;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tutorbook_core::{
    context::ActorContext,
    errors::BookingError,
    lifecycle::Action,
    models::{
        notification::{Notification, NotificationKind},
        session::{Negotiation, Session, SessionListing, SessionStatus, TransitionResponse},
    },
};
use uuid::Uuid;

use crate::test_utils::{TestContext, as_actor};

fn stored(notification: &tutorbook_core::models::notification::NewNotification) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        recipient_id: notification.recipient_id,
        sender_id: notification.sender_id,
        content: notification.content.clone(),
        kind: notification.kind,
        link: notification.link.clone(),
        is_read: false,
        created_at: Utc::now(),
    }
}

#[test_log::test(tokio::test)]
async fn test_create_session_returns_created() {
    let mut ctx = TestContext::new();
    let session = ctx.session(SessionStatus::Pending);
    let returned = session.clone();
    let student_id = ctx.student.user_id;

    ctx.sessions
        .expect_insert_session()
        .withf(move |new| new.student_id == student_id && new.subject == "Geometry")
        .times(1)
        .returning(move |_| Ok(returned.clone()));

    let student = ctx.student;
    let tutor_id = ctx.tutor.user_id;
    let server = ctx.build_server();

    let response = as_actor(server.post("/api/sessions"), &student)
        .json(&json!({
            "tutor_id": tutor_id,
            "subject": "Geometry",
            "start_time": session.start_time,
            "end_time": session.end_time,
            "notes": null
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Session = response.json();
    assert_eq!(body.id, session.id);
    assert_eq!(body.status, SessionStatus::Pending);
}

#[tokio::test]
async fn test_create_session_rejects_zero_length() {
    let mut ctx = TestContext::new();
    ctx.sessions.expect_insert_session().times(0);

    let student = ctx.student;
    let tutor_id = ctx.tutor.user_id;
    let server = ctx.build_server();
    let start = Utc::now() + Duration::days(2);

    let response = as_actor(server.post("/api/sessions"), &student)
        .json(&json!({
            "tutor_id": tutor_id,
            "subject": "Geometry",
            "start_time": start,
            "end_time": start,
            "notes": null
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Validation error"));
}

#[tokio::test]
async fn test_requests_without_identity_are_forbidden() {
    let ctx = TestContext::new();
    let server = ctx.build_server();

    let response = server.get("/api/sessions/upcoming").await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_upcoming_sessions() {
    let mut ctx = TestContext::new();
    let listing = SessionListing {
        session: ctx.session(SessionStatus::Confirmed),
        counterpart_name: Some("Grace Hopper".to_string()),
    };
    let listings = vec![listing.clone()];
    let tutor_id = ctx.tutor.user_id;

    ctx.sessions
        .expect_list_upcoming()
        .withf(move |filter| filter.participant_id == tutor_id)
        .times(1)
        .returning(move |_| Ok(listings.clone()));

    let tutor = ctx.tutor;
    let server = ctx.build_server();

    let response = as_actor(server.get("/api/sessions/upcoming"), &tutor).await;

    response.assert_status_ok();
    let body: Vec<SessionListing> = response.json();
    assert_eq!(body, vec![listing]);
}

#[tokio::test]
async fn test_propose_reschedule() {
    let mut ctx = TestContext::new();
    let session = ctx.session(SessionStatus::Confirmed);
    let id = session.id;
    let start = session.start_time + Duration::days(1);
    let end = start + Duration::minutes(90);
    let student_id = ctx.student.user_id;

    ctx.sessions
        .expect_get_session()
        .with(predicate::eq(id))
        .returning(move |_| Ok(Some(session.clone())));
    ctx.sessions
        .expect_apply_transition()
        .withf(|t| t.action == Action::ProposeReschedule)
        .times(1)
        .returning(|t| Ok(t.session.clone()));
    ctx.notifications
        .expect_insert_notification()
        .withf(move |n| n.recipient_id == student_id && n.kind == NotificationKind::RescheduleRequest)
        .times(1)
        .returning(|n| Ok(stored(n)));

    let tutor = ctx.tutor;
    let server = ctx.build_server();

    let response = as_actor(server.post(&format!("/api/sessions/{}/reschedule", id)), &tutor)
        .json(&json!({ "start": start, "end": end }))
        .await;

    response.assert_status_ok();
    let body: TransitionResponse = response.json();
    assert_eq!(body.session.status, SessionStatus::RescheduleRequested);
    assert_eq!(body.session.start_time, start);
    assert_eq!(body.session.end_time, end);
    assert_eq!(
        body.session.negotiation.and_then(|n| n.proposed_by),
        Some(tutor.user_id)
    );
    assert_eq!(body.warning, None);
}

#[tokio::test]
async fn test_decline_reports_notification_warning() {
    let mut ctx = TestContext::new();
    let mut session = ctx.session(SessionStatus::RescheduleRequested);
    let original_start = session.start_time - Duration::hours(3);
    session.negotiation = Some(Negotiation {
        original_start,
        original_end: original_start + Duration::hours(1),
        original_status: SessionStatus::Confirmed,
        proposed_by: Some(ctx.tutor.user_id),
    });
    let id = session.id;

    ctx.sessions
        .expect_get_session()
        .returning(move |_| Ok(Some(session.clone())));
    ctx.sessions
        .expect_apply_transition()
        .returning(|t| Ok(t.session.clone()));
    ctx.notifications
        .expect_insert_notification()
        .returning(|_| Err(BookingError::Store(eyre::eyre!("inbox offline"))));

    let student = ctx.student;
    let server = ctx.build_server();

    let response = as_actor(
        server.post(&format!("/api/sessions/{}/reschedule/decline", id)),
        &student,
    )
    .await;

    response.assert_status_ok();
    let body: TransitionResponse = response.json();
    assert_eq!(body.session.status, SessionStatus::Confirmed);
    assert_eq!(body.session.start_time, original_start);
    assert!(body.warning.unwrap().contains("inbox offline"));
}

#[tokio::test]
async fn test_proposer_cannot_accept_own_proposal() {
    let mut ctx = TestContext::new();
    let mut session = ctx.session(SessionStatus::RescheduleRequested);
    session.negotiation = Some(Negotiation {
        original_start: session.start_time - Duration::hours(2),
        original_end: session.end_time - Duration::hours(2),
        original_status: SessionStatus::Confirmed,
        proposed_by: Some(ctx.student.user_id),
    });
    let id = session.id;

    ctx.sessions
        .expect_get_session()
        .returning(move |_| Ok(Some(session.clone())));
    ctx.sessions.expect_apply_transition().times(0);

    let student = ctx.student;
    let server = ctx.build_server();

    let response = as_actor(
        server.post(&format!("/api/sessions/{}/reschedule/accept", id)),
        &student,
    )
    .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_without_body() {
    let mut ctx = TestContext::new();
    let session = ctx.session(SessionStatus::Confirmed);
    let id = session.id;

    ctx.sessions
        .expect_get_session()
        .returning(move |_| Ok(Some(session.clone())));
    ctx.sessions
        .expect_apply_transition()
        .withf(|t| t.session.cancellation_reason.is_none())
        .returning(|t| Ok(t.session.clone()));

    let student = ctx.student;
    let server = ctx.build_server();

    let response = as_actor(server.post(&format!("/api/sessions/{}/cancel", id)), &student).await;

    response.assert_status_ok();
    let body: TransitionResponse = response.json();
    assert_eq!(body.session.status, SessionStatus::Cancelled);
}

#[tokio::test]
async fn test_concurrent_change_is_conflict() {
    let mut ctx = TestContext::new();
    let session = ctx.session(SessionStatus::Pending);
    let id = session.id;

    ctx.sessions
        .expect_get_session()
        .returning(move |_| Ok(Some(session.clone())));
    ctx.sessions
        .expect_apply_transition()
        .returning(move |_| Err(BookingError::Conflict(id)));

    let tutor = ctx.tutor;
    let server = ctx.build_server();

    let response = as_actor(server.post(&format!("/api/sessions/{}/confirm", id)), &tutor).await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("please refresh"));
}

#[tokio::test]
async fn test_complete_requires_system() {
    let mut ctx = TestContext::new();
    let mut session = ctx.session(SessionStatus::Confirmed);
    session.start_time = Utc::now() - Duration::hours(2);
    session.end_time = Utc::now() - Duration::hours(1);
    let id = session.id;

    ctx.sessions
        .expect_get_session()
        .returning(move |_| Ok(Some(session.clone())));
    ctx.sessions
        .expect_apply_transition()
        .times(1)
        .returning(|t| Ok(t.session.clone()));

    let tutor = ctx.tutor;
    let server = ctx.build_server();

    let rejected = as_actor(server.post(&format!("/api/sessions/{}/complete", id)), &tutor).await;
    rejected.assert_status(StatusCode::FORBIDDEN);

    let completed = as_actor(
        server.post(&format!("/api/sessions/{}/complete", id)),
        &ActorContext::system(),
    )
    .await;
    completed.assert_status_ok();
    let body: TransitionResponse = completed.json();
    assert_eq!(body.session.status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let mut ctx = TestContext::new();
    ctx.sessions.expect_get_session().returning(|_| Ok(None));

    let tutor = ctx.tutor;
    let server = ctx.build_server();

    let response = as_actor(
        server.post(&format!("/api/sessions/{}/confirm", Uuid::new_v4())),
        &tutor,
    )
    .await;

    response.assert_status(StatusCode::NOT_FOUND);
}
