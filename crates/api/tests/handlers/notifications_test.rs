use axum::http::StatusCode;
use chrono::Utc;
use fake::Fake;
use fake::faker::lorem::en::Sentence;
use mockall::predicate;
use pretty_assertions::assert_eq;
use tutorbook_core::{
    errors::BookingError,
    models::notification::{Notification, NotificationKind},
};
use uuid::Uuid;

use crate::test_utils::{TestContext, as_actor};

fn notification(recipient_id: Uuid, sender_id: Uuid) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        recipient_id,
        sender_id,
        content: Sentence(3..8).fake(),
        kind: NotificationKind::RescheduleAccepted,
        link: Some(format!("/dashboard/sessions/{}", Uuid::new_v4())),
        is_read: false,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_list_unread_notifications() {
    let mut ctx = TestContext::new();
    let unread = vec![notification(ctx.student.user_id, ctx.tutor.user_id)];
    let expected = unread.clone();

    ctx.notifications
        .expect_list_notifications()
        .with(predicate::eq(ctx.student.user_id), predicate::eq(true))
        .times(1)
        .returning(move |_, _| Ok(unread.clone()));

    let student = ctx.student;
    let server = ctx.build_server();

    let response = as_actor(server.get("/api/notifications?unread_only=true"), &student).await;

    response.assert_status_ok();
    let body: Vec<Notification> = response.json();
    assert_eq!(body, expected);
}

#[tokio::test]
async fn test_list_defaults_to_all() {
    let mut ctx = TestContext::new();

    ctx.notifications
        .expect_list_notifications()
        .with(predicate::always(), predicate::eq(false))
        .times(1)
        .returning(|_, _| Ok(vec![]));

    let tutor = ctx.tutor;
    let server = ctx.build_server();

    let response = as_actor(server.get("/api/notifications"), &tutor).await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_mark_read() {
    let mut ctx = TestContext::new();
    let mut read = notification(ctx.tutor.user_id, ctx.student.user_id);
    read.is_read = true;
    let id = read.id;

    ctx.notifications
        .expect_mark_read()
        .with(predicate::eq(id), predicate::eq(ctx.tutor.user_id))
        .times(1)
        .returning(move |_, _| Ok(read.clone()));

    let tutor = ctx.tutor;
    let server = ctx.build_server();

    let response =
        as_actor(server.post(&format!("/api/notifications/{}/read", id)), &tutor).await;

    response.assert_status_ok();
    let body: Notification = response.json();
    assert!(body.is_read);
}

#[tokio::test]
async fn test_mark_read_of_someone_else_is_not_found() {
    let mut ctx = TestContext::new();

    ctx.notifications
        .expect_mark_read()
        .returning(|id, _| Err(BookingError::NotFound(format!("Notification with ID {} not found", id))));

    let student = ctx.student;
    let server = ctx.build_server();

    let response = as_actor(
        server.post(&format!("/api/notifications/{}/read", Uuid::new_v4())),
        &student,
    )
    .await;

    response.assert_status(StatusCode::NOT_FOUND);
}
