use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use tutorbook_core::models::event::ChangeEvent;
use tutorbook_core::models::session::{Session, SessionListing, SessionStatus};
use tutorbook_core::reconcile::{Reconciled, SessionList};
use tutorbook_db::feed::parse_payload;
use uuid::Uuid;

#[test]
fn test_parse_update_payload() {
    let id = Uuid::new_v4();
    let student = Uuid::new_v4();
    let tutor = Uuid::new_v4();

    // Shape produced by to_jsonb with a non-UTC session time zone
    let payload = format!(
        r#"{{
            "eventType": "update",
            "new": {{
                "id": "{id}", "student_id": "{student}", "tutor_id": "{tutor}",
                "subject": "Physics",
                "start_time": "2026-10-21T18:00:00+02:00",
                "end_time": "2026-10-21T19:00:00+02:00",
                "status": "reschedule_requested",
                "notes": null, "cancellation_reason": null, "room_id": null,
                "original_start_time": "2026-10-20T16:00:00+00:00",
                "original_end_time": "2026-10-20T17:00:00+00:00",
                "original_status": "confirmed",
                "proposed_by": "{tutor}",
                "version": 2,
                "created_at": "2026-10-17T10:00:00.123456+00:00",
                "updated_at": "2026-10-18T09:00:00+00:00"
            }},
            "old": {{ "id": "{id}", "student_id": "{student}", "tutor_id": "{tutor}", "status": "confirmed", "version": 1 }}
        }}"#
    );

    let event = parse_payload(&payload).unwrap();

    assert_eq!(event.session_id(), id);
    assert!(event.involves(student));
    assert!(event.involves(tutor));
    assert!(!event.involves(Uuid::new_v4()));

    let ChangeEvent::Update { new, old } = event else {
        panic!("expected an update event");
    };
    assert_eq!(
        new.start_time,
        Some(Utc.with_ymd_and_hms(2026, 10, 21, 16, 0, 0).unwrap())
    );
    assert_eq!(new.status, Some(SessionStatus::RescheduleRequested));
    assert_eq!(new.notes, Some(None));
    assert_eq!(new.version, Some(2));
    assert_eq!(
        new.negotiation().map(|n| n.original_status),
        Some(SessionStatus::Confirmed)
    );
    assert_eq!(old.and_then(|o| o.version), Some(1));
}

#[test]
fn test_parse_insert_and_delete_payloads() {
    let id = Uuid::new_v4();

    let insert = parse_payload(&format!(
        r#"{{"eventType":"insert","new":{{"id":"{id}","status":"pending"}},"old":null}}"#
    ))
    .unwrap();
    assert!(matches!(insert, ChangeEvent::Insert { .. }));

    let delete = parse_payload(&format!(
        r#"{{"eventType":"delete","new":null,"old":{{"id":"{id}"}}}}"#
    ))
    .unwrap();
    assert_eq!(delete.session_id(), id);
}

#[test]
fn test_malformed_payloads_are_rejected() {
    assert!(parse_payload("not json").is_err());
    assert!(parse_payload(r#"{"eventType":"truncate","new":null,"old":null}"#).is_err());
    assert!(parse_payload(r#"{"eventType":"update","new":{"status":"confirmed"}}"#).is_err());
}

#[test]
fn test_payload_without_free_text_keeps_local_notes() {
    let id = Uuid::new_v4();
    let student = Uuid::new_v4();
    let tutor = Uuid::new_v4();
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
    let start = Utc.with_ymd_and_hms(2026, 10, 20, 16, 0, 0).unwrap();
    let notes = "Bring the past papers. ".repeat(400);

    let mut list = SessionList::new(student);
    list.replace_all(
        vec![SessionListing {
            session: Session {
                id,
                student_id: student,
                tutor_id: tutor,
                subject: "Physics".to_string(),
                start_time: start,
                end_time: start + chrono::Duration::hours(1),
                status: SessionStatus::Pending,
                notes: Some(notes.clone()),
                cancellation_reason: None,
                room_id: None,
                negotiation: None,
                version: 1,
                created_at: now,
                updated_at: now,
            },
            counterpart_name: Some("Ada".to_string()),
        }],
        now,
    );

    // The trigger leaves notes and cancellation_reason out of the payload
    let event = parse_payload(&format!(
        r#"{{
            "eventType": "update",
            "new": {{
                "id": "{id}", "student_id": "{student}", "tutor_id": "{tutor}",
                "subject": "Physics", "status": "confirmed", "room_id": null,
                "start_time": "2026-10-20T16:00:00+00:00",
                "end_time": "2026-10-20T17:00:00+00:00",
                "version": 2
            }},
            "old": null
        }}"#
    ))
    .unwrap();

    assert_eq!(list.apply(&event, now), Reconciled::Merged);

    let listing = list.get(id).unwrap();
    assert_eq!(listing.session.status, SessionStatus::Confirmed);
    assert_eq!(listing.session.notes, Some(notes));
}
