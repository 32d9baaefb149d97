use axum::http::{HeaderMap, HeaderValue, StatusCode};
use rstest::rstest;
use tutorbook_api::middleware::{
    auth::{HeaderIdentity, USER_ID_HEADER, USER_ROLE_HEADER},
    error_handling::map_error,
};
use tutorbook_core::{
    context::Role,
    errors::BookingError,
    repository::IdentityProvider,
};
use uuid::Uuid;

#[rstest]
#[case(BookingError::Validation("bad input".into()), StatusCode::BAD_REQUEST)]
#[case(BookingError::Precondition("cancelled".into()), StatusCode::CONFLICT)]
#[case(BookingError::MissingSnapshot(Uuid::nil()), StatusCode::CONFLICT)]
#[case(BookingError::Conflict(Uuid::nil()), StatusCode::CONFLICT)]
#[case(BookingError::Forbidden("not a party".into()), StatusCode::FORBIDDEN)]
#[case(BookingError::NotFound("missing".into()), StatusCode::NOT_FOUND)]
#[case(BookingError::Busy("in flight".into()), StatusCode::TOO_MANY_REQUESTS)]
#[case(BookingError::Subscription("closed".into()), StatusCode::SERVICE_UNAVAILABLE)]
#[case(BookingError::Store(eyre::eyre!("down")), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(BookingError::NotificationWrite("denied".into()), StatusCode::INTERNAL_SERVER_ERROR)]
#[tokio::test]
async fn test_error_status_mapping(#[case] error: BookingError, #[case] expected: StatusCode) {
    let response = map_error(error);

    assert_eq!(response.status(), expected);
}

fn headers(user_id: &str, role: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_ID_HEADER, HeaderValue::from_str(user_id).unwrap());
    headers.insert(USER_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
    headers
}

#[test]
fn test_header_identity() {
    let id = Uuid::new_v4();
    let headers = headers(&id.to_string(), "tutor");

    let actor = HeaderIdentity::new(&headers).current_actor().unwrap();

    assert_eq!(actor.user_id, id);
    assert_eq!(actor.role, Role::Tutor);
}

#[test]
fn test_header_identity_rejects_bad_values() {
    let id = Uuid::new_v4().to_string();

    assert!(matches!(
        HeaderIdentity::new(&headers("not-a-uuid", "student")).current_actor(),
        Err(BookingError::Validation(_))
    ));
    assert!(matches!(
        HeaderIdentity::new(&headers(&id, "admin")).current_actor(),
        Err(BookingError::Validation(_))
    ));
    assert!(matches!(
        HeaderIdentity::new(&HeaderMap::new()).current_actor(),
        Err(BookingError::Forbidden(_))
    ));
}
