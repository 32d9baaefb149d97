#[path = "../test_utils.rs"]
mod test_utils;

mod middleware_test;
mod notifications_test;
mod sessions_test;
