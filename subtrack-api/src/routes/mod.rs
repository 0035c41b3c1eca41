/// HTTP route handlers
///
/// Handlers stay thin: parse and validate the request, call the
/// orchestration service, shape the response. All error mapping happens
/// through `ApiError`.

pub mod health;
pub mod subscriptions;
pub mod users;
