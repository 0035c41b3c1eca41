/// Subscription endpoints
///
/// CRUD plus the two derived reads (active set, remaining days). All
/// endpoints require a valid JWT; the middleware injects the caller's
/// [`Identity`] into request extensions and creation always assigns
/// ownership to that identity, ignoring any client-supplied owner.
///
/// # Endpoints
///
/// - `GET    /v1/subscriptions?user_id=N`
/// - `GET    /v1/subscriptions/active`
/// - `GET    /v1/subscriptions/remaining-days?subscription_id=N`
/// - `POST   /v1/subscriptions`
/// - `PUT    /v1/subscriptions?subscription_id=N`
/// - `DELETE /v1/subscriptions?subscription_id=N`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    service::{ServiceError, SubscriptionRequest},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtrack_shared::auth::jwt::Identity;
use subtrack_shared::models::subscription::{Subscription, SubscriptionUpdate};

/// Query parameters for the owned-subscriptions listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Owner whose subscriptions to list
    pub user_id: i32,
}

/// Query parameters selecting a single subscription
#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    /// Target subscription
    pub subscription_id: i32,
}

/// Create request body
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    /// Start of the subscription window (inclusive)
    pub start_date: DateTime<Utc>,

    /// End of the subscription window (inclusive)
    pub end_date: DateTime<Utc>,

    /// Subscription type label
    pub subscription_type: String,
}

/// Update request body; replaces all mutable fields
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    /// New owner
    pub user_id: i32,

    /// New window start (inclusive)
    pub start_date: DateTime<Utc>,

    /// New window end (inclusive)
    pub end_date: DateTime<Utc>,

    /// New type label
    pub subscription_type: String,
}

/// Delete confirmation response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Deleted subscription
    pub subscription_id: i32,

    /// Always true; a missing record is reported as 404 instead
    pub deleted: bool,
}

/// Remaining-days response
#[derive(Debug, Serialize)]
pub struct RemainingDaysResponse {
    /// Target subscription
    pub subscription_id: i32,

    /// Whole days from today until the window end; negative once the
    /// window has closed
    pub remaining_days: i64,
}

/// Lists subscriptions owned by a user
///
/// # Endpoint
///
/// ```text
/// GET /v1/subscriptions?user_id=7
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Non-positive user id
/// - `401 Unauthorized`: Missing or invalid token
pub async fn list_for_user(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Subscription>>> {
    let subscriptions = state.service.subscriptions_for_user(query.user_id).await?;
    Ok(Json(subscriptions))
}

/// Lists subscriptions active today
///
/// A subscription is active when today falls inside its date window,
/// boundaries included; the time of day is ignored.
///
/// # Endpoint
///
/// ```text
/// GET /v1/subscriptions/active
/// ```
pub async fn list_active(State(state): State<AppState>) -> ApiResult<Json<Vec<Subscription>>> {
    let today = Utc::now().date_naive();
    let subscriptions = state.service.active_subscriptions(today).await?;
    Ok(Json(subscriptions))
}

/// Computes remaining days for a subscription
///
/// # Endpoint
///
/// ```text
/// GET /v1/subscriptions/remaining-days?subscription_id=3
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Non-positive id, inactive subscription, or unknown
///   subscription
/// - `401 Unauthorized`: Missing or invalid token
pub async fn remaining_days(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> ApiResult<Json<RemainingDaysResponse>> {
    let today = Utc::now().date_naive();

    let days = state
        .service
        .remaining_days(query.subscription_id, today)
        .await
        .map_err(|err| match err {
            // This endpoint reports an unknown id as a bad request, not 404
            ServiceError::NotFound(msg) => ApiError::BadRequest(msg),
            other => ApiError::from(other),
        })?;

    Ok(Json(RemainingDaysResponse {
        subscription_id: query.subscription_id,
        remaining_days: days,
    }))
}

/// Creates a subscription owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /v1/subscriptions
/// Content-Type: application/json
///
/// {
///   "start_date": "2024-01-01T00:00:00Z",
///   "end_date": "2024-01-31T00:00:00Z",
///   "subscription_type": "premium"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Inverted date window or empty type label
/// - `401 Unauthorized`: Missing or invalid token
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateRequest>,
) -> ApiResult<Json<Subscription>> {
    let created = state
        .service
        .create_subscription(
            identity.user_id,
            SubscriptionRequest {
                start_date: req.start_date,
                end_date: req.end_date,
                subscription_type: req.subscription_type,
            },
        )
        .await?;

    Ok(Json(created))
}

/// Full-replaces a subscription's mutable fields
///
/// # Endpoint
///
/// ```text
/// PUT /v1/subscriptions?subscription_id=3
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid id, window, owner, or type label
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Unknown subscription
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
    Json(req): Json<UpdateRequest>,
) -> ApiResult<Json<Subscription>> {
    let updated = state
        .service
        .update_subscription(
            query.subscription_id,
            SubscriptionUpdate {
                user_id: req.user_id,
                start_date: req.start_date,
                end_date: req.end_date,
                subscription_type: req.subscription_type,
            },
        )
        .await?;

    Ok(Json(updated))
}

/// Deletes a subscription
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/subscriptions?subscription_id=3
/// ```
///
/// # Response
///
/// ```json
/// {
///   "subscription_id": 3,
///   "deleted": true
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Non-positive id
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Unknown subscription
pub async fn remove(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> ApiResult<Json<DeleteResponse>> {
    state
        .service
        .delete_subscription(query.subscription_id)
        .await?;

    Ok(Json(DeleteResponse {
        subscription_id: query.subscription_id,
        deleted: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use chrono::TimeZone;

    #[test]
    fn test_create_success_responds_with_plain_ok() {
        let created = Subscription {
            subscription_id: 1,
            user_id: 7,
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
            subscription_type: "premium".to_string(),
        };

        let response = Json(created).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_delete_confirmation_body_and_status() {
        let confirmation = DeleteResponse {
            subscription_id: 3,
            deleted: true,
        };

        let json = serde_json::to_value(&confirmation).unwrap();
        assert_eq!(json["subscription_id"], 3);
        assert_eq!(json["deleted"], true);

        let response = Json(confirmation).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
