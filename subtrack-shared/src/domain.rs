/// Pure subscription date logic
///
/// This module contains the date-derived rules at the core of SubTrack,
/// free of any I/O so they can be tested exhaustively:
///
/// - [`is_active`]: date-window membership, inclusive on both ends
/// - [`remaining_days`]: whole days until the window closes (may be negative)
/// - [`check_active_precondition`]: the active-set gate applied before a
///   remaining-days query
///
/// All comparisons are date-truncated: the time-of-day component of the
/// stored timestamps is ignored, matching the calendar-date semantics of
/// the persisted windows.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use subtrack_shared::domain;
/// use subtrack_shared::models::subscription::Subscription;
///
/// let sub = Subscription {
///     subscription_id: 1,
///     user_id: 7,
///     start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     end_date: Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
///     subscription_type: "premium".to_string(),
/// };
///
/// let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert!(domain::is_active(&sub, today));
/// assert_eq!(domain::remaining_days(&sub, today), 16);
/// ```

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::subscription::Subscription;

/// Rejection reason from [`check_active_precondition`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    /// The active set is non-empty and does not contain the target
    #[error("subscription {0} is not active")]
    NotActive(i32),
}

/// Returns true when the subscription is active on the given date
///
/// A subscription is active on `on` iff
/// `start_date <= on <= end_date` after truncating both bounds to calendar
/// dates. Both ends are inclusive: a subscription is active on its start
/// date and still active on its end date.
pub fn is_active(subscription: &Subscription, on: NaiveDate) -> bool {
    let start = subscription.start_date.date_naive();
    let end = subscription.end_date.date_naive();
    start <= on && on <= end
}

/// Computes the whole days remaining until the subscription window closes
///
/// Equal to `end_date - today` in calendar days. The result is negative
/// when the subscription has already ended, and zero on the end date
/// itself.
///
/// The caller is responsible for resolving the subscription first; there is
/// no "absent" case at this layer.
pub fn remaining_days(subscription: &Subscription, today: NaiveDate) -> i64 {
    (subscription.end_date.date_naive() - today).num_days()
}

/// Applies the active-set gate used by the remaining-days query
///
/// Rejects when the active set is non-empty AND does not contain
/// `subscription_id`.
///
/// When the active set is empty the precondition passes unconditionally,
/// for any id, including ids that do not exist (existence is checked
/// separately by the caller). This mirrors the system's historical
/// behavior; see DESIGN.md before changing it.
pub fn check_active_precondition(
    subscription_id: i32,
    active: &[Subscription],
) -> Result<(), PreconditionError> {
    if !active.is_empty()
        && !active
            .iter()
            .any(|s| s.subscription_id == subscription_id)
    {
        return Err(PreconditionError::NotActive(subscription_id));
    }

    Ok(())
}
