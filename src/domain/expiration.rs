//! Expiration evaluation for links.
//!
//! The persisted `status` is a cache that is only refreshed on the click path
//! and on settings updates, so readers always combine it with a live
//! evaluation of the policy: a link is expired if `status == expired` OR the
//! policy is currently satisfied. Never trust the cached flag alone.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::entities::{ExpirationPolicy, ExpirationType, LinkStatus};
use crate::error::AppError;

/// Returns true if the policy alone retires the link.
///
/// - `None` never expires by policy.
/// - `DateTime(at)` expires strictly after `at`.
/// - `Clicks(n)` expires once `total_clicks >= n`.
pub fn policy_satisfied(policy: &ExpirationPolicy, total_clicks: i64, now: DateTime<Utc>) -> bool {
    match *policy {
        ExpirationPolicy::None => false,
        ExpirationPolicy::DateTime(at) => now > at,
        ExpirationPolicy::Clicks(limit) => total_clicks >= limit,
    }
}

/// Two-layer check: cached flag OR live recompute.
pub fn is_expired(
    status: LinkStatus,
    policy: &ExpirationPolicy,
    total_clicks: i64,
    now: DateTime<Utc>,
) -> bool {
    status == LinkStatus::Expired || policy_satisfied(policy, total_clicks, now)
}

/// Status to persist after a policy write.
///
/// A write must never store an already-satisfied policy as `active`.
pub fn status_for(policy: &ExpirationPolicy, total_clicks: i64, now: DateTime<Utc>) -> LinkStatus {
    if policy_satisfied(policy, total_clicks, now) {
        LinkStatus::Expired
    } else {
        LinkStatus::Active
    }
}

/// Builds a policy from its wire parts, keeping only the bound the type selects.
///
/// # Errors
///
/// Returns [`AppError::Validation`] when the selected bound is missing or when
/// a click bound is below 1.
pub fn build_policy(
    kind: ExpirationType,
    expires_at: Option<DateTime<Utc>>,
    expire_after_clicks: Option<i64>,
) -> Result<ExpirationPolicy, AppError> {
    match kind {
        ExpirationType::None => Ok(ExpirationPolicy::None),
        ExpirationType::DateTime => expires_at.map(ExpirationPolicy::DateTime).ok_or_else(|| {
            AppError::bad_request(
                "expiresAt is required for datetime expiration",
                json!({ "field": "expiresAt" }),
            )
        }),
        ExpirationType::Clicks => match expire_after_clicks {
            Some(n) if n >= 1 => Ok(ExpirationPolicy::Clicks(n)),
            Some(n) => Err(AppError::bad_request(
                "expireAfterClicks must be at least 1",
                json!({ "field": "expireAfterClicks", "value": n }),
            )),
            None => Err(AppError::bad_request(
                "expireAfterClicks is required for click-count expiration",
                json!({ "field": "expireAfterClicks" }),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_none_never_expires() {
        let now = Utc::now();
        assert!(!policy_satisfied(&ExpirationPolicy::None, i64::MAX, now));
        assert!(is_expired(
            LinkStatus::Expired,
            &ExpirationPolicy::None,
            0,
            now
        ));
    }

    #[test]
    fn test_datetime_is_strictly_after() {
        let now = Utc::now();
        assert!(!policy_satisfied(&ExpirationPolicy::DateTime(now), 0, now));
        assert!(policy_satisfied(
            &ExpirationPolicy::DateTime(now - Duration::milliseconds(1)),
            0,
            now
        ));
        assert!(!policy_satisfied(
            &ExpirationPolicy::DateTime(now + Duration::days(1)),
            0,
            now
        ));
    }

    #[test]
    fn test_clicks_bound_is_inclusive() {
        let now = Utc::now();
        let policy = ExpirationPolicy::Clicks(3);
        assert!(!policy_satisfied(&policy, 2, now));
        assert!(policy_satisfied(&policy, 3, now));
        assert!(policy_satisfied(&policy, 4, now));
    }

    #[test]
    fn test_live_recompute_overrides_stale_active_flag() {
        let now = Utc::now();
        assert!(is_expired(
            LinkStatus::Active,
            &ExpirationPolicy::Clicks(1),
            1,
            now
        ));
    }

    #[test]
    fn test_status_for_past_datetime_is_expired() {
        let now = Utc::now();
        let past = ExpirationPolicy::DateTime(now - Duration::hours(1));
        assert_eq!(status_for(&past, 0, now), LinkStatus::Expired);

        let future = ExpirationPolicy::DateTime(now + Duration::hours(1));
        assert_eq!(status_for(&future, 0, now), LinkStatus::Active);

        assert_eq!(
            status_for(&ExpirationPolicy::Clicks(5), 7, now),
            LinkStatus::Expired
        );
        assert_eq!(
            status_for(&ExpirationPolicy::None, 7, now),
            LinkStatus::Active
        );
    }

    #[test]
    fn test_build_policy_keeps_only_selected_bound() {
        let at = Utc::now();
        let policy = build_policy(ExpirationType::Clicks, Some(at), Some(2)).unwrap();
        assert_eq!(policy, ExpirationPolicy::Clicks(2));

        let policy = build_policy(ExpirationType::DateTime, Some(at), Some(2)).unwrap();
        assert_eq!(policy, ExpirationPolicy::DateTime(at));

        let policy = build_policy(ExpirationType::None, Some(at), Some(2)).unwrap();
        assert_eq!(policy, ExpirationPolicy::None);
    }

    #[test]
    fn test_build_policy_rejects_missing_or_invalid_bounds() {
        assert!(build_policy(ExpirationType::DateTime, None, None).is_err());
        assert!(build_policy(ExpirationType::Clicks, None, None).is_err());
        assert!(build_policy(ExpirationType::Clicks, None, Some(0)).is_err());
        assert!(build_policy(ExpirationType::Clicks, None, Some(-4)).is_err());
    }
}
