//! Properties of payment status derivation

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use skiclub::models::payment::PaymentStatus;
use skiclub::services::payment_status::{derive_status, effective_status, outstanding};

fn date(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap() + Duration::days(offset)
}

proptest! {
    #[test]
    fn fully_paid_is_paid_whatever_the_date(amount in 0i64..10_000_000, extra in 0i64..1_000_000, due in -400i64..400) {
        prop_assert_eq!(derive_status(amount, amount + extra, date(due), date(0)), PaymentStatus::Paid);
    }

    #[test]
    fn unpaid_before_due_is_pending(amount in 1i64..10_000_000, due in 0i64..400) {
        prop_assert_eq!(derive_status(amount, 0, date(due), date(0)), PaymentStatus::Pending);
    }

    #[test]
    fn partial_payment_tracks_due_date(amount in 2i64..10_000_000, paid_share in 1i64..100, due in -400i64..400) {
        let paid = (amount * paid_share / 100).clamp(1, amount - 1);
        let status = derive_status(amount, paid, date(due), date(0));

        if due < 0 {
            prop_assert_eq!(status, PaymentStatus::PartiallyPaidOverdue);
        } else {
            prop_assert_eq!(status, PaymentStatus::PartiallyPaid);
        }
    }

    #[test]
    fn overdue_only_after_due_date(amount in 1i64..10_000_000, paid in 0i64..10_000_000, due in -400i64..400) {
        let status = derive_status(amount, paid, date(due), date(0));
        if status.is_overdue() {
            prop_assert!(due < 0);
            prop_assert!(paid < amount);
        }
    }

    #[test]
    fn manual_statuses_are_sticky(amount in 1i64..10_000_000, paid in 0i64..10_000_000, due in -400i64..400) {
        for manual in [PaymentStatus::Cancelled, PaymentStatus::Waived] {
            prop_assert_eq!(effective_status(manual, amount, paid, date(due), date(0)), manual);
        }
    }

    #[test]
    fn outstanding_is_never_negative(amount in 0i64..10_000_000, paid in 0i64..20_000_000) {
        let left = outstanding(amount, paid);
        prop_assert!(left >= 0);
        prop_assert_eq!(left == 0, paid >= amount);
    }
}

#[test]
fn test_due_today_is_not_overdue() {
    assert_eq!(derive_status(50_000, 0, date(0), date(0)), PaymentStatus::Pending);
    assert_eq!(derive_status(50_000, 0, date(-1), date(0)), PaymentStatus::Overdue);
}
