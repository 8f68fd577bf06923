use chrono::Duration;

use super::common::{build_ledger, dt};
use crate::workflows::events::TrustEvent;
use crate::workflows::ids::BrokerId;
use crate::workflows::reliability::domain::FlagStatus;
use crate::workflows::reliability::SECOND_FLAG_PENALTY_REASON;

#[test]
fn sequential_flags_level_up_and_deactivate_at_three() {
    let (ledger, flags, accounts, events) = build_ledger();
    let broker = BrokerId(1);
    let now = dt(7, 1);

    let first = ledger
        .apply_flag(broker, None, "late cancellation", now)
        .expect("first flag");
    let second = ledger
        .apply_flag(broker, None, "late cancellation", now + Duration::days(1))
        .expect("second flag");
    let third = ledger
        .apply_flag(broker, None, "late cancellation", now + Duration::days(2))
        .expect("third flag");

    assert_eq!(first.level, 1);
    assert_eq!(second.level, 2);
    assert_eq!(third.level, 3);
    assert_eq!(first.decays_at, now + Duration::days(90));

    // One penalty for the month of the second flag, then deactivation.
    let penalties = ledger.penalties_for(broker).expect("penalties");
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0].reason, SECOND_FLAG_PENALTY_REASON);
    assert_eq!(penalties[0].year, 2025);
    assert_eq!(penalties[0].month, 7);
    assert!(!accounts.is_active(broker));

    assert_eq!(flags.all_flags().len(), 3);
    assert!(events
        .events()
        .iter()
        .any(|event| matches!(event, TrustEvent::BrokerDeactivated { level: 3, .. })));
}

#[test]
fn repeated_second_level_in_one_month_keeps_a_single_penalty() {
    let (ledger, _flags, _accounts, _events) = build_ledger();
    let broker = BrokerId(1);

    // January: levels 1 and 2, one penalty for January.
    ledger
        .apply_flag(broker, None, "late cancellation", dt(1, 2))
        .expect("level 1");
    let second = ledger
        .apply_flag(broker, None, "late cancellation", dt(1, 20))
        .expect("level 2");
    assert_eq!(second.level, 2);

    // April: each January flag decays in turn, so the broker hits level 2
    // twice in the same calendar month. Only one April penalty may exist.
    let third = ledger
        .apply_flag(broker, None, "late cancellation", dt(4, 3))
        .expect("level 2 again");
    assert_eq!(third.level, 2);
    let fourth = ledger
        .apply_flag(broker, None, "late cancellation", dt(4, 21))
        .expect("level 2 a third time");
    assert_eq!(fourth.level, 2);

    let penalties = ledger.penalties_for(broker).expect("penalties");
    assert_eq!(penalties.len(), 2, "one row for January, one for April");
    assert!(penalties.iter().any(|penalty| penalty.month == 1));
    assert!(penalties.iter().any(|penalty| penalty.month == 4));
}

#[test]
fn decay_runs_before_leveling() {
    let (ledger, flags, _accounts, _events) = build_ledger();
    let broker = BrokerId(1);

    ledger
        .apply_flag(broker, None, "late cancellation", dt(1, 10))
        .expect("old flag");
    // 91 days later the old flag is past its window; the new one starts over
    // at level 1 instead of stacking to 2.
    let receipt = ledger
        .apply_flag(broker, None, "late cancellation", dt(1, 10) + Duration::days(91))
        .expect("new flag");
    assert_eq!(receipt.level, 1);

    let stored = flags.all_flags();
    assert_eq!(stored[0].status, FlagStatus::Decayed);
    assert_eq!(stored[1].status, FlagStatus::Active);
}

#[test]
fn flags_inside_the_window_still_count() {
    let (ledger, _flags, _accounts, _events) = build_ledger();
    let broker = BrokerId(1);

    ledger
        .apply_flag(broker, None, "late cancellation", dt(1, 10))
        .expect("recent flag");
    let receipt = ledger
        .apply_flag(broker, None, "late cancellation", dt(1, 10) + Duration::days(89))
        .expect("new flag");
    assert_eq!(receipt.level, 2);
}

#[test]
fn levels_are_tracked_per_broker() {
    let (ledger, _flags, accounts, _events) = build_ledger();

    ledger
        .apply_flag(BrokerId(1), None, "late cancellation", dt(7, 1))
        .expect("broker 1 flag");
    let receipt = ledger
        .apply_flag(BrokerId(2), None, "late cancellation", dt(7, 1))
        .expect("broker 2 flag");
    assert_eq!(receipt.level, 1);
    assert!(accounts.is_active(BrokerId(1)));
    assert!(accounts.is_active(BrokerId(2)));
}
