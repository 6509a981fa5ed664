//! Monthly pass allowance and PBIS point accounting

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{NewPbisTransaction, PbisReason, ResetOutcome, StudentPassData};
use crate::utils::errors::{Result, TeachersPetError};

/// Points charged for one extra pass
pub const PURCHASE_COST: i32 = 10;
/// Extra passes a student may buy per month
pub const PURCHASE_LIMIT: i32 = 2;
/// Points credited per unused pass at the monthly reset
pub const POINTS_PER_UNUSED_PASS: i32 = 5;
/// Largest single teacher award
pub const MAX_AWARD_POINTS: i32 = 1000;

pub fn total_allowance(data: &StudentPassData) -> i32 {
    data.monthly_pass_allowance + data.purchased_passes_this_month
}

pub fn remaining(data: &StudentPassData) -> i32 {
    total_allowance(data) - data.passes_used_this_month
}

pub fn can_purchase(data: &StudentPassData) -> bool {
    check_purchase(data).is_ok()
}

/// Points are checked before the monthly purchase limit
pub fn check_purchase(data: &StudentPassData) -> Result<()> {
    if data.pbis_points_balance < PURCHASE_COST {
        return Err(TeachersPetError::InsufficientPoints {
            balance: data.pbis_points_balance,
            cost: PURCHASE_COST,
        });
    }
    if data.purchased_passes_this_month >= PURCHASE_LIMIT {
        return Err(TeachersPetError::PurchaseLimitReached { limit: PURCHASE_LIMIT });
    }
    Ok(())
}

/// Debit the purchase cost and add one extra pass
pub fn apply_purchase(data: &mut StudentPassData, now: DateTime<Utc>) -> Result<NewPbisTransaction> {
    check_purchase(data)?;
    data.pbis_points_balance -= PURCHASE_COST;
    data.purchased_passes_this_month += 1;
    data.updated_at = now;

    Ok(NewPbisTransaction {
        student_name: data.student_name.clone(),
        student_email: data.student_email.clone(),
        points_delta: -PURCHASE_COST,
        reason: PbisReason::PassPurchase,
        description: format!(
            "Purchased extra pass {}/{}",
            data.purchased_passes_this_month, PURCHASE_LIMIT
        ),
    })
}

/// Count one allowance-funded pass
pub fn record_use(data: &mut StudentPassData, now: DateTime<Utc>) {
    data.passes_used_this_month += 1;
    data.updated_at = now;
}

/// Credit a teacher award
pub fn apply_award(data: &mut StudentPassData, points: i32, reason: &str, now: DateTime<Utc>) -> Result<NewPbisTransaction> {
    if points <= 0 {
        return Err(TeachersPetError::InvalidInput("Awarded points must be positive".to_string()));
    }
    if points > MAX_AWARD_POINTS {
        return Err(TeachersPetError::InvalidInput(format!(
            "At most {} points can be awarded at once",
            MAX_AWARD_POINTS
        )));
    }
    data.pbis_points_balance = data
        .pbis_points_balance
        .checked_add(points)
        .ok_or_else(|| TeachersPetError::InvalidInput("Points balance is at its maximum".to_string()))?;
    data.updated_at = now;

    Ok(NewPbisTransaction {
        student_name: data.student_name.clone(),
        student_email: data.student_email.clone(),
        points_delta: points,
        reason: PbisReason::TeacherAward,
        description: reason.to_string(),
    })
}

/// Close out the month: trade unused base passes for points and zero the counters.
///
/// Purchased passes are not traded in.
pub fn apply_monthly_reset(
    data: &mut StudentPassData,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> (ResetOutcome, Option<NewPbisTransaction>) {
    let unused = (data.monthly_pass_allowance - data.passes_used_this_month).max(0);
    let points = unused * POINTS_PER_UNUSED_PASS;

    data.pbis_points_balance = data.pbis_points_balance.saturating_add(points);
    data.unused_passes_last_month = unused;
    data.passes_used_this_month = 0;
    data.purchased_passes_this_month = 0;
    data.last_reset_date = today;
    data.updated_at = now;

    let transaction = (points > 0).then(|| NewPbisTransaction {
        student_name: data.student_name.clone(),
        student_email: data.student_email.clone(),
        points_delta: points,
        reason: PbisReason::UnusedPassTradeIn,
        description: format!("{} unused passes x {} points", unused, POINTS_PER_UNUSED_PASS),
    });

    let outcome = ResetOutcome {
        student_email: data.student_email.clone(),
        unused_passes: unused,
        points_credited: points,
    };
    (outcome, transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 31, 15, 0, 0).unwrap()
    }

    fn data(allowance: i32, used: i32, purchased: i32, balance: i32) -> StudentPassData {
        let mut data = crate::models::CreateStudentPassData {
            student_name: "Noah Kim".to_string(),
            student_email: "noah@school.org".to_string(),
            monthly_pass_allowance: allowance,
            last_reset_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
        .into_record(Uuid::new_v4(), now());
        data.passes_used_this_month = used;
        data.purchased_passes_this_month = purchased;
        data.pbis_points_balance = balance;
        data
    }

    #[test]
    fn test_remaining() {
        assert_eq!(remaining(&data(4, 1, 0, 0)), 3);
        assert_eq!(remaining(&data(4, 5, 2, 0)), 1);
        assert_eq!(total_allowance(&data(4, 0, 2, 0)), 6);
    }

    #[test]
    fn test_purchase_rejected_below_cost() {
        let mut d = data(4, 4, 0, 9);
        assert!(!can_purchase(&d));
        assert_matches!(
            apply_purchase(&mut d, now()),
            Err(TeachersPetError::InsufficientPoints { balance: 9, cost: 10 })
        );
        assert_eq!(d.pbis_points_balance, 9);
        assert_eq!(d.purchased_passes_this_month, 0);
    }

    #[test]
    fn test_purchase_rejected_at_limit() {
        let mut d = data(4, 4, 2, 50);
        assert_matches!(
            apply_purchase(&mut d, now()),
            Err(TeachersPetError::PurchaseLimitReached { limit: 2 })
        );
        assert_eq!(d.pbis_points_balance, 50);
    }

    #[test]
    fn test_purchase_debits_exactly_cost() {
        let mut d = data(4, 4, 1, 10);
        let tx = apply_purchase(&mut d, now()).unwrap();
        assert_eq!(d.pbis_points_balance, 0);
        assert_eq!(d.purchased_passes_this_month, 2);
        assert_eq!(remaining(&d), 2);
        assert_eq!(tx.points_delta, -10);
        assert_eq!(tx.reason, PbisReason::PassPurchase);
        assert_eq!(tx.description, "Purchased extra pass 2/2");
    }

    #[test]
    fn test_monthly_reset_credits_unused() {
        let mut d = data(4, 1, 1, 3);
        let today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let (outcome, tx) = apply_monthly_reset(&mut d, today, now());

        assert_eq!(outcome.unused_passes, 3);
        assert_eq!(outcome.points_credited, 15);
        assert_eq!(d.pbis_points_balance, 18);
        assert_eq!(d.passes_used_this_month, 0);
        assert_eq!(d.purchased_passes_this_month, 0);
        assert_eq!(d.unused_passes_last_month, 3);
        assert_eq!(d.last_reset_date, today);
        let tx = tx.unwrap();
        assert_eq!(tx.points_delta, 15);
        assert_eq!(tx.description, "3 unused passes x 5 points");
    }

    #[test]
    fn test_monthly_reset_overused_credits_nothing() {
        let mut d = data(4, 6, 2, 7);
        let (outcome, tx) = apply_monthly_reset(&mut d, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), now());
        assert_eq!(outcome.unused_passes, 0);
        assert_eq!(outcome.points_credited, 0);
        assert_eq!(d.pbis_points_balance, 7);
        assert!(tx.is_none());
    }

    #[test]
    fn test_award_requires_positive_points() {
        let mut d = data(4, 0, 0, 0);
        assert_matches!(apply_award(&mut d, 0, "helping", now()), Err(TeachersPetError::InvalidInput(_)));
        let tx = apply_award(&mut d, 5, "helping", now()).unwrap();
        assert_eq!(d.pbis_points_balance, 5);
        assert_eq!(tx.reason, PbisReason::TeacherAward);
    }

    #[test]
    fn test_award_is_capped_and_never_overflows() {
        let mut d = data(4, 0, 0, 5);
        assert_matches!(apply_award(&mut d, i32::MAX, "huge", now()), Err(TeachersPetError::InvalidInput(_)));
        assert_matches!(
            apply_award(&mut d, MAX_AWARD_POINTS + 1, "too many", now()),
            Err(TeachersPetError::InvalidInput(_))
        );
        assert_eq!(d.pbis_points_balance, 5);

        let mut full = data(4, 0, 0, i32::MAX - 10);
        assert_matches!(apply_award(&mut full, 11, "one too many", now()), Err(TeachersPetError::InvalidInput(_)));
        assert_eq!(full.pbis_points_balance, i32::MAX - 10);
        apply_award(&mut full, 10, "exactly full", now()).unwrap();
        assert_eq!(full.pbis_points_balance, i32::MAX);
    }
}
