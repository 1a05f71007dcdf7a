mod common;

use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use storefront_ledger::AppError;
use storefront_ledger::entities::{MemberStatus, loyalty_member_entity as members};
use storefront_ledger::models::{EnrollRequest, MemberTransactionQuery, Tier};
use storefront_ledger::services::LoyaltyService;

async fn enroll(service: &LoyaltyService, user_id: i64) {
    service
        .enroll(EnrollRequest {
            user_id,
            birthday: None,
            phone: Some("+15551234567".into()),
            marketing_opt_in: true,
        })
        .await
        .expect("enroll member");
}

async fn set_total_spent(db: &DatabaseConnection, user_id: i64, total_spent: i64) {
    members::Entity::update_many()
        .col_expr(members::Column::TotalSpent, Expr::value(total_spent))
        .filter(members::Column::UserId.eq(user_id))
        .exec(db)
        .await
        .unwrap();
}

async fn available(service: &LoyaltyService, user_id: i64) -> i64 {
    service
        .get_member(user_id, &MemberTransactionQuery { page: None, per_page: None })
        .await
        .unwrap()
        .member
        .available_points
}

#[tokio::test]
async fn test_enroll_grants_welcome_bonus_once() {
    let s = common::setup().await;
    enroll(&s.loyalty, 42).await;

    let detail = s
        .loyalty
        .get_member(42, &MemberTransactionQuery { page: None, per_page: None })
        .await
        .unwrap();
    assert_eq!(detail.member.available_points, 50);
    assert_eq!(detail.member.tier, Tier::Bronze);
    assert_eq!(detail.member.next_tier, Some(Tier::Silver));
    assert_eq!(detail.member.spend_to_next_tier, Some(50_000));
    assert_eq!(detail.transactions.total, 1);

    let again = s
        .loyalty
        .enroll(EnrollRequest {
            user_id: 42,
            birthday: None,
            phone: None,
            marketing_opt_in: false,
        })
        .await;
    assert!(matches!(again, Err(AppError::AlreadyEnrolled(_))));
}

#[tokio::test]
async fn test_purchase_crossing_into_gold() {
    let s = common::setup().await;
    enroll(&s.loyalty, 7).await;
    set_total_spent(&s.db, 7, 140_000).await;

    let accrual = s
        .loyalty
        .record_purchase(7, 9001, 20_000)
        .await
        .unwrap()
        .expect("purchase accrued");

    assert_eq!(accrual.tier_before, Tier::Silver);
    assert_eq!(accrual.tier_after, Tier::Gold);
    assert_eq!(accrual.total_spent, 160_000);
    assert_eq!(accrual.purchase_points, 14);
    assert_eq!(accrual.first_purchase_bonus, 50);
    assert_eq!(accrual.tier_up_bonus, 100);
    assert_eq!(accrual.total_awarded, 164);
    assert_eq!(accrual.available_points, 50 + 164);
    assert_eq!(s.loyalty.tier_of(accrual.total_spent), Tier::Gold);
}

#[tokio::test]
async fn test_same_order_accrues_once() {
    let s = common::setup().await;
    enroll(&s.loyalty, 7).await;

    let first = s.loyalty.record_purchase(7, 55, 20_000).await.unwrap();
    assert!(first.is_some());
    let before = available(&s.loyalty, 7).await;

    let again = s.loyalty.record_purchase(7, 55, 20_000).await.unwrap();
    assert!(again.is_none());
    assert_eq!(available(&s.loyalty, 7).await, before);
}

#[tokio::test]
async fn test_no_op_purchases_write_nothing() {
    let s = common::setup().await;
    enroll(&s.loyalty, 7).await;

    assert!(s.loyalty.record_purchase(999, 1, 20_000).await.unwrap().is_none());
    assert!(s.loyalty.record_purchase(7, 2, 0).await.unwrap().is_none());
    // 10 美分 × 3% 向下取整为 0 积分
    assert!(s.loyalty.record_purchase(7, 3, 10).await.unwrap().is_none());

    let detail = s
        .loyalty
        .get_member(7, &MemberTransactionQuery { page: None, per_page: None })
        .await
        .unwrap();
    assert_eq!(detail.member.total_spent, 0);
    assert_eq!(detail.member.available_points, 50);
    assert!(!detail.member.signup_bonus_given);
    assert_eq!(detail.transactions.total, 1);
}

#[tokio::test]
async fn test_first_purchase_bonus_rules() {
    let s = common::setup().await;

    // 金额不足时不发，之后的达标消费仍可获得
    enroll(&s.loyalty, 1).await;
    let small = s.loyalty.record_purchase(1, 10, 10_000).await.unwrap().unwrap();
    assert_eq!(small.purchase_points, 3);
    assert_eq!(small.first_purchase_bonus, 0);
    let big = s.loyalty.record_purchase(1, 11, 15_000).await.unwrap().unwrap();
    assert_eq!(big.first_purchase_bonus, 50);
    let later = s.loyalty.record_purchase(1, 12, 15_000).await.unwrap().unwrap();
    assert_eq!(later.first_purchase_bonus, 0);

    // 超过入会窗口不发
    enroll(&s.loyalty, 2).await;
    members::Entity::update_many()
        .col_expr(
            members::Column::JoinDate,
            Expr::value(Utc::now() - Duration::days(31)),
        )
        .filter(members::Column::UserId.eq(2))
        .exec(&s.db)
        .await
        .unwrap();
    let late = s.loyalty.record_purchase(2, 20, 20_000).await.unwrap().unwrap();
    assert_eq!(late.first_purchase_bonus, 0);
    assert_eq!(late.tier_up_bonus, 0);
    assert_eq!(late.purchase_points, 6);
}

#[tokio::test]
async fn test_redeem_points_bounds() {
    let s = common::setup().await;
    enroll(&s.loyalty, 5).await;

    let too_many = s.loyalty.redeem(5, 60, "checkout").await;
    assert!(matches!(too_many, Err(AppError::InsufficientBalance(_))));
    let member = s
        .loyalty
        .get_member(5, &MemberTransactionQuery { page: None, per_page: None })
        .await
        .unwrap()
        .member;
    assert_eq!(member.total_points, 50);
    assert_eq!(member.used_points, 0);
    let zero = s.loyalty.redeem(5, 0, "checkout").await;
    assert!(matches!(zero, Err(AppError::InvalidAmount(_))));
    let missing = s.loyalty.redeem(6, 10, "checkout").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let ok = s.loyalty.redeem(5, 30, "").await.unwrap();
    assert!(ok.success);
    assert_eq!(ok.available_points, 20);
    let all = s.loyalty.redeem(5, 20, "checkout").await.unwrap();
    assert_eq!(all.available_points, 0);
    let empty = s.loyalty.redeem(5, 1, "checkout").await;
    assert!(matches!(empty, Err(AppError::InsufficientBalance(_))));
}

#[tokio::test]
async fn test_inactive_member() {
    let s = common::setup().await;
    enroll(&s.loyalty, 8).await;

    let member = s
        .loyalty
        .set_status(8, MemberStatus::Inactive, Some(1))
        .await
        .unwrap();
    assert_eq!(member.status, MemberStatus::Inactive);

    let redeem = s.loyalty.redeem(8, 10, "checkout").await;
    assert!(matches!(redeem, Err(AppError::MemberInactive(_))));
    assert!(s.loyalty.record_purchase(8, 1, 50_000).await.unwrap().is_none());

    s.loyalty
        .set_status(8, MemberStatus::Active, Some(1))
        .await
        .unwrap();
    assert!(s.loyalty.record_purchase(8, 1, 50_000).await.unwrap().is_some());
}

#[tokio::test]
async fn test_purchase_amount_overflow_is_rejected() {
    let s = common::setup().await;
    enroll(&s.loyalty, 11).await;
    s.loyalty.record_purchase(11, 1, 20_000).await.unwrap();

    let query = MemberTransactionQuery { page: None, per_page: None };
    let before = s.loyalty.get_member(11, &query).await.unwrap();

    let r = s.loyalty.record_purchase(11, 2, i64::MAX).await;
    assert!(matches!(r, Err(AppError::InvalidAmount(_))));

    let after = s.loyalty.get_member(11, &query).await.unwrap();
    assert_eq!(after.member.total_spent, before.member.total_spent);
    assert_eq!(after.member.tier, before.member.tier);
    assert_eq!(after.member.total_points, before.member.total_points);
    assert_eq!(after.transactions.total, before.transactions.total);

    // 溢出的订单未被记为已结算
    assert!(s.loyalty.record_purchase(11, 2, 20_000).await.unwrap().is_some());
}

#[tokio::test]
async fn test_points_overflow_rolls_back_purchase() {
    let s = common::setup().await;
    enroll(&s.loyalty, 12).await;
    members::Entity::update_many()
        .col_expr(members::Column::TotalPoints, Expr::value(i64::MAX - 5))
        .filter(members::Column::UserId.eq(12))
        .exec(&s.db)
        .await
        .unwrap();

    let r = s.loyalty.record_purchase(12, 1, 20_000).await;
    assert!(matches!(r, Err(AppError::InvalidAmount(_))));

    let member = s
        .loyalty
        .get_member(12, &MemberTransactionQuery { page: None, per_page: None })
        .await
        .unwrap();
    assert_eq!(member.member.total_spent, 0);
    assert_eq!(member.member.total_points, i64::MAX - 5);
    assert_eq!(member.transactions.total, 1);

    let redeem = s.loyalty.redeem(12, i64::MAX, "checkout").await;
    assert!(matches!(redeem, Err(AppError::InsufficientBalance(_))));
}
