mod common;

use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use storefront_ledger::AppError;
use storefront_ledger::entities::{
    GiftCardStatus, LogAction, gift_card_entity as gift_cards,
};
use storefront_ledger::models::{
    GiftCardRedeemOutcome, GiftCardResponse, IssueGiftCardRequest, RedeemGiftCardResponse,
};
use storefront_ledger::services::GiftCardService;

async fn issue(service: &GiftCardService, amount: i64) -> GiftCardResponse {
    service
        .issue(
            IssueGiftCardRequest {
                amount,
                currency: None,
                expires_at: Some(Utc::now() + Duration::days(30)),
                assigned_to: None,
            },
            Some(1),
        )
        .await
        .expect("issue gift card")
}

/// 审计日志中 redeemed + partial_redeemed 的合计
async fn redeemed_total(service: &GiftCardService, code: &str) -> i64 {
    service
        .logs(code)
        .await
        .unwrap()
        .iter()
        .filter(|e| matches!(e.action, LogAction::Redeemed | LogAction::PartialRedeemed))
        .map(|e| e.amount)
        .sum()
}

async fn expire_now(db: &sea_orm::DatabaseConnection, id: i64) {
    gift_cards::Entity::update_many()
        .col_expr(
            gift_cards::Column::ExpiresAt,
            Expr::value(Utc::now() - Duration::seconds(1)),
        )
        .filter(gift_cards::Column::Id.eq(id))
        .exec(db)
        .await
        .expect("move expiry into the past");
}

#[tokio::test]
async fn test_issue_and_inspect() {
    let s = common::setup().await;
    let card = issue(&s.gift_cards, 5000).await;

    assert!(card.code.starts_with("GC-"));
    assert_eq!(card.code.len(), 11);
    assert_eq!(card.balance, 5000);
    assert_eq!(card.currency, "USD");
    assert_eq!(card.status, GiftCardStatus::Active);

    // 大小写与空白不敏感
    let view = s
        .gift_cards
        .inspect(&format!("  {}  ", card.code.to_lowercase()))
        .await
        .unwrap();
    assert_eq!(view.balance, 5000);
    assert_eq!(view.status, GiftCardStatus::Active);
    assert!(!view.is_expired);
}

#[tokio::test]
async fn test_issue_rejects_bad_input() {
    let s = common::setup().await;
    let zero = s
        .gift_cards
        .issue(
            IssueGiftCardRequest {
                amount: 0,
                currency: None,
                expires_at: None,
                assigned_to: None,
            },
            None,
        )
        .await;
    assert!(matches!(zero, Err(AppError::InvalidAmount(_))));

    let past = s
        .gift_cards
        .issue(
            IssueGiftCardRequest {
                amount: 100,
                currency: None,
                expires_at: Some(Utc::now() - Duration::hours(1)),
                assigned_to: None,
            },
            None,
        )
        .await;
    assert!(matches!(past, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn test_partial_then_full_redeem_conserves_value() {
    let s = common::setup().await;
    let card = issue(&s.gift_cards, 5000).await;

    let first = s
        .gift_cards
        .redeem(&card.code, Some(3000), Some(101), Some(2))
        .await
        .unwrap();
    let GiftCardRedeemOutcome::Committed(first) = first else {
        panic!("expected a committed redemption");
    };
    assert_eq!(first.applied, 3000);
    assert_eq!(first.balance_after, 2000);
    assert_eq!(first.status, GiftCardStatus::Active);

    // 请求额超过余额时只扣余额
    let second = s
        .gift_cards
        .redeem(&card.code, Some(9999), Some(102), Some(2))
        .await
        .unwrap();
    let GiftCardRedeemOutcome::Committed(second) = second else {
        panic!("expected a committed redemption");
    };
    assert_eq!(second.applied, 2000);
    assert_eq!(second.balance_after, 0);
    assert_eq!(second.status, GiftCardStatus::Used);

    let third = s
        .gift_cards
        .redeem(&card.code, None, Some(103), Some(2))
        .await;
    assert!(matches!(third, Err(AppError::AlreadyUsed(_))));

    assert_eq!(redeemed_total(&s.gift_cards, &card.code).await, card.initial_amount);

    let entries = s.gift_cards.logs(&card.code).await.unwrap();
    let actions: Vec<LogAction> = entries.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            LogAction::Issued,
            LogAction::PartialRedeemed,
            LogAction::Redeemed
        ]
    );
}

#[tokio::test]
async fn test_preview_never_mutates() {
    let s = common::setup().await;
    let card = issue(&s.gift_cards, 5000).await;

    for _ in 0..3 {
        let quote = s.gift_cards.quote(&card.code, Some(1200)).await.unwrap();
        assert_eq!(quote.applied(), 1200);
        assert_eq!(quote.balance(), 5000);
    }
    let outcome = s
        .gift_cards
        .redeem(&card.code, None, None, Some(2))
        .await
        .unwrap();
    assert!(matches!(outcome, GiftCardRedeemOutcome::Preview(ref q) if q.applied() == 5000));
    let resp = RedeemGiftCardResponse::from(outcome);
    assert!(!resp.committed);
    assert_eq!(resp.status, GiftCardStatus::Active);
    assert_eq!(resp.order_id, None);

    // 超大请求额按余额封顶
    let capped = s.gift_cards.quote(&card.code, Some(i64::MAX)).await.unwrap();
    assert_eq!(capped.applied(), 5000);

    let view = s.gift_cards.inspect(&card.code).await.unwrap();
    assert_eq!(view.balance, 5000);
    assert_eq!(view.status, GiftCardStatus::Active);
    assert_eq!(s.gift_cards.logs(&card.code).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_commit_quote_recomputes_against_current_balance() {
    let s = common::setup().await;
    let card = issue(&s.gift_cards, 5000).await;

    let stale = s.gift_cards.quote(&card.code, Some(4000)).await.unwrap();
    s.gift_cards
        .redeem(&card.code, Some(3000), Some(1), None)
        .await
        .unwrap();

    let committed = s.gift_cards.commit(stale, 2, None).await.unwrap();
    assert_eq!(committed.applied, 2000);
    assert_eq!(committed.balance_after, 0);
    assert_eq!(committed.status, GiftCardStatus::Used);
}

#[tokio::test]
async fn test_same_order_is_charged_once() {
    let s = common::setup().await;
    let card = issue(&s.gift_cards, 5000).await;

    let quote = s.gift_cards.quote(&card.code, Some(1000)).await.unwrap();
    let first = s.gift_cards.commit(quote.clone(), 77, None).await.unwrap();
    let again = s.gift_cards.commit(quote, 77, None).await.unwrap();

    assert!(!first.replayed);
    assert!(again.replayed);
    assert_eq!(again.applied, 1000);
    assert_eq!(again.balance_after, 4000);

    let view = s.gift_cards.inspect(&card.code).await.unwrap();
    assert_eq!(view.balance, 4000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_redeems_never_overdraw() {
    let s = common::setup().await;
    let card = issue(&s.gift_cards, 5000).await;

    let mut handles = Vec::new();
    for order_id in 1..=10 {
        let service = s.gift_cards.clone();
        let code = card.code.clone();
        handles.push(tokio::spawn(async move {
            service
                .redeem(&code, Some(1000), Some(order_id), None)
                .await
        }));
    }

    let mut succeeded = 0;
    let mut already_used = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(GiftCardRedeemOutcome::Committed(r)) => {
                assert_eq!(r.applied, 1000);
                succeeded += 1;
            }
            Err(AppError::AlreadyUsed(_)) => already_used += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(succeeded, 5);
    assert_eq!(already_used, 5);

    let view = s.gift_cards.inspect(&card.code).await.unwrap();
    assert_eq!(view.balance, 0);
    assert_eq!(view.status, GiftCardStatus::Used);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_balance_redeems_have_one_winner() {
    let s = common::setup().await;
    let card = issue(&s.gift_cards, 2500).await;

    let handles: Vec<_> = (1..=6)
        .map(|order_id| {
            let service = s.gift_cards.clone();
            let code = card.code.clone();
            tokio::spawn(async move { service.redeem(&code, None, Some(order_id), None).await })
        })
        .collect();

    let mut winners = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(GiftCardRedeemOutcome::Committed(r)) => {
                assert_eq!(r.applied, 2500);
                winners += 1;
            }
            Err(AppError::AlreadyUsed(_)) | Err(AppError::InsufficientBalance(_)) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(winners, 1);

    assert_eq!(redeemed_total(&s.gift_cards, &card.code).await, 2500);
}

#[tokio::test]
async fn test_expired_card_is_rejected_and_logged_once() {
    let s = common::setup().await;
    let card = issue(&s.gift_cards, 5000).await;
    expire_now(&s.db, card.id).await;

    let preview = s.gift_cards.quote(&card.code, None).await;
    assert!(matches!(preview, Err(AppError::Expired(_))));

    let commit = s
        .gift_cards
        .redeem(&card.code, None, Some(9), None)
        .await;
    assert!(matches!(commit, Err(AppError::Expired(_))));

    let view = s.gift_cards.inspect(&card.code).await.unwrap();
    assert_eq!(view.status, GiftCardStatus::Expired);
    assert!(view.is_expired);
    assert_eq!(view.balance, 5000);
    s.gift_cards.inspect(&card.code).await.unwrap();

    let expired_logs = s
        .gift_cards
        .logs(&card.code)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.action == LogAction::Expired)
        .count();
    assert_eq!(expired_logs, 1);

    // 存储状态已是 expired 时依旧返回 Expired
    let again = s
        .gift_cards
        .redeem(&card.code, None, Some(10), None)
        .await;
    assert!(matches!(again, Err(AppError::Expired(_))));
}

#[tokio::test]
async fn test_expire_overdue_sweeps_untouched_cards() {
    let s = common::setup().await;
    let stale = issue(&s.gift_cards, 1000).await;
    let fresh = issue(&s.gift_cards, 1000).await;
    expire_now(&s.db, stale.id).await;

    assert_eq!(s.gift_cards.expire_overdue().await.unwrap(), 1);
    assert_eq!(s.gift_cards.expire_overdue().await.unwrap(), 0);

    let row = gift_cards::Entity::find_by_id(stale.id)
        .one(&s.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, GiftCardStatus::Expired);
    let row = gift_cards::Entity::find_by_id(fresh.id)
        .one(&s.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, GiftCardStatus::Active);
}

#[tokio::test]
async fn test_cancelled_card_is_not_active() {
    let s = common::setup().await;
    let card = issue(&s.gift_cards, 5000).await;

    let cancelled = s
        .gift_cards
        .cancel(&card.code, Some(1), Some("fraud".into()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, GiftCardStatus::Cancelled);

    let redeem = s.gift_cards.redeem(&card.code, None, Some(5), None).await;
    assert!(matches!(redeem, Err(AppError::NotActive(_))));
    let twice = s.gift_cards.cancel(&card.code, Some(1), None).await;
    assert!(matches!(twice, Err(AppError::NotActive(_))));
}

#[tokio::test]
async fn test_wrong_prefix_and_unknown_codes() {
    let s = common::setup().await;

    let wrong = s.gift_cards.inspect("pg-abcdefgh").await;
    assert!(matches!(wrong, Err(AppError::WrongInstrumentType(_))));
    let wrong = s.gift_cards.redeem("PG-ABCDEFGH", None, Some(1), None).await;
    assert!(matches!(wrong, Err(AppError::WrongInstrumentType(_))));

    let missing = s.gift_cards.inspect("GC-NOPENOPE").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_invalid_amount_to_apply() {
    let s = common::setup().await;
    let card = issue(&s.gift_cards, 5000).await;

    let zero = s.gift_cards.quote(&card.code, Some(0)).await;
    assert!(matches!(zero, Err(AppError::InvalidAmount(_))));
    let negative = s
        .gift_cards
        .redeem(&card.code, Some(-5), Some(1), None)
        .await;
    assert!(matches!(negative, Err(AppError::InvalidAmount(_))));
}
