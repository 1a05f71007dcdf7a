//! 后台定时任务。
//!
//! 启动时调用一次 `spawn_all`。查询与兑换路径本身会修正过期状态，
//! 这里只是让长期无人访问的卡券也能及时落库为 expired。

use crate::services::{GiftCardService, PromoGiftService};
use std::time::Duration;

/// 执行一轮过期扫描，返回 (礼品卡, 促销券) 修正数量
pub async fn sweep_expired(
    gift_card_service: &GiftCardService,
    promo_gift_service: &PromoGiftService,
) -> (u64, u64) {
    let cards = match gift_card_service.expire_overdue().await {
        Ok(n) => n,
        Err(e) => {
            log::error!("Failed to expire gift cards: {e:?}");
            0
        }
    };
    let promos = match promo_gift_service.expire_overdue().await {
        Ok(n) => n,
        Err(e) => {
            log::error!("Failed to expire promo gifts: {e:?}");
            0
        }
    };
    (cards, promos)
}

/// Spawn all background tasks. Detached via `tokio::spawn`, does not block.
pub fn spawn_all(
    gift_card_service: GiftCardService,
    promo_gift_service: PromoGiftService,
    sweep_interval_secs: u64,
) {
    tokio::spawn(async move {
        loop {
            match sweep_expired(&gift_card_service, &promo_gift_service).await {
                (0, 0) => {}
                (cards, promos) => {
                    log::info!("Expiry sweep: gift_cards={cards} promo_gifts={promos}")
                }
            }
            tokio::time::sleep(Duration::from_secs(sweep_interval_secs)).await;
        }
    });
}
