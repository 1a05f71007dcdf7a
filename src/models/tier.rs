//! 会员等级表与等级计算
//!
//! 等级不落库，每次读取时由累计消费 `total_spent` 推导。

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 会员等级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Bronze => write!(f, "bronze"),
            Tier::Silver => write!(f, "silver"),
            Tier::Gold => write!(f, "gold"),
            Tier::Platinum => write!(f, "platinum"),
        }
    }
}

/// 等级门槛
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TierRule {
    pub tier: Tier,
    /// 累计消费门槛(美分)，达到或超过即进入该等级
    pub min_spent: i64,
    /// 积分比例 (basis points): 每 1 单位货币可得 earn_rate_bp / 10000 积分
    pub earn_rate_bp: i64,
}

/// 有序等级表（按 min_spent 升序）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TierSchedule(Vec<TierRule>);

impl Default for TierSchedule {
    fn default() -> Self {
        Self(vec![
            TierRule { tier: Tier::Bronze, min_spent: 0, earn_rate_bp: 300 },
            TierRule { tier: Tier::Silver, min_spent: 50_000, earn_rate_bp: 500 },
            TierRule { tier: Tier::Gold, min_spent: 150_000, earn_rate_bp: 700 },
            TierRule { tier: Tier::Platinum, min_spent: 500_000, earn_rate_bp: 1000 },
        ])
    }
}

impl TierSchedule {
    pub fn new(rules: Vec<TierRule>) -> Result<Self, String> {
        let schedule = Self(rules);
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn rules(&self) -> &[TierRule] {
        &self.0
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("tier table must not be empty".to_string());
        }
        for pair in self.0.windows(2) {
            if pair[0].min_spent >= pair[1].min_spent {
                return Err(format!(
                    "tier table must be strictly ascending: {} ({}) >= {} ({})",
                    pair[0].tier, pair[0].min_spent, pair[1].tier, pair[1].min_spent
                ));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for rule in &self.0 {
            if !seen.insert(rule.tier) {
                return Err(format!("tier {} appears more than once", rule.tier));
            }
            if rule.earn_rate_bp < 0 {
                return Err(format!("tier {} has a negative earn rate", rule.tier));
            }
        }
        Ok(())
    }

    /// 门槛不大于消费额的最高一档；低于所有门槛时落到最低档
    pub fn rule_for(&self, total_spent: i64) -> &TierRule {
        self.0
            .iter()
            .rev()
            .find(|rule| total_spent >= rule.min_spent)
            .unwrap_or(&self.0[0])
    }

    pub fn tier_of(&self, total_spent: i64) -> Tier {
        self.rule_for(total_spent).tier
    }

    pub fn earn_rate_bp(&self, tier: Tier) -> i64 {
        self.0
            .iter()
            .find(|rule| rule.tier == tier)
            .map(|rule| rule.earn_rate_bp)
            .unwrap_or(0)
    }

    /// 下一档（已是最高档时为 None）
    pub fn next_rule(&self, total_spent: i64) -> Option<&TierRule> {
        self.0.iter().find(|rule| rule.min_spent > total_spent)
    }

    /// floor(amount × rate)；amount 为美分，rate 为 bp
    pub fn points_for(&self, tier: Tier, amount: i64) -> i64 {
        if amount <= 0 {
            return 0;
        }
        let rate = self.earn_rate_bp(tier) as i128;
        i64::try_from(amount as i128 * rate / 1_000_000).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let s = TierSchedule::default();
        assert_eq!(s.tier_of(0), Tier::Bronze);
        assert_eq!(s.tier_of(49_999), Tier::Bronze);
        assert_eq!(s.tier_of(50_000), Tier::Silver);
        assert_eq!(s.tier_of(149_900), Tier::Silver);
        assert_eq!(s.tier_of(150_000), Tier::Gold);
        assert_eq!(s.tier_of(99_999_900), Tier::Platinum);
    }

    #[test]
    fn test_tier_is_deterministic() {
        let s = TierSchedule::default();
        for spent in [0, 149_900, 150_000, 777_777] {
            assert_eq!(s.tier_of(spent), s.tier_of(spent));
        }
    }

    #[test]
    fn test_negative_spend_falls_to_lowest_tier() {
        let s = TierSchedule::default();
        assert_eq!(s.tier_of(-1), Tier::Bronze);
    }

    #[test]
    fn test_points_floor() {
        let s = TierSchedule::default();
        // $200 @ gold 0.07 = 14
        assert_eq!(s.points_for(Tier::Gold, 20_000), 14);
        // $199.99 @ gold = 13.9993 -> 13
        assert_eq!(s.points_for(Tier::Gold, 19_999), 13);
        assert_eq!(s.points_for(Tier::Bronze, 0), 0);
        assert_eq!(s.points_for(Tier::Bronze, 99), 0);
    }

    #[test]
    fn test_points_for_extreme_amount() {
        let s = TierSchedule::default();
        assert_eq!(s.points_for(Tier::Platinum, i64::MAX), i64::MAX / 1000);
        assert_eq!(s.points_for(Tier::Gold, i64::MIN), 0);
    }

    #[test]
    fn test_next_rule() {
        let s = TierSchedule::default();
        assert_eq!(s.next_rule(0).map(|r| r.tier), Some(Tier::Silver));
        assert_eq!(s.next_rule(150_000).map(|r| r.tier), Some(Tier::Platinum));
        assert!(s.next_rule(500_000).is_none());
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        assert!(TierSchedule::new(vec![]).is_err());
        assert!(
            TierSchedule::new(vec![
                TierRule { tier: Tier::Silver, min_spent: 100, earn_rate_bp: 500 },
                TierRule { tier: Tier::Bronze, min_spent: 0, earn_rate_bp: 300 },
            ])
            .is_err()
        );
        assert!(
            TierSchedule::new(vec![
                TierRule { tier: Tier::Bronze, min_spent: 0, earn_rate_bp: 300 },
                TierRule { tier: Tier::Bronze, min_spent: 10, earn_rate_bp: 300 },
            ])
            .is_err()
        );
    }

    #[test]
    fn test_alternate_schedule() {
        let s = TierSchedule::new(vec![
            TierRule { tier: Tier::Bronze, min_spent: 0, earn_rate_bp: 10_000 },
            TierRule { tier: Tier::Platinum, min_spent: 1_000, earn_rate_bp: 20_000 },
        ])
        .unwrap();
        assert_eq!(s.tier_of(999), Tier::Bronze);
        assert_eq!(s.tier_of(1_000), Tier::Platinum);
        assert_eq!(s.points_for(Tier::Platinum, 1_000), 20);
        assert_eq!(s.earn_rate_bp(Tier::Gold), 0);
    }
}
