use sea_orm_migration::prelude::*;

/// Gift Cards (预付礼品卡)
#[derive(DeriveIden)]
enum GiftCards {
    Table,
    Id,
    Code,
    InitialAmount,
    Balance,
    Currency,
    Status,
    ExpiresAt,
    AssignedTo,
    IssuedBy,
    OrderId,
    IssuedAt,
    UpdatedAt,
}

/// Promo Gifts (限时促销礼券)
#[derive(DeriveIden)]
enum PromoGifts {
    Table,
    Id,
    Token,
    Amount,
    Currency,
    MaxUses,
    TimesUsed,
    Status,
    ExpiresAt,
    Note,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

/// Loyalty Members (会员积分账户)
#[derive(DeriveIden)]
enum LoyaltyMembers {
    Table,
    Id,
    UserId,
    Status,
    TotalPoints,
    UsedPoints,
    TotalSpent,
    Birthday,
    Phone,
    MarketingOptIn,
    SignupBonusGiven,
    JoinDate,
    UpdatedAt,
}

/// Loyalty Transactions (积分流水, 只追加)
#[derive(DeriveIden)]
enum LoyaltyTransactions {
    Table,
    Id,
    MemberId,
    TransactionType,
    Points,
    Description,
    RelatedOrderId,
    CreatedAt,
}

/// Instrument Logs (审计日志, 只追加)
#[derive(DeriveIden)]
enum InstrumentLogs {
    Table,
    Id,
    InstrumentType,
    InstrumentId,
    Action,
    Amount,
    BalanceAfter,
    PerformedBy,
    RelatedOrderId,
    Note,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 时间戳统一由应用写入（不依赖数据库 NOW()），便于在 SQLite 上跑集成测试
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 礼品卡
        manager
            .create_table(
                Table::create()
                    .table(GiftCards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GiftCards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GiftCards::Code).string_len(32).not_null())
                    .col(
                        ColumnDef::new(GiftCards::InitialAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GiftCards::Balance).big_integer().not_null())
                    .col(ColumnDef::new(GiftCards::Currency).string_len(8).not_null())
                    .col(ColumnDef::new(GiftCards::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(GiftCards::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(GiftCards::AssignedTo).big_integer().null())
                    .col(ColumnDef::new(GiftCards::IssuedBy).big_integer().null())
                    .col(ColumnDef::new(GiftCards::OrderId).big_integer().null())
                    .col(
                        ColumnDef::new(GiftCards::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GiftCards::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_gift_cards_code_unique")
                    .table(GiftCards::Table)
                    .col(GiftCards::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 促销礼券
        manager
            .create_table(
                Table::create()
                    .table(PromoGifts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromoGifts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PromoGifts::Token).string_len(32).not_null())
                    .col(ColumnDef::new(PromoGifts::Amount).big_integer().not_null())
                    .col(ColumnDef::new(PromoGifts::Currency).string_len(8).not_null())
                    .col(ColumnDef::new(PromoGifts::MaxUses).integer().not_null())
                    .col(
                        ColumnDef::new(PromoGifts::TimesUsed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PromoGifts::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(PromoGifts::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PromoGifts::Note).text().null())
                    .col(ColumnDef::new(PromoGifts::CreatedBy).big_integer().null())
                    .col(
                        ColumnDef::new(PromoGifts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PromoGifts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_promo_gifts_token_unique")
                    .table(PromoGifts::Table)
                    .col(PromoGifts::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 会员积分账户（一个用户一行）
        manager
            .create_table(
                Table::create()
                    .table(LoyaltyMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoyaltyMembers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LoyaltyMembers::UserId).big_integer().not_null())
                    .col(ColumnDef::new(LoyaltyMembers::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(LoyaltyMembers::TotalPoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyMembers::UsedPoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyMembers::TotalSpent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(LoyaltyMembers::Birthday).date().null())
                    .col(ColumnDef::new(LoyaltyMembers::Phone).string_len(32).null())
                    .col(
                        ColumnDef::new(LoyaltyMembers::MarketingOptIn)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LoyaltyMembers::SignupBonusGiven)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LoyaltyMembers::JoinDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyMembers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_loyalty_members_user_unique")
                    .table(LoyaltyMembers::Table)
                    .col(LoyaltyMembers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 积分流水
        manager
            .create_table(
                Table::create()
                    .table(LoyaltyTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoyaltyTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::MemberId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::Points)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::Description)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::RelatedOrderId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loyalty_transactions_member")
                            .from(LoyaltyTransactions::Table, LoyaltyTransactions::MemberId)
                            .to(LoyaltyMembers::Table, LoyaltyMembers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_loyalty_transactions_member")
                    .table(LoyaltyTransactions::Table)
                    .col(LoyaltyTransactions::MemberId)
                    .to_owned(),
            )
            .await?;

        // 审计日志（所有凭证共用）
        manager
            .create_table(
                Table::create()
                    .table(InstrumentLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InstrumentLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InstrumentLogs::InstrumentType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstrumentLogs::InstrumentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InstrumentLogs::Action).string_len(32).not_null())
                    .col(ColumnDef::new(InstrumentLogs::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(InstrumentLogs::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InstrumentLogs::PerformedBy).big_integer().null())
                    .col(
                        ColumnDef::new(InstrumentLogs::RelatedOrderId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(InstrumentLogs::Note).text().null())
                    .col(
                        ColumnDef::new(InstrumentLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_instrument_logs_instrument")
                    .table(InstrumentLogs::Table)
                    .col(InstrumentLogs::InstrumentType)
                    .col(InstrumentLogs::InstrumentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InstrumentLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoyaltyTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoyaltyMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PromoGifts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GiftCards::Table).to_owned())
            .await?;
        Ok(())
    }
}
