use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Accounts::Role).string().not_null())
                    .col(ColumnDef::new(Accounts::IsIdentityVerified).boolean().not_null().default(false))
                    // Lockout counters
                    .col(ColumnDef::new(Accounts::LoginAttempts).integer().not_null().default(0))
                    .col(ColumnDef::new(Accounts::LockUntil).big_integer().null())
                    // OTP state and daily throttling counters
                    .col(ColumnDef::new(Accounts::OtpCode).string().null())
                    .col(ColumnDef::new(Accounts::OtpExpires).big_integer().null())
                    .col(ColumnDef::new(Accounts::OtpAttempts).integer().not_null().default(0))
                    .col(ColumnDef::new(Accounts::OtpSendCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Accounts::LastOtpSentDate).string().null())
                    .col(ColumnDef::new(Accounts::OtpResendCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Accounts::LastResendDate).string().null())
                    .col(ColumnDef::new(Accounts::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_role")
                    .table(Accounts::Table)
                    .col(Accounts::Role)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Accounts {
    Table,
    Id,
    Username,
    PasswordHash,
    Role,
    IsIdentityVerified,
    LoginAttempts,
    LockUntil,
    OtpCode,
    OtpExpires,
    OtpAttempts,
    OtpSendCount,
    LastOtpSentDate,
    OtpResendCount,
    LastResendDate,
    CreatedAt,
    UpdatedAt,
}
