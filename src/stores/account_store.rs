use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Condition, Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::errors::internal::{AccountError, CredentialError};
use crate::policy::{AccountSnapshot, Role};
use crate::types::db::{account, address};
use crate::types::internal::account_security::{
    AccountSecurity, LOCK_DURATION_SECS, MAX_LOGIN_ATTEMPTS, OtpState,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fields needed to create an account; the password is already hashed
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

pub struct NewAddress {
    pub line1: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Repository for accounts, their security state and their addresses
///
/// Stateless; every method takes the connection or transaction to run on.
pub struct AccountStore;

impl AccountStore {
    pub fn new() -> Self {
        Self
    }

    /// Insert a new account with zeroed security counters
    ///
    /// # Errors
    /// * `CredentialError::DuplicateUsername` if the username is taken
    pub async fn create_account(
        &self,
        conn: &impl ConnectionTrait,
        new_account: NewAccount,
        now: DateTime<Utc>,
    ) -> Result<account::Model, InternalError> {
        if self.find_by_username(conn, &new_account.username).await?.is_some() {
            return Err(CredentialError::DuplicateUsername(new_account.username).into());
        }

        let timestamp = now.timestamp();
        let model = account::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            username: Set(new_account.username.clone()),
            password_hash: Set(new_account.password_hash),
            role: Set(new_account.role.as_str().to_string()),
            is_identity_verified: Set(false),
            login_attempts: Set(0),
            lock_until: Set(None),
            otp_code: Set(None),
            otp_expires: Set(None),
            otp_attempts: Set(0),
            otp_send_count: Set(0),
            last_otp_sent_date: Set(None),
            otp_resend_count: Set(0),
            last_resend_date: Set(None),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        model.insert(conn).await.map_err(|e| {
            // Lost a race against a concurrent registration
            if e.to_string().contains("UNIQUE") {
                InternalError::from(CredentialError::DuplicateUsername(new_account.username))
            } else {
                InternalError::database("create_account", e)
            }
        })
    }

    pub async fn find_by_username(
        &self,
        conn: &impl ConnectionTrait,
        username: &str,
    ) -> Result<Option<account::Model>, InternalError> {
        account::Entity::find()
            .filter(account::Column::Username.eq(username))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_account_by_username", e))
    }

    pub async fn get_by_username(
        &self,
        conn: &impl ConnectionTrait,
        username: &str,
    ) -> Result<account::Model, InternalError> {
        self.find_by_username(conn, username)
            .await?
            .ok_or_else(|| AccountError::UsernameNotFound(username.to_string()).into())
    }

    pub async fn get_by_id(
        &self,
        conn: &impl ConnectionTrait,
        account_id: &str,
    ) -> Result<account::Model, InternalError> {
        account::Entity::find_by_id(account_id.to_string())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_account_by_id", e))?
            .ok_or_else(|| AccountError::AccountNotFound(account_id.to_string()).into())
    }

    /// Apply one failed login in a single UPDATE and return the resulting state
    ///
    /// The CASE arms mirror `AccountSecurity::record_failed_login`: a stale lock
    /// resets attempts to 1 and clears the lock, otherwise attempts grow by one
    /// and crossing the threshold while unlocked sets `now + LOCK_DURATION`.
    /// Concurrent failures are each counted exactly once.
    pub async fn record_failed_login(
        &self,
        conn: &impl ConnectionTrait,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AccountSecurity, InternalError> {
        let now_ts = now.timestamp();

        let stale_lock = || {
            Condition::all()
                .add(Expr::col(account::Column::LockUntil).is_not_null())
                .add(Expr::col(account::Column::LockUntil).lte(now_ts))
        };

        let attempts: SimpleExpr = Expr::case(stale_lock(), 1)
            .finally(Expr::col(account::Column::LoginAttempts).add(1))
            .into();

        // SET expressions see the pre-update row, so the threshold compares
        // against the count before this attempt
        let lock_until: SimpleExpr = Expr::case(stale_lock(), Expr::val(Option::<i64>::None))
            .case(
                Condition::all()
                    .add(Expr::col(account::Column::LockUntil).is_null())
                    .add(Expr::col(account::Column::LoginAttempts).gte(MAX_LOGIN_ATTEMPTS as i64 - 1)),
                now_ts + LOCK_DURATION_SECS,
            )
            .finally(Expr::col(account::Column::LockUntil))
            .into();

        let result = account::Entity::update_many()
            .col_expr(account::Column::LoginAttempts, attempts)
            .col_expr(account::Column::LockUntil, lock_until)
            .col_expr(account::Column::UpdatedAt, Expr::value(now_ts))
            .filter(account::Column::Id.eq(account_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("record_failed_login", e))?;

        if result.rows_affected == 0 {
            return Err(AccountError::AccountNotFound(account_id.to_string()).into());
        }

        let model = self.get_by_id(conn, account_id).await?;
        security_from_model(&model)
    }

    /// Clear attempts and lock unconditionally
    pub async fn record_successful_login(
        &self,
        conn: &impl ConnectionTrait,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), InternalError> {
        let result = account::Entity::update_many()
            .col_expr(account::Column::LoginAttempts, Expr::value(0))
            .col_expr(account::Column::LockUntil, Expr::value(Option::<i64>::None))
            .col_expr(account::Column::UpdatedAt, Expr::value(now.timestamp()))
            .filter(account::Column::Id.eq(account_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("record_successful_login", e))?;

        if result.rows_affected == 0 {
            return Err(AccountError::AccountNotFound(account_id.to_string()).into());
        }

        Ok(())
    }

    /// Persist the OTP fields of an account
    ///
    /// Callers read, decide and write inside one transaction.
    pub async fn save_otp_state(
        &self,
        conn: &impl ConnectionTrait,
        account_id: &str,
        otp: &OtpState,
        now: DateTime<Utc>,
    ) -> Result<(), InternalError> {
        let result = account::Entity::update_many()
            .col_expr(account::Column::OtpCode, Expr::value(otp.code_digest.clone()))
            .col_expr(
                account::Column::OtpExpires,
                Expr::value(otp.expires.map(|expires| expires.timestamp())),
            )
            .col_expr(account::Column::OtpAttempts, Expr::value(otp.attempts as i32))
            .col_expr(account::Column::OtpSendCount, Expr::value(otp.send_count as i32))
            .col_expr(
                account::Column::LastOtpSentDate,
                Expr::value(otp.last_sent_date.map(format_date)),
            )
            .col_expr(account::Column::OtpResendCount, Expr::value(otp.resend_count as i32))
            .col_expr(
                account::Column::LastResendDate,
                Expr::value(otp.last_resend_date.map(format_date)),
            )
            .col_expr(account::Column::UpdatedAt, Expr::value(now.timestamp()))
            .filter(account::Column::Id.eq(account_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("save_otp_state", e))?;

        if result.rows_affected == 0 {
            return Err(AccountError::AccountNotFound(account_id.to_string()).into());
        }

        Ok(())
    }

    pub async fn set_identity_verified(
        &self,
        conn: &impl ConnectionTrait,
        account_id: &str,
        verified: bool,
        now: DateTime<Utc>,
    ) -> Result<account::Model, InternalError> {
        let model = self.get_by_id(conn, account_id).await?;

        let mut active: account::ActiveModel = model.into();
        active.is_identity_verified = Set(verified);
        active.updated_at = Set(now.timestamp());

        active
            .update(conn)
            .await
            .map_err(|e| InternalError::database("set_identity_verified", e))
    }

    pub async fn add_address(
        &self,
        conn: &impl ConnectionTrait,
        account_id: &str,
        new_address: NewAddress,
        now: DateTime<Utc>,
    ) -> Result<address::Model, InternalError> {
        // Surface a missing account as AccountNotFound rather than an FK failure
        self.get_by_id(conn, account_id).await?;

        let model = address::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            account_id: Set(account_id.to_string()),
            line1: Set(new_address.line1),
            city: Set(new_address.city),
            postal_code: Set(new_address.postal_code),
            country: Set(new_address.country),
            created_at: Set(now.timestamp()),
        };

        model
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("add_address", e))
    }

    pub async fn count_addresses(
        &self,
        conn: &impl ConnectionTrait,
        account_id: &str,
    ) -> Result<u64, InternalError> {
        address::Entity::find()
            .filter(address::Column::AccountId.eq(account_id))
            .count(conn)
            .await
            .map_err(|e| InternalError::database("count_addresses", e))
    }

    /// Requirement-relevant view of an account
    pub async fn snapshot(
        &self,
        conn: &impl ConnectionTrait,
        account_id: &str,
    ) -> Result<AccountSnapshot, InternalError> {
        let model = self.get_by_id(conn, account_id).await?;
        let address_count = self.count_addresses(conn, account_id).await?;

        Ok(AccountSnapshot {
            is_identity_verified: model.is_identity_verified,
            address_count,
        })
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the persisted security columns of an account
pub fn security_from_model(model: &account::Model) -> Result<AccountSecurity, InternalError> {
    Ok(AccountSecurity {
        login_attempts: to_count("login_attempts", model.login_attempts)?,
        lock_until: model.lock_until.map(parse_timestamp).transpose()?,
        otp: OtpState {
            code_digest: model.otp_code.clone(),
            expires: model.otp_expires.map(parse_timestamp).transpose()?,
            attempts: to_count("otp_attempts", model.otp_attempts)?,
            send_count: to_count("otp_send_count", model.otp_send_count)?,
            last_sent_date: model.last_otp_sent_date.as_deref().map(parse_date).transpose()?,
            resend_count: to_count("otp_resend_count", model.otp_resend_count)?,
            last_resend_date: model.last_resend_date.as_deref().map(parse_date).transpose()?,
        },
    })
}

/// Parse the stored role tag of an account
pub fn role_from_model(model: &account::Model) -> Result<Role, InternalError> {
    model
        .role
        .parse::<Role>()
        .map_err(|e| InternalError::parse("role", e.to_string()))
}

fn to_count(field: &str, value: i32) -> Result<u32, InternalError> {
    u32::try_from(value).map_err(|_| InternalError::parse(field, format!("negative counter {}", value)))
}

fn parse_timestamp(ts: i64) -> Result<DateTime<Utc>, InternalError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| InternalError::parse("timestamp", format!("out of range: {}", ts)))
}

fn parse_date(value: &str) -> Result<NaiveDate, InternalError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| InternalError::parse("date", format!("{}: {}", value, e)))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
