use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub is_identity_verified: bool,

    // Lockout state; lock_until is a unix timestamp
    pub login_attempts: i32,
    pub lock_until: Option<i64>,

    // OTP state; otp_code holds a keyed digest, dates are YYYY-MM-DD (UTC)
    pub otp_code: Option<String>,
    pub otp_expires: Option<i64>,
    pub otp_attempts: i32,
    pub otp_send_count: i32,
    pub last_otp_sent_date: Option<String>,
    pub otp_resend_count: i32,
    pub last_resend_date: Option<String>,

    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::address::Entity")]
    Address,
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
