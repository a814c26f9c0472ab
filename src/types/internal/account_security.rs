use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// Failed logins tolerated before the account is locked
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Fixed lock duration in seconds (2 hours, not progressive)
pub const LOCK_DURATION_SECS: i64 = 2 * 60 * 60;

/// Lifetime of an issued OTP in seconds
pub const OTP_TTL_SECS: i64 = 10 * 60;

/// Number of digits in an OTP
pub const OTP_LENGTH: usize = 6;

/// Issuances (first send or resend) allowed per UTC calendar day
pub const MAX_OTP_SENDS_PER_DAY: u32 = 5;

/// Resends allowed per UTC calendar day
pub const MAX_OTP_RESENDS_PER_DAY: u32 = 3;

/// Wrong verifications tolerated before the current OTP is invalidated
pub const MAX_OTP_ATTEMPTS: u32 = 5;

pub fn lock_duration() -> TimeDelta {
    TimeDelta::seconds(LOCK_DURATION_SECS)
}

pub fn otp_ttl() -> TimeDelta {
    TimeDelta::seconds(OTP_TTL_SECS)
}

/// Login lockout and OTP state of a single account
///
/// All transitions take the current time explicitly so they are total and
/// deterministic. `is_locked` is derived on every call and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSecurity {
    pub login_attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
    pub otp: OtpState,
}

impl AccountSecurity {
    /// True iff a lock is set and ends strictly after `now`
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    /// Apply one failed login attempt
    ///
    /// An expired lock is forgiven: attempts restart at 1 and the lock is
    /// cleared. Otherwise attempts grow by one, and reaching
    /// `MAX_LOGIN_ATTEMPTS` while unlocked sets a lock of `lock_duration()`.
    /// An active lock is never extended.
    pub fn record_failed_login(&mut self, now: DateTime<Utc>) {
        if self.lock_until.is_some_and(|until| until <= now) {
            self.login_attempts = 1;
            self.lock_until = None;
            return;
        }

        self.login_attempts = self.login_attempts.saturating_add(1);
        if self.login_attempts >= MAX_LOGIN_ATTEMPTS && self.lock_until.is_none() {
            self.lock_until = Some(now + lock_duration());
        }
    }

    /// Clear attempts and lock unconditionally
    pub fn record_successful_login(&mut self) {
        self.login_attempts = 0;
        self.lock_until = None;
    }
}

/// Kind of OTP issuance being requested or performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpIssueKind {
    Send,
    Resend,
}

impl OtpIssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpIssueKind::Send => "send",
            OtpIssueKind::Resend => "resend",
        }
    }
}

/// Why an OTP issuance was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpDenial {
    DailySendLimit,
    DailyResendLimit,
}

impl OtpDenial {
    pub fn message(&self) -> &'static str {
        match self {
            OtpDenial::DailySendLimit => "Daily OTP limit reached. Try again tomorrow",
            OtpDenial::DailyResendLimit => "Daily OTP resend limit reached. Try again tomorrow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpIssueDecision {
    Allowed(OtpIssueKind),
    Denied(OtpDenial),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerifyOutcome {
    Verified,
    /// Wrong code; the OTP stays valid for `remaining_attempts` more tries
    Mismatch { remaining_attempts: u32 },
    /// Wrong code on the last allowed attempt, or a code already used up
    Exhausted,
    Expired,
    NoActiveCode,
}

impl OtpVerifyOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, OtpVerifyOutcome::Verified)
    }
}

/// OTP fields of an account
///
/// `code_digest` is a keyed digest of the code, never the code itself.
/// Daily counters belong to the date stored next to them and read as zero
/// once that date is not today.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpState {
    pub code_digest: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub attempts: u32,
    pub send_count: u32,
    pub last_sent_date: Option<NaiveDate>,
    pub resend_count: u32,
    pub last_resend_date: Option<NaiveDate>,
}

impl OtpState {
    pub fn has_active_code(&self, now: DateTime<Utc>) -> bool {
        self.code_digest.is_some() && self.expires.is_some_and(|expires| expires > now)
    }

    pub fn sends_on(&self, day: NaiveDate) -> u32 {
        if self.last_sent_date == Some(day) {
            self.send_count
        } else {
            0
        }
    }

    pub fn resends_on(&self, day: NaiveDate) -> u32 {
        if self.last_resend_date == Some(day) {
            self.resend_count
        } else {
            0
        }
    }

    /// Decide whether an OTP may be issued now
    ///
    /// A resend without an outstanding code is treated as a first send.
    pub fn decide_issue(&self, requested: OtpIssueKind, now: DateTime<Utc>) -> OtpIssueDecision {
        let today = now.date_naive();
        let kind = match requested {
            OtpIssueKind::Resend if self.has_active_code(now) => OtpIssueKind::Resend,
            _ => OtpIssueKind::Send,
        };

        if kind == OtpIssueKind::Resend && self.resends_on(today) >= MAX_OTP_RESENDS_PER_DAY {
            return OtpIssueDecision::Denied(OtpDenial::DailyResendLimit);
        }
        if self.sends_on(today) >= MAX_OTP_SENDS_PER_DAY {
            return OtpIssueDecision::Denied(OtpDenial::DailySendLimit);
        }

        OtpIssueDecision::Allowed(kind)
    }

    /// Store a freshly issued code and bump today's counters
    pub fn record_issue(&mut self, code_digest: String, kind: OtpIssueKind, now: DateTime<Utc>) {
        let today = now.date_naive();

        self.code_digest = Some(code_digest);
        self.expires = Some(now + otp_ttl());
        self.attempts = 0;

        self.send_count = self.sends_on(today) + 1;
        self.last_sent_date = Some(today);

        if kind == OtpIssueKind::Resend {
            self.resend_count = self.resends_on(today) + 1;
            self.last_resend_date = Some(today);
        }
    }

    /// Check a submitted code against the outstanding OTP
    ///
    /// `matches` compares the stored digest with the submitted code. Success
    /// and exhaustion both clear the code; expiry clears it as well.
    pub fn verify(&mut self, now: DateTime<Utc>, matches: impl FnOnce(&str) -> bool) -> OtpVerifyOutcome {
        let Some(digest) = self.code_digest.clone() else {
            return OtpVerifyOutcome::NoActiveCode;
        };

        if !self.expires.is_some_and(|expires| expires > now) {
            self.clear_code();
            return OtpVerifyOutcome::Expired;
        }

        if self.attempts >= MAX_OTP_ATTEMPTS {
            self.clear_code();
            return OtpVerifyOutcome::Exhausted;
        }

        if matches(&digest) {
            self.clear_code();
            return OtpVerifyOutcome::Verified;
        }

        self.attempts += 1;
        if self.attempts >= MAX_OTP_ATTEMPTS {
            self.clear_code();
            OtpVerifyOutcome::Exhausted
        } else {
            OtpVerifyOutcome::Mismatch {
                remaining_attempts: MAX_OTP_ATTEMPTS - self.attempts,
            }
        }
    }

    fn clear_code(&mut self) {
        self.code_digest = None;
        self.expires = None;
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_is_locked_boundaries() {
        let mut security = AccountSecurity::default();
        assert!(!security.is_locked(now()));

        security.lock_until = Some(now() - TimeDelta::seconds(1));
        assert!(!security.is_locked(now()));

        security.lock_until = Some(now());
        assert!(!security.is_locked(now()), "lock ending exactly now is not active");

        security.lock_until = Some(now() + TimeDelta::seconds(1));
        assert!(security.is_locked(now()));
    }

    #[test]
    fn test_fifth_failure_locks_for_two_hours() {
        let mut security = AccountSecurity {
            login_attempts: 4,
            ..Default::default()
        };

        security.record_failed_login(now());

        assert_eq!(security.login_attempts, 5);
        assert_eq!(security.lock_until, Some(now() + TimeDelta::hours(2)));
        assert!(security.is_locked(now()));
    }

    #[test]
    fn test_failures_below_threshold_do_not_lock() {
        let mut security = AccountSecurity::default();
        for expected in 1..MAX_LOGIN_ATTEMPTS {
            security.record_failed_login(now());
            assert_eq!(security.login_attempts, expected);
            assert_eq!(security.lock_until, None);
        }
    }

    #[test]
    fn test_stale_lock_is_forgiven_not_extended() {
        let mut security = AccountSecurity {
            login_attempts: 17,
            lock_until: Some(now() - TimeDelta::minutes(5)),
            ..Default::default()
        };

        security.record_failed_login(now());

        assert_eq!(security.login_attempts, 1);
        assert_eq!(security.lock_until, None);
    }

    #[test]
    fn test_active_lock_is_not_extended() {
        let until = now() + TimeDelta::minutes(30);
        let mut security = AccountSecurity {
            login_attempts: 5,
            lock_until: Some(until),
            ..Default::default()
        };

        security.record_failed_login(now());

        assert_eq!(security.login_attempts, 6);
        assert_eq!(security.lock_until, Some(until));
    }

    #[test]
    fn test_successful_login_clears_everything() {
        let mut security = AccountSecurity {
            login_attempts: 9,
            lock_until: Some(now() + TimeDelta::hours(1)),
            ..Default::default()
        };

        security.record_successful_login();

        assert_eq!(security.login_attempts, 0);
        assert_eq!(security.lock_until, None);
        assert!(!security.is_locked(now()));
    }

    #[test]
    fn test_first_send_is_allowed_and_counted() {
        let mut otp = OtpState::default();

        assert_eq!(
            otp.decide_issue(OtpIssueKind::Send, now()),
            OtpIssueDecision::Allowed(OtpIssueKind::Send)
        );
        otp.record_issue("digest".to_string(), OtpIssueKind::Send, now());

        assert_eq!(otp.sends_on(now().date_naive()), 1);
        assert_eq!(otp.resends_on(now().date_naive()), 0);
        assert_eq!(otp.expires, Some(now() + TimeDelta::minutes(10)));
        assert!(otp.has_active_code(now()));
    }

    #[test]
    fn test_daily_send_cap() {
        let mut otp = OtpState::default();
        for _ in 0..MAX_OTP_SENDS_PER_DAY {
            assert!(matches!(
                otp.decide_issue(OtpIssueKind::Send, now()),
                OtpIssueDecision::Allowed(_)
            ));
            otp.record_issue("digest".to_string(), OtpIssueKind::Send, now());
        }

        assert_eq!(
            otp.decide_issue(OtpIssueKind::Send, now()),
            OtpIssueDecision::Denied(OtpDenial::DailySendLimit)
        );
    }

    #[test]
    fn test_counters_reset_on_a_new_day() {
        let mut otp = OtpState::default();
        for _ in 0..MAX_OTP_SENDS_PER_DAY {
            otp.record_issue("digest".to_string(), OtpIssueKind::Send, now());
        }

        let tomorrow = now() + TimeDelta::days(1);
        assert_eq!(otp.sends_on(tomorrow.date_naive()), 0);
        assert_eq!(
            otp.decide_issue(OtpIssueKind::Send, tomorrow),
            OtpIssueDecision::Allowed(OtpIssueKind::Send)
        );

        otp.record_issue("digest".to_string(), OtpIssueKind::Send, tomorrow);
        assert_eq!(otp.send_count, 1);
    }

    #[test]
    fn test_resend_cap() {
        let mut otp = OtpState::default();
        otp.record_issue("digest".to_string(), OtpIssueKind::Send, now());

        for _ in 0..MAX_OTP_RESENDS_PER_DAY {
            assert_eq!(
                otp.decide_issue(OtpIssueKind::Resend, now()),
                OtpIssueDecision::Allowed(OtpIssueKind::Resend)
            );
            otp.record_issue("digest".to_string(), OtpIssueKind::Resend, now());
        }

        assert_eq!(otp.resend_count, MAX_OTP_RESENDS_PER_DAY);
        assert_eq!(otp.send_count, MAX_OTP_RESENDS_PER_DAY + 1);
        assert_eq!(
            otp.decide_issue(OtpIssueKind::Resend, now()),
            OtpIssueDecision::Denied(OtpDenial::DailyResendLimit)
        );
    }

    #[test]
    fn test_resend_without_active_code_is_a_send() {
        let otp = OtpState::default();
        assert_eq!(
            otp.decide_issue(OtpIssueKind::Resend, now()),
            OtpIssueDecision::Allowed(OtpIssueKind::Send)
        );
    }

    #[test]
    fn test_verify_success_clears_code() {
        let mut otp = OtpState::default();
        otp.record_issue("digest".to_string(), OtpIssueKind::Send, now());

        let outcome = otp.verify(now(), |stored| stored == "digest");

        assert_eq!(outcome, OtpVerifyOutcome::Verified);
        assert_eq!(otp.code_digest, None);
        assert_eq!(otp.expires, None);
        assert_eq!(otp.attempts, 0);
    }

    #[test]
    fn test_verify_mismatch_counts_down_then_exhausts() {
        let mut otp = OtpState::default();
        otp.record_issue("digest".to_string(), OtpIssueKind::Send, now());

        for used in 1..MAX_OTP_ATTEMPTS {
            assert_eq!(
                otp.verify(now(), |_| false),
                OtpVerifyOutcome::Mismatch {
                    remaining_attempts: MAX_OTP_ATTEMPTS - used
                }
            );
        }

        assert_eq!(otp.verify(now(), |_| false), OtpVerifyOutcome::Exhausted);
        assert_eq!(otp.code_digest, None);
        // The right code no longer helps once the OTP is gone
        assert_eq!(otp.verify(now(), |_| true), OtpVerifyOutcome::NoActiveCode);
    }

    #[test]
    fn test_verify_expired_code() {
        let mut otp = OtpState::default();
        otp.record_issue("digest".to_string(), OtpIssueKind::Send, now());

        let later = now() + otp_ttl();
        assert_eq!(otp.verify(later, |_| true), OtpVerifyOutcome::Expired);
        assert!(!otp.has_active_code(later));
    }
}
