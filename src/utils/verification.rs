// In-memory verification codes for password reset and email verification.
// Injected via web::Data rather than held as a process global so the whole
// map can be swapped for a shared store without touching call sites.
use rand::Rng;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Codes are single-use and expire after this window.
const CODE_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug)]
struct PendingCode {
    code: String,
    issued_at: Instant,
}

/// Mapping from normalized email to its pending 6-digit code.
///
/// Lost on restart and not shared across instances; fine for a single-instance
/// deployment.
pub struct VerificationCodes {
    codes: RwLock<HashMap<String, PendingCode>>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl VerificationCodes {
    pub fn new() -> Self {
        Self {
            codes: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a fresh 6-digit code for the email, overwriting any pending
    /// code. The last issued code is the only valid one.
    pub fn issue(&self, email: &str) -> String {
        let code = format!("{}", rand::thread_rng().gen_range(100_000..=999_999));
        let mut codes = match self.codes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        codes.insert(
            normalize_email(email),
            PendingCode {
                code: code.clone(),
                issued_at: Instant::now(),
            },
        );
        code
    }

    /// Exact-match check. Consumes the entry on success; a wrong code leaves
    /// the pending entry in place. Expired entries are dropped on sight.
    pub fn verify(&self, email: &str, code: &str) -> bool {
        self.verify_at(email, code, Instant::now())
    }

    fn verify_at(&self, email: &str, code: &str, now: Instant) -> bool {
        let key = normalize_email(email);
        let mut codes = match self.codes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match codes.get(&key) {
            Some(pending) if now.duration_since(pending.issued_at) > CODE_TTL => {
                codes.remove(&key);
                false
            }
            Some(pending) if pending.code == code => {
                codes.remove(&key);
                true
            }
            _ => false,
        }
    }
}

impl Default for VerificationCodes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_code_is_six_digits() {
        let codes = VerificationCodes::new();
        let code = codes.issue("a@x.com");
        assert_eq!(code.len(), 6);
        let n: u32 = code.parse().unwrap();
        assert!((100_000..=999_999).contains(&n));
    }

    #[test]
    fn verify_is_single_use() {
        let codes = VerificationCodes::new();
        let code = codes.issue("a@x.com");
        assert!(codes.verify("a@x.com", &code));
        assert!(!codes.verify("a@x.com", &code));
    }

    #[test]
    fn wrong_code_does_not_consume() {
        let codes = VerificationCodes::new();
        let code = codes.issue("a@x.com");
        assert!(!codes.verify("a@x.com", "000000"));
        assert!(codes.verify("a@x.com", &code));
    }

    #[test]
    fn reissue_overwrites_previous_code() {
        let codes = VerificationCodes::new();
        let first = codes.issue("a@x.com");
        let second = codes.issue("a@x.com");
        if first != second {
            assert!(!codes.verify("a@x.com", &first));
        }
        assert!(codes.verify("a@x.com", &second));
    }

    #[test]
    fn email_is_normalized() {
        let codes = VerificationCodes::new();
        let code = codes.issue("  Alice@Example.COM ");
        assert!(codes.verify("alice@example.com", &code));
    }

    #[test]
    fn expired_code_is_rejected() {
        let codes = VerificationCodes::new();
        let code = codes.issue("a@x.com");
        let later = Instant::now() + CODE_TTL + Duration::from_secs(1);
        assert!(!codes.verify_at("a@x.com", &code, later));
        // the expired entry was dropped, not left behind
        assert!(!codes.verify("a@x.com", &code));
    }

    #[test]
    fn codes_are_scoped_per_email() {
        let codes = VerificationCodes::new();
        let a = codes.issue("a@x.com");
        codes.issue("b@x.com");
        assert!(codes.verify("a@x.com", &a));
        // a's entry was consumed; a second verify must fail
        assert!(!codes.verify("a@x.com", &a));
    }
}
