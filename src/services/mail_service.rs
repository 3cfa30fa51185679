// Outbound mail through an HTTP relay. Delivery internals are the relay's
// problem; this client only knows how to hand a message over.
use crate::utils::ApiError;
use serde::Serialize;
use std::env;

#[derive(Clone)]
struct MailConfig {
    api_url: String,
    api_key: String,
    from: String,
}

/// Mail relay client. An unconfigured mailer is a value, not a startup
/// failure: endpoints that need it report a 500 instead of crashing.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    config: Option<MailConfig>,
}

#[derive(Debug, Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

impl Mailer {
    pub fn from_env() -> Self {
        let config = match (env::var("MAIL_API_URL"), env::var("MAIL_API_KEY")) {
            (Ok(api_url), Ok(api_key)) => Some(MailConfig {
                api_url,
                api_key,
                from: env::var("MAIL_FROM")
                    .unwrap_or_else(|_| "no-reply@clubhub.dev".to_string()),
            }),
            _ => None,
        };

        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    pub async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), ApiError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ApiError::Internal("Mail transport is not configured".to_string()))?;

        let mail = OutgoingMail {
            from: &config.from,
            to,
            subject: "Your verification code",
            text: format!(
                "Your verification code is {}. It expires in 10 minutes.",
                code
            ),
        };

        let response = self
            .client
            .post(&config.api_url)
            .bearer_auth(&config.api_key)
            .json(&mail)
            .send()
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to send mail: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Internal(format!(
                "Mail relay returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> Mailer {
        Mailer {
            client: reqwest::Client::new(),
            config: None,
        }
    }

    #[tokio::test]
    async fn unconfigured_mailer_reports_internal_error() {
        let mailer = unconfigured();
        assert!(!mailer.is_configured());
        let err = mailer
            .send_verification_code("a@x.com", "123456")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "internal_error");
    }
}
