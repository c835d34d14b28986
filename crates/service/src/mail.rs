//! Outbound mail. The only mail this system sends is the address
//! verification message during registration.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("mail error: {0}")]
pub struct MailError(pub String);

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Delivers through an HTTP mail API (sendgrid-style JSON POST with a
/// bearer key).
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let payload = serde_json::json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "text": body,
        });
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(MailError(format!("mail API returned {}", resp.status())));
        }
        Ok(())
    }
}

/// Dev fallback: logs the message instead of sending it.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        info!(to, subject, "mail suppressed (no mail endpoint configured)");
        Ok(())
    }
}

/// Recording mock for tests and doc examples.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String, String)>>,
        fail: AtomicBool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            let m = Self::default();
            m.fail.store(true, Ordering::SeqCst);
            m
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MailError("simulated send failure".into()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), body.to_string()));
            Ok(())
        }
    }
}
