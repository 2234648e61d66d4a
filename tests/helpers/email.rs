//! In-memory email transport

use async_trait::async_trait;
use skiclub::services::{EmailSender, OutgoingEmail};
use skiclub::utils::errors::{EmailError, EmailResult};
use std::sync::Mutex;

/// Keeps every email it is asked to send; addresses in `failing` are refused
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: Vec<String>,
}

impl RecordingSender {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent().into_iter().map(|email| email.to).collect()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, email: &OutgoingEmail) -> EmailResult<()> {
        if self.failing.contains(&email.to) {
            return Err(EmailError::Api("mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
