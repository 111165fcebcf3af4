//! Email service for reward redemption receipts.
//!
//! Sends through the Resend API when an API key is configured; otherwise the
//! receipt is logged and skipped.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Retry delays in seconds (exponential backoff: 1s, 4s, 16s)
const RETRY_DELAYS: &[u64] = &[1, 4, 16];

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Result of attempting to send an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailSendResult {
    Sent,
    /// No Resend API key configured
    NoApiKey,
}

/// Everything the redemption receipt shows.
#[derive(Debug, Clone)]
pub struct RedemptionReceipt {
    pub to_email: String,
    pub first_name: String,
    pub reward_title: String,
    pub points_spent: i64,
    pub previous_balance: i64,
    pub new_balance: i64,
}

impl RedemptionReceipt {
    fn subject(&self) -> String {
        format!("You redeemed {}", self.reward_title)
    }

    fn text(&self) -> String {
        format!(
            "Hi {},\n\nYou redeemed {} for {} points.\n\nPrevious balance: {} points\nNew balance: {} points\n\nThanks for using HousrCash.",
            self.first_name,
            self.reward_title,
            self.points_spent,
            self.previous_balance,
            self.new_balance
        )
    }

    fn html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; color: #333;">
<h2>Reward redeemed</h2>
<p>Hi {},</p>
<div style="background: #f5f5f5; padding: 20px; border-radius: 8px;">
<p style="margin: 0 0 8px 0;"><strong>{}</strong></p>
<p style="margin: 0;">Cost: {} points</p>
</div>
<table style="margin-top: 20px;">
<tr><td>Previous balance</td><td style="padding-left: 16px;">{} points</td></tr>
<tr><td>New balance</td><td style="padding-left: 16px;"><strong>{} points</strong></td></tr>
</table>
<hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">
<p style="color: #999; font-size: 12px;">Thanks for using HousrCash.</p>
</body>
</html>"#,
            html_escape(&self.first_name),
            html_escape(&self.reward_title),
            self.points_spent,
            self.previous_balance,
            self.new_balance
        )
    }
}

fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Resend API request body.
#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    text: String,
    html: String,
}

#[derive(Debug, Deserialize)]
struct ResendEmailResponse {
    id: String,
}

#[derive(Clone)]
pub struct EmailService {
    api_key: Option<String>,
    from_email: String,
    http_client: Client,
}

impl EmailService {
    pub fn new(api_key: Option<String>, from_email: String) -> Self {
        Self {
            api_key,
            from_email,
            http_client: Client::new(),
        }
    }

    /// A service that never sends (tests, local development).
    pub fn disabled() -> Self {
        Self::new(None, "HousrCash <rewards@housrcash.local>".to_string())
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn send_redemption_receipt(&self, receipt: &RedemptionReceipt) -> Result<EmailSendResult> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!(
                to = %receipt.to_email,
                reward = %receipt.reward_title,
                "No Resend API key configured, skipping redemption receipt"
            );
            return Ok(EmailSendResult::NoApiKey);
        };

        let request = ResendEmailRequest {
            from: &self.from_email,
            to: vec![&receipt.to_email],
            subject: receipt.subject(),
            text: receipt.text(),
            html: receipt.html(),
        };

        self.send_request_with_retry(api_key, &request, &receipt.to_email)
            .await
    }

    /// Deliver one receipt, backing off between attempts while Resend reports
    /// a transient failure.
    async fn send_request_with_retry(
        &self,
        api_key: &str,
        request: &ResendEmailRequest<'_>,
        to_email: &str,
    ) -> Result<EmailSendResult> {
        let mut delays = RETRY_DELAYS.iter();
        loop {
            let failure = match self.send_resend_request(api_key, request).await {
                Ok(resend_id) => {
                    tracing::info!(to = %to_email, %resend_id, "Redemption receipt delivered");
                    return Ok(EmailSendResult::Sent);
                }
                Err(SendFailure::Permanent(error)) => return Err(error),
                Err(SendFailure::Transient(error)) => error,
            };

            let Some(delay_secs) = delays.next() else {
                tracing::error!(to = %to_email, error = %failure, "Giving up on redemption receipt");
                return Err(failure);
            };
            tracing::warn!(to = %to_email, delay_secs, error = %failure, "Receipt delivery failed, backing off");
            tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
        }
    }

    /// POST a single email; returns the id Resend assigned to it.
    async fn send_resend_request(
        &self,
        api_key: &str,
        request: &ResendEmailRequest<'_>,
    ) -> std::result::Result<String, SendFailure> {
        let response = self
            .http_client
            .post(RESEND_API_URL)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| SendFailure::Transient(AppError::Internal(format!("Resend unreachable: {}", e))))?;

        let status = response.status();
        if status.is_success() {
            let sent: ResendEmailResponse = response.json().await.map_err(|e| {
                SendFailure::Permanent(AppError::Internal(format!("Unreadable Resend reply: {}", e)))
            })?;
            return Ok(sent.id);
        }

        let body = response.text().await.unwrap_or_default();
        let error = AppError::Internal(format!("Resend rejected receipt: {} {}", status, body));
        if is_retryable(status) {
            Err(SendFailure::Transient(error))
        } else {
            Err(SendFailure::Permanent(error))
        }
    }
}

enum SendFailure {
    /// Network trouble, 429 or 5xx
    Transient(AppError),
    Permanent(AppError),
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
