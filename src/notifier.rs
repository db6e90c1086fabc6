use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{AppConfig, MailConfig};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("mail delivery exceeded {0:?}")]
    Timeout(Duration),
}

/// Outbound mail transport: one plain-text message, no delivery receipt.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> Result<Self, MailError> {
        let from: Mailbox = format!("Campus Portal <{}>", cfg.from).parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)?
            .port(cfg.smtp_port)
            .credentials(Credentials::new(cfg.from.clone(), cfg.password.clone()))
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        self.transport.send(email).await?;
        Ok(())
    }
}

/// Transactional emails of the portal, each bounded by the mail timeout.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    frontend_url: String,
    timeout: Duration,
}

impl Notifier {
    pub fn new(transport: Arc<dyn MailTransport>, frontend_url: &str, timeout: Duration) -> Self {
        Self {
            transport,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, MailError> {
        let smtp = Arc::new(SmtpMailer::new(&cfg.mail)?) as Arc<dyn MailTransport>;
        Ok(Self::new(smtp, &cfg.frontend_url, cfg.timeouts.mail))
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify_email?token={}", self.frontend_url, token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/change_password?token={}", self.frontend_url, token)
    }

    pub async fn send_verification(&self, email: &str, token: &str) -> Result<(), MailError> {
        let body = format!(
            "Click on the following link to verify your email: {}",
            self.verification_link(token)
        );
        self.send_plain(email, "Verify Your Email", &body).await
    }

    pub async fn send_password_reset(&self, email: &str, link: &str) -> Result<(), MailError> {
        let body = format!(
            "You have requested to reset your password. Click on the link below to set a new password:\n\
             {link}\n\n\
             If you did not request this, please ignore this email."
        );
        self.send_plain(email, "Password Reset Request", &body).await
    }

    pub async fn send_plain(&self, email: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let res = tokio::time::timeout(self.timeout, self.transport.send(email, subject, body))
            .await
            .map_err(|_| MailError::Timeout(self.timeout))
            .and_then(|r| r);
        match &res {
            Ok(()) => info!(to = %email, subject, "email sent"),
            Err(e) => warn!(to = %email, subject, error = %e, "email delivery failed"),
        }
        res
    }
}
