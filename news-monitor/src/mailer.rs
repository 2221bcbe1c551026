use crate::config::{MailConfig, MailCredentials};
use crate::traits::DigestSender;
use crate::types::{MonitorError, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info};

/// Sends the digest as multipart/alternative over SMTP with STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    smtp_server: String,
    smtp_port: u16,
    credentials: MailCredentials,
}

impl SmtpMailer {
    /// `None` when mail credentials are not configured.
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        let credentials = config.credentials.clone()?;
        Some(Self {
            smtp_server: config.smtp_server.clone(),
            smtp_port: config.smtp_port,
            credentials,
        })
    }

    pub fn build_message(&self, subject: &str, html: &str, text: &str) -> Result<Message> {
        let from: Mailbox = self
            .credentials
            .username
            .parse()
            .map_err(|e| MonitorError::Mail(format!("Invalid from address: {}", e)))?;
        let to: Mailbox = self
            .credentials
            .recipient
            .parse()
            .map_err(|e| MonitorError::Mail(format!("Invalid recipient address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text.to_string(), html.to_string()))
            .map_err(|e| MonitorError::Mail(format!("Failed to build email: {}", e)))
    }

    fn deliver(&self, message: Message) -> Result<()> {
        let creds = Credentials::new(
            self.credentials.username.clone(),
            self.credentials.password.clone(),
        );

        let transport = SmtpTransport::starttls_relay(&self.smtp_server)
            .map_err(|e| MonitorError::Mail(format!("SMTP relay error: {}", e)))?
            .port(self.smtp_port)
            .credentials(creds)
            .build();

        transport
            .send(&message)
            .map_err(|e| MonitorError::Mail(format!("SMTP send failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl DigestSender for SmtpMailer {
    async fn send(&self, subject: &str, html: &str, text: &str) -> bool {
        let message = match self.build_message(subject, html, text) {
            Ok(message) => message,
            Err(e) => {
                error!("Error sending email: {}", e);
                return false;
            }
        };

        let mailer = self.clone();
        let outcome = tokio::task::spawn_blocking(move || mailer.deliver(message)).await;

        match outcome {
            Ok(Ok(())) => {
                info!("Email sent to {} ({})", self.credentials.recipient, subject);
                true
            }
            Ok(Err(e)) => {
                error!("Error sending email: {}", e);
                false
            }
            Err(e) => {
                error!("Email task failed: {}", e);
                false
            }
        }
    }
}
