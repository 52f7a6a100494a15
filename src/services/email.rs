//! Email service for account notifications

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send the password reset token
    pub async fn send_password_reset(&self, to: &str, token: &str, valid_minutes: i64) -> AppResult<()> {
        let subject = "Reset your Ticketing password";
        let body = format!(
            r#"
We received a request to reset the password of your account.

Your reset token is: {token}

It expires in {minutes} minutes. If you did not ask for a reset, you can ignore this email.
"#,
            token = token,
            minutes = valid_minutes
        );

        self.send_email(to, subject, &body).await
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> AppResult<Message> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Ticketing");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                "<html><body><p>{}</p></body></html>",
                                body.trim().replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    }

    fn transport(&self) -> AppResult<SmtpTransport> {
        let builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let builder = match (&self.config.smtp_username, &self.config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(builder.build())
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        if !self.config.enabled {
            tracing::info!("Email disabled, not sending \"{}\" to {}", subject, to);
            return Ok(());
        }

        let email = self.build_message(to, subject, body)?;
        let mailer = self.transport()?;

        // SmtpTransport is blocking
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        tracing::info!("Sent \"{}\" to {}", subject, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_email_is_a_no_op() {
        let service = EmailService::new(EmailConfig::default());
        assert!(!service.is_enabled());
        tokio_test::assert_ok!(
            service
                .send_password_reset("jane@example.com", "abc123", 30)
                .await
        );
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let service = EmailService::new(EmailConfig::default());
        assert!(service.build_message("not an address", "Hi", "body").is_err());
        assert!(service.build_message("jane@example.com", "Hi", "body").is_ok());
    }
}
