//! Email service for booking confirmations.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.
//! Sending is best-effort: callers dispatch it on a detached task and a
//! failure never changes the booking outcome already returned to the
//! customer.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the booking confirmation email.
#[derive(Template)]
#[template(path = "email/booking_confirmation.html")]
struct BookingConfirmationHtml<'a> {
    name: &'a str,
    queue_number: u32,
}

/// Plain text template for the booking confirmation email.
#[derive(Template)]
#[template(path = "email/booking_confirmation.txt")]
struct BookingConfirmationText<'a> {
    name: &'a str,
    queue_number: u32,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a booking confirmation carrying the customer's queue number.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_booking_confirmation(
        &self,
        to: &str,
        name: &str,
        queue_number: u32,
    ) -> Result<(), EmailError> {
        let html = BookingConfirmationHtml { name, queue_number }.render()?;
        let text = BookingConfirmationText { name, queue_number }.render()?;

        self.send_multipart_email(
            to,
            &format!("Your appointment is booked - queue number {queue_number}"),
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_templates_render_queue_number() {
        let html = BookingConfirmationHtml {
            name: "Aisha",
            queue_number: 7,
        }
        .render()
        .expect("html template renders");
        let text = BookingConfirmationText {
            name: "Aisha",
            queue_number: 7,
        }
        .render()
        .expect("text template renders");

        assert!(html.contains("Aisha"));
        assert!(html.contains('7'));
        assert!(text.contains("Aisha"));
        assert!(text.contains('7'));
    }
}
