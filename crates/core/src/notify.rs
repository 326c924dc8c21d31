//! Customer notifications: order emails, login codes and the SMS stub.
//!
//! Mail goes out over SMTP when it is configured and is otherwise written to
//! the log, which is what development and test environments use. Sending is
//! best effort: failures are logged and never bubble up into the request that
//! triggered them.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::order::OrderNotice;
use crate::types::Email;
use crate::tz;

/// Default sender when none is configured.
pub const DEFAULT_FROM_ADDRESS: &str = "IranMarket <no-reply@iranmarket.local>";

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Mail configuration shared by the storefront and admin.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// `None` logs messages instead of sending them.
    pub smtp: Option<SmtpSettings>,
    pub from_address: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp: None,
            from_address: DEFAULT_FROM_ADDRESS.to_owned(),
        }
    }
}

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

// =============================================================================
// Templates
// =============================================================================

/// Values shared by all order emails.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderView {
    order_id: String,
    customer_name: String,
    created_at: String,
    total: String,
    status_label: &'static str,
    payment_ref: String,
}

impl From<&OrderNotice> for OrderView {
    fn from(notice: &OrderNotice) -> Self {
        Self {
            order_id: notice.order_id.to_string(),
            customer_name: if notice.customer_name.is_empty() {
                "مشتری گرامی".to_owned()
            } else {
                notice.customer_name.clone()
            },
            created_at: tz::format_local(notice.created_at),
            total: notice.total_price.to_string(),
            status_label: notice.status.label(),
            payment_ref: notice.payment_ref.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "email/order_created.html")]
struct OrderCreatedHtml<'a> {
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/order_created.txt")]
struct OrderCreatedText<'a> {
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/payment_success.html")]
struct PaymentSuccessHtml<'a> {
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/payment_success.txt")]
struct PaymentSuccessText<'a> {
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/order_status_changed.html")]
struct StatusChangedHtml<'a> {
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/order_status_changed.txt")]
struct StatusChangedText<'a> {
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/login_code.html")]
struct LoginCodeHtml<'a> {
    code: &'a str,
    minutes: i64,
}

#[derive(Template)]
#[template(path = "email/login_code.txt")]
struct LoginCodeText<'a> {
    code: &'a str,
    minutes: i64,
}

/// A rendered email, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Which order email to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderMail {
    Created,
    PaymentSucceeded,
    StatusChanged,
}

/// Render an order email.
///
/// # Errors
///
/// Returns `NotifyError::Template` if rendering fails.
pub fn render_order_mail(kind: OrderMail, notice: &OrderNotice) -> Result<RenderedMail, NotifyError> {
    let order = OrderView::from(notice);
    let id = &order.order_id;
    let mail = match kind {
        OrderMail::Created => RenderedMail {
            subject: format!("ثبت سفارش جدید #{id} در ایران مارکت"),
            text: OrderCreatedText { order: &order }.render()?,
            html: OrderCreatedHtml { order: &order }.render()?,
        },
        OrderMail::PaymentSucceeded => RenderedMail {
            subject: format!("پرداخت سفارش #{id} با موفقیت انجام شد"),
            text: PaymentSuccessText { order: &order }.render()?,
            html: PaymentSuccessHtml { order: &order }.render()?,
        },
        OrderMail::StatusChanged => RenderedMail {
            subject: format!("وضعیت سفارش #{id}: {}", order.status_label),
            text: StatusChangedText { order: &order }.render()?,
            html: StatusChangedHtml { order: &order }.render()?,
        },
    };
    Ok(mail)
}

/// Render the login code email.
///
/// # Errors
///
/// Returns `NotifyError::Template` if rendering fails.
pub fn render_login_code(code: &str) -> Result<RenderedMail, NotifyError> {
    let minutes = crate::otp::OTP_TTL.num_minutes();
    Ok(RenderedMail {
        subject: "کد ورود به ایران مارکت".to_owned(),
        text: LoginCodeText { code, minutes }.render()?,
        html: LoginCodeHtml { code, minutes }.render()?,
    })
}

// =============================================================================
// Notifier
// =============================================================================

#[derive(Clone)]
enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Log,
}

/// Sends customer notifications.
#[derive(Clone)]
pub struct Notifier {
    transport: Transport,
    from: Mailbox,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = match self.transport {
            Transport::Smtp(_) => "smtp",
            Transport::Log => "log",
        };
        f.debug_struct("Notifier")
            .field("transport", &transport)
            .field("from", &self.from.to_string())
            .finish()
    }
}

impl Notifier {
    /// Build a notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender address is invalid or the SMTP relay
    /// cannot be configured.
    pub fn new(config: &MailConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|_| NotifyError::InvalidAddress(config.from_address.clone()))?;

        let transport = match &config.smtp {
            Some(smtp) => {
                let credentials = Credentials::new(
                    smtp.username.clone(),
                    smtp.password.expose_secret().to_owned(),
                );
                let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
                    .port(smtp.port)
                    .credentials(credentials)
                    .build();
                Transport::Smtp(mailer)
            }
            None => Transport::Log,
        };

        Ok(Self { transport, from })
    }

    /// Tell the customer their order was placed.
    pub async fn order_created(&self, notice: &OrderNotice) {
        self.order_mail(OrderMail::Created, notice).await;
    }

    /// Tell the customer their payment went through.
    pub async fn payment_success(&self, notice: &OrderNotice) {
        self.order_mail(OrderMail::PaymentSucceeded, notice).await;
    }

    /// Tell the customer their order moved to a new status.
    pub async fn order_status_changed(&self, notice: &OrderNotice) {
        self.order_mail(OrderMail::StatusChanged, notice).await;
    }

    /// Deliver a login code by email.
    pub async fn login_code(&self, to: &Email, code: &str) {
        let result = match render_login_code(code) {
            Ok(mail) => self.send(to, &mail).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to send login code email");
        }
    }

    /// SMS delivery stub; only logs the message.
    pub fn send_sms(&self, phone: &str, text: &str) {
        tracing::info!(phone = %phone, text = %text, "sms (not sent, no provider configured)");
    }

    async fn order_mail(&self, kind: OrderMail, notice: &OrderNotice) {
        let Some(to) = notice.email.as_ref() else {
            tracing::debug!(order_id = %notice.order_id, ?kind, "no email for order, skipping");
            return;
        };
        let result = match render_order_mail(kind, notice) {
            Ok(mail) => self.send(to, &mail).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(order_id = %notice.order_id, ?kind, error = %e, "failed to send order email");
        }
    }

    async fn send(&self, to: &Email, mail: &RenderedMail) -> Result<(), NotifyError> {
        let mailer = match &self.transport {
            Transport::Smtp(mailer) => mailer,
            Transport::Log => {
                tracing::info!(
                    to = %to,
                    subject = %mail.subject,
                    body = %mail.text,
                    "email (log transport)"
                );
                return Ok(());
            }
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .as_str()
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(to.to_string()))?)
            .subject(&mail.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(mail.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(mail.html.clone()),
                    ),
            )?;

        mailer.send(message).await?;
        tracing::info!(to = %to, subject = %mail.subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::{OrderId, OrderStatus, Toman};

    fn notice() -> OrderNotice {
        OrderNotice {
            order_id: OrderId::new(1042),
            customer_name: "سارا احمدی".to_owned(),
            email: Some(Email::parse("sara@example.com").unwrap()),
            phone: "09120000000".to_owned(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            total_price: Toman::new(1_250_000),
            status: OrderStatus::Processing,
            payment_ref: "TEST-ABCDEF12".to_owned(),
        }
    }

    #[test]
    fn test_order_created_subject_and_body() {
        let mail = render_order_mail(OrderMail::Created, &notice()).unwrap();
        assert_eq!(mail.subject, "ثبت سفارش جدید #1042 در ایران مارکت");
        assert!(mail.text.contains("سارا احمدی"));
        assert!(mail.text.contains("1,250,000 تومان"));
        assert!(mail.text.contains("2024/05/01 - 12:30"));
    }

    #[test]
    fn test_status_changed_uses_label() {
        let mail = render_order_mail(OrderMail::StatusChanged, &notice()).unwrap();
        assert!(mail.subject.contains("در حال پردازش"));
        assert!(mail.html.contains("در حال پردازش"));
    }

    #[test]
    fn test_login_code_mentions_ttl() {
        let mail = render_login_code("482913").unwrap();
        assert!(mail.text.contains("482913"));
        assert!(mail.text.contains('5'));
    }

    #[test]
    fn test_debug_redacts_password() {
        let smtp = SmtpSettings {
            host: "smtp.example.com".to_owned(),
            port: 587,
            username: "mailer".to_owned(),
            password: SecretString::from("hunter2"),
        };
        let debug = format!("{smtp:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_log_transport_never_fails() {
        let notifier = Notifier::new(&MailConfig::default()).unwrap();
        notifier.order_created(&notice()).await;
        let mut no_email = notice();
        no_email.email = None;
        notifier.payment_success(&no_email).await;
    }
}
