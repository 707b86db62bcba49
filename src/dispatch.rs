//! E-mail dispatch: deliver the finished sheet to the configured recipient.
//!
//! One message per call, one attempt per message. Credentials and the
//! recipient come from the environment at call time, never from code. The
//! connection uses implicit TLS (wrapper mode, default port 465) and an
//! explicit timeout so a dead SMTP host cannot hang the caller. A dispatch
//! failure is surfaced as an error; the PDF in the caller's hands remains
//! valid and can be re-sent by invoking dispatch again.

use crate::error::ImposeError;
use crate::output::ImposeOutput;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Subject prefix on every dispatched sheet.
const SUBJECT_TAG: &str = "[sixup]";

/// SMTP settings, resolved from the environment at call time.
///
/// | Variable | Meaning | Default |
/// |----------|---------|---------|
/// | `SIXUP_SMTP_HOST` | SMTP server hostname | `smtp.gmail.com` |
/// | `SIXUP_SMTP_PORT` | Implicit-TLS port | `465` |
/// | `SIXUP_SMTP_USER` | Account / from address | required |
/// | `SIXUP_SMTP_PASSWORD` | Account password | required |
/// | `SIXUP_RECIPIENT` | Destination address | required |
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub recipient: String,
    /// Connection and I/O timeout. Default: 20 s.
    pub timeout: Duration,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SmtpConfig {
    /// Resolve the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ImposeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ImposeError> {
        let required = |key: &str| {
            get(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ImposeError::SmtpNotConfigured {
                    var: key.to_string(),
                })
        };

        let port = match get("SIXUP_SMTP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|_| ImposeError::InvalidConfig(format!("SIXUP_SMTP_PORT: '{v}' is not a port number")))?,
            None => 465,
        };

        Ok(Self {
            host: get("SIXUP_SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port,
            user: required("SIXUP_SMTP_USER")?,
            password: required("SIXUP_SMTP_PASSWORD")?,
            recipient: required("SIXUP_RECIPIENT")?,
            timeout: Duration::from_secs(20),
        })
    }
}

/// Sends one [`ImposeOutput`] per call over authenticated implicit TLS.
pub struct Mailer {
    config: SmtpConfig,
}

impl Mailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Resolve configuration from the environment and build a mailer.
    pub fn from_env() -> Result<Self, ImposeError> {
        Ok(Self::new(SmtpConfig::from_env()?))
    }

    /// Attach the PDF and send it. One attempt, no retry.
    pub fn send(&self, output: &ImposeOutput) -> Result<(), ImposeError> {
        let fail = |detail: String| ImposeError::DispatchFailed {
            filename: output.filename.clone(),
            detail,
        };

        let message = Message::builder()
            .from(self.config.user.parse().map_err(|e| fail(format!("sender address: {e}")))?)
            .to(self
                .config
                .recipient
                .parse()
                .map_err(|e| fail(format!("recipient address: {e}")))?)
            .subject(format!("{SUBJECT_TAG} {}", output.filename))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(format!(
                        "Imposed sheet attached ({} KB).",
                        output.approx_kib()
                    )))
                    .singlepart(
                        Attachment::new(output.filename.clone()).body(
                            output.pdf.clone(),
                            ContentType::parse("application/pdf")
                                .map_err(|e| fail(format!("attachment type: {e}")))?,
                        ),
                    ),
            )
            .map_err(|e| fail(format!("building message: {e}")))?;

        let tls = TlsParameters::new(self.config.host.clone())
            .map_err(|e| fail(format!("TLS setup: {e}")))?;
        let transport = SmtpTransport::builder_dangerous(&self.config.host)
            .port(self.config.port)
            .tls(Tls::Wrapper(tls))
            .credentials(Credentials::new(
                self.config.user.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(self.config.timeout))
            .build();

        debug!(
            "Dispatching '{}' to {} via {}:{}",
            output.filename, self.config.recipient, self.config.host, self.config.port
        );
        transport.send(&message).map_err(|e| fail(e.to_string()))?;
        info!("Dispatched '{}' to {}", output.filename, self.config.recipient);
        Ok(())
    }
}
