//! Email delivery abstraction and confirmation message composition.

use crate::error::EmailError;
use crate::types::{BookingToken, Language};
use std::future::Future;
use std::pin::Pin;

/// Name of the farm as shown to customers.
pub const FARM_NAME: &str = "Ferme Noël d'Antan";

/// Boxed future returned by [`EmailProvider::send`].
pub type EmailFuture<'a> = Pin<Box<dyn Future<Output = Result<(), EmailError>> + Send + 'a>>;

/// A fully composed email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text alternative
    pub plain_text: String,
    /// HTML body
    pub html: String,
}

/// Email provider.
///
/// Abstracts over delivery services (SMTP relay, console output in
/// development, recording mocks in tests).
pub trait EmailProvider: Send + Sync {
    /// Deliver a message.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The message cannot be built (invalid address)
    /// - The transport rejects or fails to deliver it
    fn send<'a>(&'a self, message: &'a EmailMessage) -> EmailFuture<'a>;
}

/// Everything a confirmation email shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmationDetails {
    /// Booking token, included in the consult link
    pub token: BookingToken,
    /// Recipient address
    pub email: String,
    /// Date as displayed to the customer
    pub date: String,
    /// Time as displayed to the customer (`9h00`)
    pub time: String,
    /// Machine-readable date used in the consult link
    pub raw_date: String,
    /// Message language
    pub language: Language,
}

impl ConfirmationDetails {
    /// Compose the confirmation message.
    ///
    /// `consult_url` is the page where the customer can look up or cancel the
    /// booking; the token, email, date and time are appended as query
    /// parameters.
    #[must_use]
    pub fn compose(&self, consult_url: &str) -> EmailMessage {
        let link = self.consult_link(consult_url);
        let (subject, plain_text, body, button) = match self.language {
            Language::English => (
                format!("Reservation confirmation at {FARM_NAME}"),
                format!(
                    "This is the confirmation of the reservation for {} at {}",
                    self.date, self.time
                ),
                format!(
                    "Your reservation for {} at {} has been successfully submitted. Looking forward to seeing you soon!",
                    escape_html(&self.date),
                    escape_html(&self.time)
                ),
                "Consult your reservation",
            ),
            Language::French => (
                format!("Confirmation de la réservation chez {FARM_NAME}"),
                format!(
                    "Ceci est la confirmation de la réservation du {} à {}",
                    self.date, self.time
                ),
                format!(
                    "Votre réservation du {} à {} a été soumise avec succès. Au plaisir de vous voir bientôt!",
                    escape_html(&self.date),
                    escape_html(&self.time)
                ),
                "Consulter votre réservation",
            ),
        };

        let html = render_html(
            self.language,
            &escape_html(&subject),
            &body,
            &escape_html(&link),
            button,
        );

        EmailMessage {
            to: self.email.clone(),
            subject,
            plain_text,
            html,
        }
    }

    /// Link to the consult page with query-string encoded parameters.
    #[must_use]
    pub fn consult_link(&self, consult_url: &str) -> String {
        format!(
            "{consult_url}?hash={}&email={}&date={}&time={}",
            urlencoding::encode(self.token.as_str()),
            urlencoding::encode(&self.email),
            urlencoding::encode(&self.raw_date),
            urlencoding::encode(&self.time),
        )
    }
}

fn render_html(language: Language, preview: &str, body: &str, link: &str, button: &str) -> String {
    let lang = match language {
        Language::English => "en",
        Language::French => "fr",
    };
    let farm = escape_html(FARM_NAME);

    format!(
        r#"<!DOCTYPE html>
<html dir="ltr" lang="{lang}">
<head>
    <meta content="text/html; charset=UTF-8" http-equiv="Content-Type"/>
    <title>{preview}</title>
</head>
<body style="background-color:#f6f9fc;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,'Helvetica Neue',Ubuntu,sans-serif">
    <div style="max-width:600px;margin:0 auto;padding:20px 48px 48px;background-color:#ffffff">
        <p style="font-size:32px;line-height:24px;margin:16px 0;color:#b80022">{farm}</p>
        <hr style="border:none;border-top:1px solid #e6ebf1;margin:20px 0"/>
        <p style="font-size:16px;line-height:24px;margin:16px 0;color:#525f7f">{body}</p>
        <a href="{link}" target="_blank"
           style="display:block;background-color:#b80022;border-radius:5px;color:#fff;font-size:16px;font-weight:bold;text-align:center;text-decoration:none;padding:10px">
            {button}
        </a>
        <hr style="border:none;border-top:1px solid #e6ebf1;margin:20px 0"/>
        <p style="font-size:12px;line-height:16px;margin:16px 0;color:#8898aa">Tous droits réservés à {farm}</p>
    </div>
</body>
</html>
"#
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}
