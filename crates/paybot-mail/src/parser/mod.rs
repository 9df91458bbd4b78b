//! Payment-notification parser.
//!
//! A notification is classified by its subject line, then each field is
//! pulled out of the HTML body by an ordered list of [`Strategy`] values.
//! Layouts differ between incoming and outgoing notifications, so the
//! amount and counterparty rules depend on the classified direction.
//!
//! Parsing is pure: the same message always yields the same
//! [`ParsedPayment`]. It never fails; a field whose rules all miss is left
//! empty.

pub mod amount;
pub mod classify;
pub mod document;
pub mod fields;
pub mod strategy;

use paybot_types::mail::MailMessage;
use paybot_types::payment::{ParsedPayment, TransactionType};
use scraper::Html;
use tracing::{debug, warn};

pub use amount::{Money, parse_locale_amount};
pub use classify::classify;
pub use strategy::{Notification, Strategy};

use strategy::extract;

/// Provider transaction identifier.
pub fn extract_transaction_id(notification: &Notification<'_>) -> Option<String> {
    extract("transaction_id", &fields::TRANSACTION_ID, notification)
}

/// Amount and currency, using the layout rules for `direction`.
pub fn extract_amount_and_currency(
    notification: &Notification<'_>,
    direction: TransactionType,
) -> Option<Money> {
    let strategies: &[Strategy<Money>] = match direction {
        TransactionType::Sent => &fields::SENT_AMOUNT,
        TransactionType::Received => &fields::RECEIVED_AMOUNT,
    };
    extract("amount", strategies, notification)
}

/// Recipient name for sent payments, sender name for received ones.
pub fn extract_counterparty_name(
    notification: &Notification<'_>,
    direction: TransactionType,
) -> Option<String> {
    let strategies: &[Strategy<String>] = match direction {
        TransactionType::Sent => &fields::SENT_COUNTERPARTY,
        TransactionType::Received => &fields::RECEIVED_COUNTERPARTY,
    };
    extract("counterparty_name", strategies, notification)
}

/// Parse one fetched message.
///
/// Returns `None` when the message has no HTML body or its subject is not
/// a recognized payment notification. Otherwise returns the record with
/// whatever fields could be extracted.
pub fn parse_payment(message: &MailMessage) -> Option<ParsedPayment> {
    let Some(html) = message.html.as_deref() else {
        warn!(uid = message.uid, subject = %message.subject, "message has no HTML body, skipping");
        return None;
    };
    let Some(direction) = classify(&message.subject) else {
        warn!(uid = message.uid, subject = %message.subject, "not a payment notification, skipping");
        return None;
    };

    let document = Html::parse_document(html);
    let notification = Notification::new(message.uid, &message.subject, &document);

    let mut payment = ParsedPayment::empty(message.uid, message.subject.clone());
    payment.transaction_type = Some(direction);
    payment.transaction_id = extract_transaction_id(&notification);
    if let Some(money) = extract_amount_and_currency(&notification, direction) {
        payment.amount = Some(money.amount);
        payment.currency = Some(money.currency);
    }
    payment.counterparty_name = extract_counterparty_name(&notification, direction);

    debug!(
        uid = payment.uid,
        direction = %direction,
        missing = ?payment.missing_fields(),
        "parsed notification"
    );
    Some(payment)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;

    const RECEIVED_HTML: &str = r#"<html><body>
        <p style="font-size:32px;line-height:40px">Acme Corp vous a envoyé 100,00&nbsp;EUR.</p>
        <table><tr><td>
            <p><strong>Numéro de transaction</strong></p>
            <span>5KX31337AB</span>
        </td></tr></table>
    </body></html>"#;

    #[test]
    fn received_with_labeled_id() {
        let msg = MailMessage::new(
            42,
            "Acme Corp vous a envoyé de l'argent",
            Some(RECEIVED_HTML.to_string()),
        );
        let p = parse_payment(&msg).unwrap();
        assert_eq!(p.uid, 42);
        assert_eq!(p.transaction_type, Some(TransactionType::Received));
        assert_eq!(p.amount, Some(Decimal::from_str("100.00").unwrap()));
        assert_eq!(p.currency.as_deref(), Some("EUR"));
        assert_eq!(p.counterparty_name.as_deref(), Some("Acme Corp"));
        assert_eq!(p.transaction_id.as_deref(), Some("5KX31337AB"));
        assert!(p.is_complete());
    }

    #[test]
    fn unclassified_subject_is_dropped() {
        let msg = MailMessage::new(1, "Your statement", Some(RECEIVED_HTML.to_string()));
        assert_eq!(parse_payment(&msg), None);
    }

    #[test]
    fn missing_html_is_dropped() {
        let msg = MailMessage::new(1, "Acme Corp has sent you money", None);
        assert_eq!(parse_payment(&msg), None);
    }

    #[test]
    fn partial_record_is_returned() {
        let msg = MailMessage::new(
            7,
            "Acme Corp has sent you money",
            Some("<p>Nothing to see here</p>".to_string()),
        );
        let p = parse_payment(&msg).unwrap();
        assert_eq!(p.transaction_type, Some(TransactionType::Received));
        assert_eq!(p.counterparty_name.as_deref(), Some("Acme Corp"));
        assert_eq!(p.amount, None);
        assert_eq!(p.transaction_id, None);
        assert!(!p.is_complete());
        assert_eq!(p.missing_fields(), vec!["transaction_id", "amount", "currency"]);
    }

    #[test]
    fn parsing_is_deterministic() {
        let msg = MailMessage::new(
            9,
            "Acme Corp vous a envoyé de l'argent",
            Some(RECEIVED_HTML.to_string()),
        );
        let first = parse_payment(&msg);
        let second = parse_payment(&msg);
        assert_eq!(first, second);
    }
}
