//! Parser tests against anonymized provider notifications.

use std::str::FromStr;

use paybot_mail::{decode_message, parse_payment};
use paybot_types::mail::MailMessage;
use paybot_types::payment::TransactionType;
use rust_decimal::Decimal;

const RECEIVED_FR: &str = include_str!("fixtures/received_fr.html");
const SENT_FR: &str = include_str!("fixtures/sent_fr.html");
const RECEIVED_EN: &str = include_str!("fixtures/received_en.html");
const STATEMENT_EN: &str = include_str!("fixtures/statement_en.html");
const RECEIVED_FR_EML: &[u8] = include_bytes!("fixtures/received_fr.eml");

fn message(uid: u32, subject: &str, html: &str) -> MailMessage {
    MailMessage::new(uid, subject, Some(html.to_string()))
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn received_french_notification() {
    let p = parse_payment(&message(101, "Acme Corp vous a envoyé de l'argent", RECEIVED_FR))
        .expect("classified");
    assert_eq!(p.transaction_type, Some(TransactionType::Received));
    assert_eq!(p.transaction_id.as_deref(), Some("3GH81236WK4502918"));
    assert_eq!(p.amount, Some(dec("100.00")));
    assert_eq!(p.currency.as_deref(), Some("EUR"));
    assert_eq!(p.counterparty_name.as_deref(), Some("Acme Corp"));
    assert!(p.is_complete());
}

#[test]
fn sent_french_notification() {
    let p = parse_payment(&message(
        102,
        "Vous avez envoyé un paiement à Jean Dupont",
        SENT_FR,
    ))
    .expect("classified");
    assert_eq!(p.transaction_type, Some(TransactionType::Sent));
    assert_eq!(p.transaction_id.as_deref(), Some("7LM40394RT2201534"));
    assert_eq!(p.amount, Some(dec("1234.56")));
    assert_eq!(p.currency.as_deref(), Some("EUR"));
    assert_eq!(p.counterparty_name.as_deref(), Some("Jean Dupont"));
    assert!(p.is_complete());
}

#[test]
fn received_english_notification_uses_fallbacks() {
    let p = parse_payment(&message(103, "Globex Ltd has sent you money", RECEIVED_EN))
        .expect("classified");
    assert_eq!(p.transaction_type, Some(TransactionType::Received));
    assert_eq!(p.transaction_id.as_deref(), Some("5TY09123KL0098812"));
    assert_eq!(p.amount, Some(dec("2500.00")));
    assert_eq!(p.currency.as_deref(), Some("USD"));
    assert_eq!(p.counterparty_name.as_deref(), Some("Globex Ltd"));
}

#[test]
fn non_payment_message_is_not_parsed() {
    assert_eq!(
        parse_payment(&message(104, "Your monthly statement is ready", STATEMENT_EN)),
        None
    );
}

#[test]
fn redelivered_message_parses_identically() {
    let msg = message(105, "Acme Corp vous a envoyé de l'argent", RECEIVED_FR);
    let first = serde_json::to_string(&parse_payment(&msg)).unwrap();
    let second = serde_json::to_string(&parse_payment(&msg.clone())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn raw_eml_decodes_and_parses() {
    let msg = decode_message(106, RECEIVED_FR_EML).unwrap();
    assert_eq!(msg.subject, "Acme Corp vous a envoyé de l'argent");
    let p = parse_payment(&msg).expect("classified");
    assert_eq!(p.uid, 106);
    assert_eq!(p.amount, Some(dec("100.00")));
    assert_eq!(p.counterparty_name.as_deref(), Some("Acme Corp"));
    assert!(p.is_complete());
}
