//! Field extraction rules, in the order they are tried.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::amount::{Money, parse_locale_amount};
use super::document::{
    anchor_hrefs, find_paragraph, find_strong_label, flatten_text, header_paragraph,
    labeled_cell_value, next_in_document, next_sibling_named, raw_text,
};
use super::strategy::{Notification, Strategy};

static TRANSACTION_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"transaction/details/([^?]+)").expect("static regex"));
static TRANSACTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Numéro de transaction|Transaction ID").expect("static regex")
});
static AMOUNT_SENT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Montant envoy(é|e)|Amount sent").expect("static regex"));
static MONEY_RECEIVED_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Argent re(ç|c)u|Money received").expect("static regex"));
static RECIPIENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:à|to)\s+([^.]+)\.?$").expect("static regex"));
static SUBJECT_SENDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(?:has sent you money|vous a envoyé)").expect("static regex")
});
static HEADER_SENDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(?:vous a envoyé|has sent you)").expect("static regex")
});

/// Phrases of the outgoing-payment summary paragraph.
const SENT_PHRASES: &[&str] = &[
    "vous a envoyé",
    "vous avez envoyé",
    "you sent",
    "sent you",
    "sent to",
];

pub static TRANSACTION_ID: [Strategy<String>; 3] = [
    Strategy::new("details_link", id_from_details_link),
    Strategy::new("label_sibling_span", id_from_label_sibling),
    Strategy::new("label_next_anchor", id_from_label_next_anchor),
];

pub static SENT_AMOUNT: [Strategy<Money>; 2] = [
    Strategy::new("summary_paragraph", amount_from_sent_paragraph),
    Strategy::new("amount_sent_cell", amount_from_sent_cell),
];

pub static RECEIVED_AMOUNT: [Strategy<Money>; 2] = [
    Strategy::new("header_paragraph", amount_from_header),
    Strategy::new("money_received_cell", amount_from_received_cell),
];

pub static SENT_COUNTERPARTY: [Strategy<String>; 2] = [
    Strategy::new("subject_recipient", recipient_from_subject),
    Strategy::new("header_recipient", recipient_from_header),
];

pub static RECEIVED_COUNTERPARTY: [Strategy<String>; 2] = [
    Strategy::new("subject_sender", sender_from_subject),
    Strategy::new("header_sender", sender_from_header),
];

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).and_then(|c| non_empty(&c[1]))
}

fn money_in(n: &Notification<'_>, text: &str) -> Option<Money> {
    match parse_locale_amount(text) {
        Ok(found) => found,
        Err(e) => {
            warn!(uid = n.uid, subject = n.subject, error = %e, "amount out of range, ignoring");
            None
        }
    }
}

fn id_from_details_link(n: &Notification<'_>) -> Option<String> {
    anchor_hrefs(n.document).find_map(|href| capture(&TRANSACTION_LINK, href))
}

fn id_from_label_sibling(n: &Notification<'_>) -> Option<String> {
    let label = find_strong_label(n.document, &TRANSACTION_LABEL)?;
    let parent = label.parent().and_then(scraper::ElementRef::wrap)?;
    let value = next_sibling_named(parent, "span")?;
    non_empty(&raw_text(value))
}

fn id_from_label_next_anchor(n: &Notification<'_>) -> Option<String> {
    let label = find_strong_label(n.document, &TRANSACTION_LABEL)?;
    let anchor = next_in_document(n.document, label, "a")?;
    non_empty(&raw_text(anchor))
}

fn amount_from_sent_paragraph(n: &Notification<'_>) -> Option<Money> {
    let paragraph = find_paragraph(n.document, |text| {
        text.contains("eur") && SENT_PHRASES.iter().any(|p| text.contains(p))
    })?;
    money_in(n, &raw_text(paragraph))
}

fn amount_from_sent_cell(n: &Notification<'_>) -> Option<Money> {
    let value = labeled_cell_value(n.document, &AMOUNT_SENT_LABEL)?;
    money_in(n, &raw_text(value))
}

fn amount_from_header(n: &Notification<'_>) -> Option<Money> {
    let header = header_paragraph(n.document)?;
    money_in(n, &raw_text(header))
}

fn amount_from_received_cell(n: &Notification<'_>) -> Option<Money> {
    let value = labeled_cell_value(n.document, &MONEY_RECEIVED_LABEL)?;
    money_in(n, &raw_text(value))
}

fn recipient_from_subject(n: &Notification<'_>) -> Option<String> {
    capture(&RECIPIENT_NAME, n.subject.trim())
}

fn recipient_from_header(n: &Notification<'_>) -> Option<String> {
    let header = header_paragraph(n.document)?;
    capture(&RECIPIENT_NAME, &flatten_text(header))
}

fn sender_from_subject(n: &Notification<'_>) -> Option<String> {
    capture(&SUBJECT_SENDER_NAME, n.subject.trim())
}

fn sender_from_header(n: &Notification<'_>) -> Option<String> {
    let header = header_paragraph(n.document)?;
    capture(&HEADER_SENDER_NAME, &flatten_text(header))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use scraper::Html;

    use super::*;
    use crate::parser::strategy::first_match;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn id_from_link_stops_at_query() {
        let d = doc(r#"<a href="https://www.paypal.com/myaccount/transaction/details/9AB12345CD678901E?utm=x">Details</a>"#);
        let n = Notification::new(1, "", &d);
        assert_eq!(
            first_match(&TRANSACTION_ID, &n),
            Some(("details_link", "9AB12345CD678901E".to_string()))
        );
    }

    #[test]
    fn id_from_label_sibling_span() {
        let d = doc(
            r#"<div><p><strong>Numéro de transaction</strong></p><span> 4TX55512 </span></div>"#,
        );
        let n = Notification::new(1, "", &d);
        assert_eq!(
            first_match(&TRANSACTION_ID, &n),
            Some(("label_sibling_span", "4TX55512".to_string()))
        );
    }

    #[test]
    fn id_from_anchor_after_label() {
        let d = doc(r#"<p><strong>Transaction ID</strong></p><p><a href="/act">7YZ000</a></p>"#);
        let n = Notification::new(1, "", &d);
        assert_eq!(
            first_match(&TRANSACTION_ID, &n),
            Some(("label_next_anchor", "7YZ000".to_string()))
        );
    }

    #[test]
    fn no_id_without_link_or_label() {
        let d = doc(r#"<a href="https://example.com/help">Help</a>"#);
        let n = Notification::new(1, "", &d);
        assert_eq!(first_match(&TRANSACTION_ID, &n), None);
    }

    #[test]
    fn sent_amount_falls_back_to_cell() {
        let d = doc(
            r#"<p>Merci d'utiliser notre service.</p>
            <table><tr><td>Montant envoyé</td><td><span>-1.234,56&nbsp;EUR</span></td></tr></table>"#,
        );
        let n = Notification::new(1, "", &d);
        let (name, money) = first_match(&SENT_AMOUNT, &n).unwrap();
        assert_eq!(name, "amount_sent_cell");
        assert_eq!(money.amount, Decimal::from_str("-1234.56").unwrap());
        assert_eq!(money.currency, "EUR");
    }

    #[test]
    fn sent_amount_from_summary_paragraph() {
        let d = doc("<p>Vous avez envoyé 20,00 EUR à Jean Dupont.</p>");
        let n = Notification::new(1, "", &d);
        let (name, money) = first_match(&SENT_AMOUNT, &n).unwrap();
        assert_eq!(name, "summary_paragraph");
        assert_eq!(money.amount, Decimal::from_str("20.00").unwrap());
    }

    #[test]
    fn sent_amount_from_english_summary_phrases() {
        for text in [
            "We sent you a receipt for 20,00 EUR.",
            "20,00 EUR sent to Jean Dupont.",
            "You sent 20,00 EUR to Jean Dupont.",
        ] {
            let d = doc(&format!("<p>{text}</p>"));
            let n = Notification::new(1, "", &d);
            let (name, money) = first_match(&SENT_AMOUNT, &n).expect(text);
            assert_eq!(name, "summary_paragraph");
            assert_eq!(money.amount, Decimal::from_str("20.00").unwrap());
        }

        let d = doc("<p>Jean Dupont was paid 20,00 EUR.</p>");
        let n = Notification::new(1, "", &d);
        assert_eq!(first_match(&SENT_AMOUNT, &n), None);
    }

    #[test]
    fn received_amount_from_cell_in_english() {
        let d = doc(
            r#"<table><tr><td>Money received</td><td><span>15,50 USD</span></td></tr></table>"#,
        );
        let n = Notification::new(1, "", &d);
        let (name, money) = first_match(&RECEIVED_AMOUNT, &n).unwrap();
        assert_eq!(name, "money_received_cell");
        assert_eq!(money.currency, "USD");
    }

    #[test]
    fn recipient_from_subject_or_header() {
        let d = doc(r#"<p style="font-size:32px">Vous avez envoyé 20,00 EUR à Jean Dupont.</p>"#);
        let n = Notification::new(1, "Vous avez envoyé un paiement à Marie Curie", &d);
        assert_eq!(
            first_match(&SENT_COUNTERPARTY, &n),
            Some(("subject_recipient", "Marie Curie".to_string()))
        );

        let n = Notification::new(1, "Paiement envoyé", &d);
        assert_eq!(
            first_match(&SENT_COUNTERPARTY, &n),
            Some(("header_recipient", "Jean Dupont".to_string()))
        );
    }

    #[test]
    fn recipient_name_may_contain_preposition_letters() {
        let d = doc("<p></p>");
        let n = Notification::new(1, "You sent a payment to Tomato Farm", &d);
        assert_eq!(
            first_match(&SENT_COUNTERPARTY, &n),
            Some(("subject_recipient", "Tomato Farm".to_string()))
        );
    }

    #[test]
    fn sender_from_subject_or_header() {
        let d = doc(r#"<p style="font-size: 32px">Acme Corp vous a envoyé 100,00 EUR.</p>"#);
        let n = Notification::new(1, "Acme Corp has sent you money", &d);
        assert_eq!(
            first_match(&RECEIVED_COUNTERPARTY, &n),
            Some(("subject_sender", "Acme Corp".to_string()))
        );

        let n = Notification::new(1, "Paiement reçu", &d);
        assert_eq!(
            first_match(&RECEIVED_COUNTERPARTY, &n),
            Some(("header_sender", "Acme Corp".to_string()))
        );
    }
}
