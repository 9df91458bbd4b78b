//! Subject-line classification.

use paybot_types::payment::TransactionType;

/// Subject phrases of outgoing payment notifications (FR, EN).
pub const SENT_KEYWORDS: &[&str] = &["vous avez envoyé un paiement", "you sent a payment"];

/// Subject phrases of incoming payment notifications (EN, FR).
pub const RECEIVED_KEYWORDS: &[&str] = &["has sent you money", "vous a envoyé de l'argent"];

/// Direction of a notification from its subject, or `None` if the subject
/// matches neither keyword set. Matching is case-insensitive.
pub fn classify(subject: &str) -> Option<TransactionType> {
    let subject = subject.to_lowercase().replace('\u{2019}', "'");
    if SENT_KEYWORDS.iter().any(|k| subject.contains(k)) {
        Some(TransactionType::Sent)
    } else if RECEIVED_KEYWORDS.iter().any(|k| subject.contains(k)) {
        Some(TransactionType::Received)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn french_and_english_sent() {
        assert_eq!(
            classify("Vous avez envoyé un paiement à Jean Dupont"),
            Some(TransactionType::Sent)
        );
        assert_eq!(
            classify("You sent a payment to Bob's Shop"),
            Some(TransactionType::Sent)
        );
    }

    #[test]
    fn french_and_english_received() {
        assert_eq!(
            classify("Acme Corp vous a envoyé de l'argent"),
            Some(TransactionType::Received)
        );
        assert_eq!(
            classify("ACME CORP HAS SENT YOU MONEY"),
            Some(TransactionType::Received)
        );
    }

    #[test]
    fn typographic_apostrophe() {
        assert_eq!(
            classify("Acme Corp vous a envoyé de l\u{2019}argent"),
            Some(TransactionType::Received)
        );
    }

    #[test]
    fn unrelated_subjects() {
        assert_eq!(classify("Your monthly statement is ready"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("vous a envoyé"), None);
    }
}
