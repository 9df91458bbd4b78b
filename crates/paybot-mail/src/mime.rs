//! Raw RFC 822 message decoding.

use mailparse::{MailHeaderMap, ParsedMail, parse_mail};
use paybot_types::MailboxError;
use paybot_types::mail::MailMessage;

/// Decode a raw message into subject and first HTML part.
///
/// The subject is RFC 2047 decoded and empty when the header is missing.
/// Parts are searched depth-first; a message without a `text/html` part
/// decodes with `html = None`.
pub fn decode_message(uid: u32, raw: &[u8]) -> Result<MailMessage, MailboxError> {
    let parsed =
        parse_mail(raw).map_err(|e| MailboxError::Decode(format!("uid {uid}: {e}")))?;
    let subject = parsed
        .headers
        .get_first_value("Subject")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let html = first_html_part(&parsed)
        .map_err(|e| MailboxError::Decode(format!("uid {uid}: {e}")))?;
    Ok(MailMessage::new(uid, subject, html))
}

fn first_html_part(part: &ParsedMail<'_>) -> Result<Option<String>, mailparse::MailParseError> {
    if part.subparts.is_empty() {
        if part.ctype.mimetype.eq_ignore_ascii_case("text/html") {
            return part.get_body().map(Some);
        }
        return Ok(None);
    }
    for sub in &part.subparts {
        if let Some(html) = first_html_part(sub)? {
            return Ok(Some(html));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPART: &str = "From: service@paypal.com\r\n\
To: me@example.com\r\n\
Subject: =?UTF-8?Q?Acme_Corp_vous_a_envoy=C3=A9_de_l=27argent?=\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Acme Corp vous a envoye 100,00 EUR\r\n\
--XYZ\r\n\
Content-Type: text/html; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
<p style=3D\"font-size:32px\">Acme Corp vous a envoy=C3=A9 100,00 EUR.</p>\r\n\
--XYZ--\r\n";

    #[test]
    fn decodes_subject_and_html_part() {
        let msg = decode_message(12, MULTIPART.as_bytes()).unwrap();
        assert_eq!(msg.uid, 12);
        assert_eq!(msg.subject, "Acme Corp vous a envoyé de l'argent");
        let html = msg.html.unwrap();
        assert!(html.contains(r#"<p style="font-size:32px">"#));
        assert!(html.contains("envoyé 100,00 EUR."));
    }

    #[test]
    fn plain_text_only_has_no_html() {
        let raw = "Subject: hello\r\nContent-Type: text/plain\r\n\r\nbody\r\n";
        let msg = decode_message(3, raw.as_bytes()).unwrap();
        assert_eq!(msg.subject, "hello");
        assert_eq!(msg.html, None);
    }

    #[test]
    fn missing_subject_is_empty() {
        let raw = "Content-Type: text/html\r\n\r\n<p>hi</p>\r\n";
        let msg = decode_message(4, raw.as_bytes()).unwrap();
        assert_eq!(msg.subject, "");
        assert!(msg.html.unwrap().contains("<p>hi</p>"));
    }
}
