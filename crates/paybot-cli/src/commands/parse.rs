//! `paybot parse` -- run the notification parser on a saved message.
//!
//! A raw `.eml` file goes through MIME decoding first. With `--subject`
//! the file is taken as the HTML body itself, since a bare HTML export
//! carries no subject line.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use paybot_mail::{decode_message, parse_payment};
use paybot_types::mail::MailMessage;

/// Arguments for the `parse` subcommand.
#[derive(Args)]
pub struct ParseArgs {
    /// Path to a raw RFC 822 message, or an HTML body when --subject is given.
    pub file: PathBuf,

    /// Subject line; treats FILE as the HTML body.
    #[arg(long)]
    pub subject: Option<String>,

    /// UID to report in the output.
    #[arg(long, default_value_t = 0)]
    pub uid: u32,
}

/// Parse the file and print the extracted record as JSON.
pub fn run(args: ParseArgs) -> anyhow::Result<()> {
    let raw = std::fs::read(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;

    let message = match args.subject {
        Some(subject) => {
            let html = String::from_utf8_lossy(&raw).into_owned();
            MailMessage::new(args.uid, subject, Some(html))
        }
        None => decode_message(args.uid, &raw)?,
    };

    let Some(payment) = parse_payment(&message) else {
        anyhow::bail!(
            "{} is not a recognized payment notification",
            args.file.display()
        );
    };

    println!("{}", serde_json::to_string_pretty(&payment)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_an_error() {
        let args = ParseArgs {
            file: PathBuf::from("/nonexistent/paybot/mail.eml"),
            subject: None,
            uid: 0,
        };
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn unclassified_subject_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html><body><p>Monthly statement</p></body></html>").unwrap();
        let args = ParseArgs {
            file: file.path().to_path_buf(),
            subject: Some("Your monthly statement".into()),
            uid: 7,
        };
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("not a recognized payment notification"));
    }
}
