//! Ordered extraction strategies.
//!
//! Every field is extracted by a list of independent strategies tried in
//! order; the first one that yields a value wins. Keeping the fallbacks as
//! data makes each one testable on its own and keeps the order visible in
//! one place.

use scraper::Html;
use tracing::debug;

/// The inputs every strategy sees.
pub struct Notification<'a> {
    /// UID of the message, for log context.
    pub uid: u32,
    /// Raw subject line.
    pub subject: &'a str,
    /// Parsed HTML body.
    pub document: &'a Html,
}

impl<'a> Notification<'a> {
    pub fn new(uid: u32, subject: &'a str, document: &'a Html) -> Self {
        Self {
            uid,
            subject,
            document,
        }
    }
}

/// One named extraction rule.
pub struct Strategy<T> {
    /// Short name, logged when the strategy wins.
    pub name: &'static str,
    /// The rule itself.
    pub run: fn(&Notification<'_>) -> Option<T>,
}

impl<T> Strategy<T> {
    pub const fn new(name: &'static str, run: fn(&Notification<'_>) -> Option<T>) -> Self {
        Self { name, run }
    }
}

/// Run `strategies` in order and return the first hit with its name.
pub fn first_match<T>(
    strategies: &[Strategy<T>],
    notification: &Notification<'_>,
) -> Option<(&'static str, T)> {
    strategies
        .iter()
        .find_map(|s| (s.run)(notification).map(|value| (s.name, value)))
}

/// [`first_match`] plus a debug line naming the field and the winner.
pub fn extract<T: std::fmt::Debug>(
    field: &'static str,
    strategies: &[Strategy<T>],
    notification: &Notification<'_>,
) -> Option<T> {
    match first_match(strategies, notification) {
        Some((name, value)) => {
            debug!(uid = notification.uid, field, strategy = name, value = ?value, "extracted");
            Some(value)
        }
        None => {
            debug!(uid = notification.uid, field, "no strategy matched");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &Notification<'_>) -> Option<u32> {
        None
    }

    fn one(_: &Notification<'_>) -> Option<u32> {
        Some(1)
    }

    fn two(_: &Notification<'_>) -> Option<u32> {
        Some(2)
    }

    #[test]
    fn first_non_empty_strategy_wins() {
        let doc = Html::parse_document("<p></p>");
        let n = Notification::new(1, "", &doc);
        let strategies = [
            Strategy::new("never", never),
            Strategy::new("one", one),
            Strategy::new("two", two),
        ];
        assert_eq!(first_match(&strategies, &n), Some(("one", 1)));
    }

    #[test]
    fn no_match_yields_none() {
        let doc = Html::parse_document("<p></p>");
        let n = Notification::new(1, "", &doc);
        let strategies = [Strategy::new("never", never)];
        assert_eq!(extract("field", &strategies, &n), None);
        assert_eq!(extract::<u32>("field", &[], &n), None);
    }
}
