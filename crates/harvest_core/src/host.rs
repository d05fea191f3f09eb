//! Host notification and translation interfaces

use std::collections::HashMap;

/// Fire-and-continue user notification channel
pub trait Notifier: Send + Sync {
    /// Show a message to the player
    fn notify(&self, message: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::info!("Notification: {}", message);
    }
}

/// Localized strings keyed by `$TOKEN`
#[derive(Debug, Clone, Default)]
pub struct Translations {
    strings: HashMap<String, String>,
}

impl Translations {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            strings: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Parse the host's translation file format: one `KEY<TAB>VALUE` per line
    pub fn parse(text: &str) -> Self {
        let strings = text
            .lines()
            .filter_map(|line| {
                let (key, value) = line.split_once('\t')?;
                let key = key.trim();
                (!key.is_empty()).then(|| (key.to_string(), value.trim_end().to_string()))
            })
            .collect();
        Self { strings }
    }

    /// Add or replace a string
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }

    /// Look up a string
    pub fn get(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(|s| s.as_str())
    }

    /// Look up a string, falling back to a default
    pub fn get_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.get(key).unwrap_or(fallback)
    }

    /// Substitute `{}` placeholders in order
    pub fn format(template: &str, args: &[&str]) -> String {
        let mut out = String::with_capacity(template.len());
        let mut args = args.iter();
        let mut rest = template;
        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => out.push_str(arg),
                None => out.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }

    /// Number of strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let table = Translations::parse("$HARVEST\tHarvest\n$MINE\tMine\nbroken line\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("$MINE"), Some("Mine"));
        assert_eq!(table.get_or("$NOPE", "fallback"), "fallback");
    }

    #[test]
    fn test_format() {
        assert_eq!(Translations::format("{} added to {}", &["Ruby", "Gems"]), "Ruby added to Gems");
        assert_eq!(Translations::format("{} and {}", &["one"]), "one and {}");
    }
}
