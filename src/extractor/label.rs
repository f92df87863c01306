use std::fmt::{self, Display};

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Folds text for label comparison: diacritics stripped, lowercased, alphanumerics only.
///
/// `"Jum'at"`, `"JUMAT"` and `"Jumát"` all fold to `"jumat"`.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// A normalized target identifier with the spellings that denote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    canonical: String,
    aliases: Vec<String>,
}

impl Label {
    pub fn new(canonical: &str) -> Self {
        Self {
            canonical: fold(canonical),
            aliases: vec![],
        }
    }

    pub fn with_aliases<'a>(canonical: &str, aliases: impl IntoIterator<Item = &'a str>) -> Self {
        let mut label = Self::new(canonical);

        for alias in aliases {
            let alias = fold(alias);

            if !alias.is_empty() && alias != label.canonical && !label.aliases.contains(&alias) {
                label.aliases.push(alias);
            }
        }

        label
    }

    /// The canonical spelling followed by every alias.
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Whether `text`, once folded, is exactly one of the spellings.
    pub fn matches(&self, text: &str) -> bool {
        let folded = fold(text);

        !folded.is_empty() && self.spellings().any(|s| s == folded)
    }

    /// Whether any whitespace/punctuation-separated word of `text` is one of the spellings.
    pub fn matches_word(&self, text: &str) -> bool {
        text.split(|c: char| !c.is_alphanumeric() && c != '\'')
            .any(|word| self.matches(word))
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.canonical.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

const WEEKDAY_ALIASES: [(Weekday, &[&str]); 7] = [
    (Weekday::Monday, &["senin", "monday"]),
    (Weekday::Tuesday, &["selasa", "tuesday"]),
    (Weekday::Wednesday, &["rabu", "wednesday"]),
    (Weekday::Thursday, &["kamis", "thursday"]),
    (Weekday::Friday, &["jumat", "jumaat", "friday"]),
    (Weekday::Saturday, &["sabtu", "saturday"]),
    (Weekday::Sunday, &["minggu", "ahad", "sunday"]),
];

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        WEEKDAY_ALIASES[self.index()].1
    }

    /// Resolves any known spelling of a day name.
    #[cfg(test)]
    pub fn from_name(name: &str) -> Option<Self> {
        let folded = fold(name);

        WEEKDAY_ALIASES
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|alias| fold(alias) == folded))
            .map(|(day, _)| *day)
    }

    pub fn label(self) -> Label {
        Label::with_aliases(self.as_str(), self.aliases().iter().copied())
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}
