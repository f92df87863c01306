use std::sync::OnceLock;

use regex_lite::{Regex, RegexBuilder};

/// Labeled patterns mined from free caption text when no structured element carries the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPattern {
    /// `Pukul 18.30`, `Rilis: 7:05`, a bare `23:00`. Yields `HH:MM`.
    ///
    /// A dot separator is only accepted after a label so that scores like `7.52` never match.
    TimeOfDay,
    /// `Episode 12`, `Eps 3`.
    Episode,
    /// `3 hari yang lalu`, `5 days ago`.
    RelativeDate,
    /// `Score: 7.52` in tooltip text.
    Score,
    /// `Type: TV`, `Tipe: Movie` in tooltip text.
    Type,
    /// The first run of digits.
    Number,
}

fn build(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .ignore_whitespace(true)
        .build()
        .unwrap()
}

impl TextPattern {
    fn regex(self) -> &'static Regex {
        static TIME_OF_DAY: OnceLock<Regex> = OnceLock::new();
        static EPISODE: OnceLock<Regex> = OnceLock::new();
        static RELATIVE_DATE: OnceLock<Regex> = OnceLock::new();
        static SCORE: OnceLock<Regex> = OnceLock::new();
        static TYPE: OnceLock<Regex> = OnceLock::new();
        static NUMBER: OnceLock<Regex> = OnceLock::new();

        match self {
            Self::TimeOfDay => TIME_OF_DAY.get_or_init(|| {
                build(
                    r"
                    (?:
                        (?:pukul|jam|time|rilis) \s* [:\-]? \s*
                        \b (?<hour> [01]?\d | 2[0-3] ) [:.] (?<minute> [0-5]\d )
                    |
                        \b (?<bare_hour> [01]?\d | 2[0-3] ) : (?<bare_minute> [0-5]\d )
                    )
                    \b
                    ",
                )
            }),

            Self::Episode => EPISODE.get_or_init(|| {
                build(r"\b (?:episode|eps?) \s* \.? \s* (?<value> \d+ )")
            }),

            Self::RelativeDate => RELATIVE_DATE.get_or_init(|| {
                build(r"(?<value> \d+ \s+ \w+ \s+ (?: yang \s+ lalu | ago ) )")
            }),

            Self::Score => SCORE.get_or_init(|| {
                build(r"\b (?:score|skor|rating) \s* : \s* (?<value> \d+ (?: [.,] \d+ )? )")
            }),

            Self::Type => TYPE.get_or_init(|| {
                build(r"\b (?:type|tipe) \s* : \s* (?<value> [a-zA-Z]+ )")
            }),

            Self::Number => NUMBER.get_or_init(|| build(r"(?<value> \d+ )")),
        }
    }

    /// Finds the first occurrence of the pattern in `text`.
    pub fn find(self, text: &str) -> Option<String> {
        let captures = self.regex().captures(text)?;

        match self {
            Self::TimeOfDay => {
                let hour = captures.name("hour").or_else(|| captures.name("bare_hour"))?;
                let minute = captures
                    .name("minute")
                    .or_else(|| captures.name("bare_minute"))?
                    .as_str();
                let hour: u8 = hour.as_str().parse().ok()?;

                Some(format!("{hour:02}:{minute}"))
            }

            Self::RelativeDate => Some(
                captures
                    .name("value")?
                    .as_str()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" "),
            ),

            Self::Score => Some(captures.name("value")?.as_str().replace(',', ".")),

            _ => Some(captures.name("value")?.as_str().to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TextPattern::*;

    #[test]
    fn time_of_day() {
        assert_eq!(TimeOfDay.find("Rilis Pukul 18.30 WIB"), Some("18:30".into()));
        assert_eq!(TimeOfDay.find("jam: 7:05"), Some("07:05".into()));
        assert_eq!(TimeOfDay.find("tayang 23:00"), Some("23:00".into()));
        assert_eq!(TimeOfDay.find("durasi 24:10"), None);
        assert_eq!(TimeOfDay.find("Episode 12"), None);
        assert_eq!(TimeOfDay.find("Score 7.52 Jam 21.15"), Some("21:15".into()));
        assert_eq!(TimeOfDay.find("Score 7.52"), None);
    }

    #[test]
    fn episode() {
        assert_eq!(Episode.find("One Piece Episode 1089 Sub"), Some("1089".into()));
        assert_eq!(Episode.find("Eps. 7"), Some("7".into()));
        assert_eq!(Episode.find("Seasons 2"), None);
    }

    #[test]
    fn relative_date() {
        assert_eq!(
            RelativeDate.find("Posted  3 hari   yang lalu by admin"),
            Some("3 hari yang lalu".into())
        );
        assert_eq!(RelativeDate.find("5 days ago"), Some("5 days ago".into()));
        assert_eq!(RelativeDate.find("yesterday"), None);
    }

    #[test]
    fn tooltip_fields() {
        assert_eq!(Score.find("Status: Ongoing Score: 7,52"), Some("7.52".into()));
        assert_eq!(Type.find("Tipe: Movie Studio: X"), Some("Movie".into()));
        assert_eq!(Type.find("no type here"), None);
        assert_eq!(Number.find("Ep 04 / 12"), Some("04".into()));
    }
}
