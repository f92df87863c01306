use std::fmt;
use std::sync::OnceLock;

use derive_more::{From, Into};
use regex_lite::Regex;
use serde::de::{Unexpected, Visitor};
use serde::{Deserialize, Deserializer};

/// A request timeout: whole seconds, or a string of `<n><unit>` terms like `"1m 30s"` or `"750ms"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, From, Into)]
pub struct Duration(std::time::Duration);

impl Duration {
    pub fn from_secs(seconds: u64) -> Self {
        Self(std::time::Duration::from_secs(seconds))
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(std::time::Duration::from_millis(millis))
    }
}

fn unit_millis(unit: &str) -> u64 {
    match unit {
        "ms" => 1,
        "s" => 1000,
        "m" => 60 * 1000,
        _ => 60 * 60 * 1000,
    }
}

/// Sums the terms of `s` in milliseconds. `None` if `s` is not exactly a sequence of terms.
fn parse_millis(s: &str) -> Option<u64> {
    static TERM: OnceLock<Regex> = OnceLock::new();

    let term = TERM.get_or_init(|| Regex::new(r"(\d+)\s*(ms|h|m|s)\s*").unwrap());
    let s = s.trim();
    let mut end = 0;
    let mut total = 0u64;

    for captures in term.captures_iter(s) {
        let whole = captures.get(0)?;

        if whole.start() != end {
            return None;
        }

        end = whole.end();
        let value = captures[1].parse::<u64>().ok()?;
        total = total.checked_add(value.checked_mul(unit_millis(&captures[2]))?)?;
    }

    (end > 0 && end == s.len()).then_some(total)
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a positive number of seconds or a string like \"1m 30s\"")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match u64::try_from(v) {
                    Ok(v) => self.visit_u64(v),
                    Err(_) => Err(E::invalid_value(Unexpected::Signed(v), &self)),
                }
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v == 0 {
                    return Err(E::invalid_value(Unexpected::Unsigned(v), &self));
                }

                Ok(Duration::from_secs(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match parse_millis(v) {
                    Some(0) | None => Err(E::invalid_value(Unexpected::Str(v), &self)),
                    Some(millis) => Ok(Duration::from_millis(millis)),
                }
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        d: Duration,
    }

    fn parse(s: &str) -> Result<Duration, toml::de::Error> {
        toml::from_str::<Wrapper>(s).map(|w| w.d)
    }

    #[test]
    fn parses_numbers_and_strings() {
        assert_eq!(parse("d = 15").unwrap(), Duration::from_secs(15));
        assert_eq!(parse(r#"d = "1m 30s""#).unwrap(), Duration::from_secs(90));
        assert_eq!(parse(r#"d = "1h""#).unwrap(), Duration::from_secs(3600));
        assert_eq!(parse(r#"d = "750ms""#).unwrap(), Duration::from_millis(750));
        assert_eq!(parse(r#"d = "2s 500ms""#).unwrap(), Duration::from_millis(2500));
    }

    #[test]
    fn converts_to_std() {
        let timeout: std::time::Duration = parse(r#"d = "1s 250ms""#).unwrap().into();

        assert_eq!(timeout, std::time::Duration::from_millis(1250));
        assert_eq!(Duration::from(timeout), Duration::from_millis(1250));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse(r#"d = """#).is_err());
        assert!(parse(r#"d = "soon""#).is_err());
        assert!(parse(r#"d = "10s later""#).is_err());
        assert!(parse(r#"d = "0s""#).is_err());
        assert!(parse("d = 0").is_err());
        assert!(parse("d = -3").is_err());
    }
}
