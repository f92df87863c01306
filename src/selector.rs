use std::fmt;
use std::fmt::Formatter;
use std::ops::Deref;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::de::Visitor;
use serde::{Deserialize, Deserializer};
use scraper::Selector;

#[derive(Debug)]
struct CssSelectorInner {
    selector: Selector,
    s: String,
}

/// A compiled CSS selector that remembers its source text.
#[derive(Debug, Clone)]
pub struct CssSelector(Arc<CssSelectorInner>);

impl CssSelector {
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        let selector = Selector::parse(&s)
            .map_err(|e| anyhow!("could not compile the CSS selector `{s}`: {e}"))?;

        Ok(CssSelector(Arc::new(CssSelectorInner { selector, s })))
    }

    /// Compiles a selector baked into the binary.
    pub(crate) fn builtin(s: &'static str) -> Self {
        Self::new(s).unwrap()
    }

    pub fn as_str(&self) -> &str {
        &self.0.s
    }
}

impl Deref for CssSelector {
    type Target = Selector;

    fn deref(&self) -> &Self::Target {
        &self.0.selector
    }
}

impl fmt::Display for CssSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl<'de> Deserialize<'de> for CssSelector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CssSelectorVisitor;

        impl<'de> Visitor<'de> for CssSelectorVisitor {
            type Value = CssSelector;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                write!(formatter, "a CSS selector")
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                CssSelector::new(v).map_err(E::custom)
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_string(v.into())
            }
        }

        deserializer.deserialize_string(CssSelectorVisitor)
    }
}
