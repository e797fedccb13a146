//! Localized strings
//!
//! Human-readable descriptor text is a [`LanguageMap`]: a mapping from a
//! language tag to an ordered list of strings, serialized as
//! `{ "en": ["..."], "ja": ["..."] }`.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A per-language list of strings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageMap(BTreeMap<String, Vec<String>>);

impl LanguageMap {
    /// An empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// A map with a single English value
    pub fn en(value: impl Into<String>) -> Self {
        Self::new().with(Locale::En, value)
    }

    /// Adds `value` under `locale`
    #[must_use]
    pub fn with(mut self, locale: Locale, value: impl Into<String>) -> Self {
        self.0
            .entry(locale.as_str().to_owned())
            .or_default()
            .push(value.into());
        self
    }

    /// The strings for `locale`, falling back to English
    pub fn get(&self, locale: Locale) -> &[String] {
        self.0
            .get(locale.as_str())
            .or_else(|| self.0.get(Locale::En.as_str()))
            .map_or(&[], Vec::as_slice)
    }

    /// The strings for `locale` joined into one line
    pub fn text(&self, locale: Locale) -> String {
        self.get(locale).join(" ")
    }

    /// Whether no strings are present for any language
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

/// A user interface language
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    #[default]
    En,
    /// Japanese
    Ja,
}

/// The language tag is not one this service renders
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale")]
pub struct UnsupportedLocale;

impl Locale {
    /// The language tag
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ja => "ja",
        }
    }

    /// Picks a locale from an explicit parameter, then a cookie, then an
    /// `Accept-Language` header, defaulting to English
    pub fn negotiate(
        param: Option<&str>,
        cookie: Option<&str>,
        accept_language: Option<&str>,
    ) -> Self {
        param
            .and_then(|p| p.parse().ok())
            .or_else(|| cookie.and_then(|c| c.parse().ok()))
            .or_else(|| accept_language.and_then(Self::from_accept_language))
            .unwrap_or_default()
    }

    /// The most preferred supported language in an `Accept-Language` header
    pub fn from_accept_language(header: &str) -> Option<Self> {
        let mut ranges: Vec<(f32, Self)> = header
            .split(',')
            .filter_map(|range| {
                let mut parts = range.split(';');
                let tag = parts.next()?.trim();
                let q = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                let primary = tag.split('-').next()?;
                let locale = primary.parse().ok()?;
                (q > 0.0).then_some((q, locale))
            })
            .collect();

        ranges.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranges.first().map(|(_, locale)| *locale)
    }

    /// Guesses a locale from the page that linked to an entry point
    ///
    /// Localized pages carry the locale as a `locale` query parameter or as
    /// the leading path segment.
    pub fn from_referer(referer: &str) -> Self {
        if referer.contains("locale=ja") || referer.contains("/ja/") || referer.ends_with("/ja") {
            Self::Ja
        } else {
            Self::En
        }
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("en") {
            Ok(Self::En)
        } else if s.eq_ignore_ascii_case("ja") {
            Ok(Self::Ja)
        } else {
            Err(UnsupportedLocale)
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_map_serializes_as_tag_to_string_list() -> color_eyre::Result<()> {
        let map = LanguageMap::en("Terms of Use").with(Locale::Ja, "利用規約");

        assert_eq!(
            serde_json::to_value(&map)?,
            serde_json::json!({ "en": ["Terms of Use"], "ja": ["利用規約"] })
        );
        Ok(())
    }

    #[test]
    fn missing_language_falls_back_to_english() {
        let map = LanguageMap::en("Login");
        assert_eq!(map.get(Locale::Ja), ["Login"]);
        assert!(LanguageMap::new().get(Locale::En).is_empty());
    }

    #[test]
    fn explicit_parameter_wins_over_cookie_and_header() {
        assert_eq!(Locale::negotiate(Some("ja"), Some("en"), Some("en")), Locale::Ja);
        assert_eq!(Locale::negotiate(Some("xx"), Some("ja"), Some("en")), Locale::Ja);
        assert_eq!(Locale::negotiate(None, None, Some("ja,en;q=0.8")), Locale::Ja);
        assert_eq!(Locale::negotiate(None, None, None), Locale::En);
    }

    #[test]
    fn accept_language_respects_quality_values() {
        assert_eq!(
            Locale::from_accept_language("fr-CH, en;q=0.5, ja-JP;q=0.9"),
            Some(Locale::Ja)
        );
        assert_eq!(Locale::from_accept_language("fr, de;q=0.7"), None);
        assert_eq!(Locale::from_accept_language("ja;q=0"), None);
    }

    #[test]
    fn referer_locale_is_read_from_path_or_query() {
        assert_eq!(Locale::from_referer("https://a.example/ja/viewer"), Locale::Ja);
        assert_eq!(Locale::from_referer("https://a.example/viewer?locale=ja"), Locale::Ja);
        assert_eq!(Locale::from_referer("https://a.example/en/viewer"), Locale::En);
    }
}
