#![forbid(unsafe_code)]

//! Resource tables keyed by locale, with culture fallback.
//!
//! # Invariants
//!
//! 1. **Fallback chain terminates**: every lookup tries the exact locale,
//!    then its neutral parent, then each fallback locale once, returning
//!    `None` if nothing provides the key.
//!
//! 2. **Tables are immutable once shared**: a `StringCatalog` handed to a
//!    lookup adapter is never mutated behind its back.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Missing key | Key not in any locale | Returns `None` |
//! | Missing locale | Locale not loaded | Falls through chain |
//! | Regional locale | `de-AT` not loaded, `de` is | Neutral parent used |
//! | Empty catalog | No locales loaded | All lookups return `None` |
//! | Duplicate key | Same key twice for one culture in a JSON table | `DuplicateKey` |

use std::collections::HashMap;

use crate::locale::CultureInfo;

/// Locale identifier (e.g., `"en"`, `"de"`, `"de-AT"`).
pub type Locale = String;

/// Errors from i18n operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nError {
    /// A locale string was malformed.
    InvalidLocale(String),
    /// A resource document could not be parsed.
    ParseError(String),
    /// Duplicate key in the same locale.
    DuplicateKey { locale: String, key: String },
}

impl std::fmt::Display for I18nError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLocale(l) => write!(f, "invalid locale: {l}"),
            Self::ParseError(msg) => write!(f, "parse error: {msg}"),
            Self::DuplicateKey { locale, key } => {
                write!(f, "duplicate key '{key}' in locale '{locale}'")
            }
        }
    }
}

impl std::error::Error for I18nError {}

/// Strings for a single locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleStrings {
    strings: HashMap<String, String>,
}

impl LocaleStrings {
    /// Create an empty locale string set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a string, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }

    /// Insert a string, refusing to overwrite an existing key.
    ///
    /// `locale` is only used to label the error.
    pub fn try_insert(
        &mut self,
        locale: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), I18nError> {
        let key = key.into();
        if self.strings.contains_key(&key) {
            return Err(I18nError::DuplicateKey {
                locale: locale.to_string(),
                key,
            });
        }
        self.strings.insert(key, value.into());
        Ok(())
    }

    /// Look up a string by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the locale has no strings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over all keys in this locale.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.strings.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LocaleStrings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut strings = Self::new();
        for (key, value) in iter {
            strings.insert(key, value);
        }
        strings
    }
}

/// Central resource catalog: one string table per locale.
///
/// # Example
///
/// ```
/// use relocale::catalog::{LocaleStrings, StringCatalog};
///
/// let mut catalog = StringCatalog::new();
/// catalog.add_locale("en", [("Greeting", "Hello")].into_iter().collect());
/// catalog.add_locale("de", [("Greeting", "Hallo")].into_iter().collect());
/// catalog.set_fallback_chain(vec!["en".into()]);
///
/// assert_eq!(catalog.get("de", "Greeting"), Some("Hallo"));
/// assert_eq!(catalog.get("de-AT", "Greeting"), Some("Hallo"));
/// assert_eq!(catalog.get("fr", "Greeting"), Some("Hello"));
/// assert_eq!(catalog.get("en", "Missing"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringCatalog {
    locales: HashMap<Locale, LocaleStrings>,
    fallback_chain: Vec<Locale>,
}

impl StringCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add strings for a locale, replacing any previous table for it.
    pub fn add_locale(&mut self, locale: impl Into<String>, strings: LocaleStrings) {
        self.locales.insert(locale.into(), strings);
    }

    /// Set the fallback chain (tried in order when a key is missing).
    pub fn set_fallback_chain(&mut self, chain: Vec<Locale>) {
        self.fallback_chain = chain;
    }

    /// The configured fallback chain.
    #[must_use]
    pub fn fallback_chain(&self) -> &[Locale] {
        &self.fallback_chain
    }

    /// Look up a string by key.
    ///
    /// Tries the specified locale, then its neutral parent (`de-AT` ->
    /// `de`), then walks the fallback chain. Returns `None` if no locale
    /// provides the key.
    #[must_use]
    pub fn get(&self, locale: &str, key: &str) -> Option<&str> {
        if let Some(value) = self.get_exact(locale, key) {
            return Some(value);
        }

        let neutral = CultureInfo::new(locale)
            .ok()
            .filter(|culture| !culture.is_neutral())
            .map(|culture| culture.neutral());
        if let Some(value) = neutral
            .as_ref()
            .and_then(|culture| self.get_exact(culture.name(), key))
        {
            return Some(value);
        }

        for fallback in &self.fallback_chain {
            if fallback == locale || neutral.as_ref().is_some_and(|c| c.name() == fallback) {
                continue; // Already tried
            }
            if let Some(value) = self.get_exact(fallback, key) {
                return Some(value);
            }
        }

        None
    }

    fn get_exact(&self, locale: &str, key: &str) -> Option<&str> {
        self.locales.get(locale).and_then(|ls| ls.get(key))
    }

    /// Whether a table is loaded for exactly this locale tag.
    #[must_use]
    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.contains_key(locale)
    }

    /// All registered locale tags, sorted.
    #[must_use]
    pub fn locales(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.locales.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Parse a catalog from a JSON object of locale tables.
    ///
    /// ```json
    /// { "en": { "Greeting": "Hello" }, "de": { "Greeting": "Hallo" } }
    /// ```
    ///
    /// Locale tags are validated and stored in canonical form (`de-at` is
    /// stored as `de-AT`). A key given twice for the same locale, including
    /// across tags that normalize to the same culture, is a
    /// [`I18nError::DuplicateKey`]. The fallback chain is left empty.
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> Result<Self, I18nError> {
        let json::ResourceDocument(tables) =
            serde_json::from_str(json).map_err(|e| I18nError::ParseError(e.to_string()))?;

        let mut catalog = Self::new();
        for (tag, entries) in tables.0 {
            let culture = CultureInfo::new(&tag)?;
            let strings = catalog
                .locales
                .entry(culture.name().to_string())
                .or_default();
            for (key, value) in entries.0 {
                strings.try_insert(culture.name(), key, value)?;
            }
        }
        Ok(catalog)
    }
}

#[cfg(feature = "json")]
mod json {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::Deserialize;
    use serde::de::{Deserializer, MapAccess, Visitor};

    /// Top-level resource file: locale tag -> key -> string.
    #[derive(Debug, Deserialize)]
    #[serde(transparent)]
    pub(super) struct ResourceDocument(pub(super) Entries<Entries<String>>);

    /// A JSON object read as its raw entry list, in document order.
    ///
    /// Unlike a map type, repeated keys are kept so the loader can reject
    /// them.
    #[derive(Debug)]
    pub(super) struct Entries<V>(pub(super) Vec<(String, V)>);

    impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct EntriesVisitor<V>(PhantomData<V>);

            impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
                type Value = Entries<V>;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("a JSON object")
                }

                fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                    let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                    while let Some(entry) = map.next_entry::<String, V>()? {
                        entries.push(entry);
                    }
                    Ok(Entries(entries))
                }
            }

            deserializer.deserialize_map(EntriesVisitor(PhantomData))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeting_catalog() -> StringCatalog {
        let mut catalog = StringCatalog::new();
        let mut en = LocaleStrings::new();
        en.insert("Greeting", "Hello");
        en.insert("SwitchLanguage", "Switch language");
        en.insert("OnlyEnglish", "English only");
        let mut de = LocaleStrings::new();
        de.insert("Greeting", "Hallo");
        de.insert("SwitchLanguage", "Sprache wechseln");
        catalog.add_locale("en", en);
        catalog.add_locale("de", de);
        catalog.set_fallback_chain(vec!["en".into()]);
        catalog
    }

    #[test]
    fn simple_lookup() {
        let catalog = greeting_catalog();
        assert_eq!(catalog.get("en", "Greeting"), Some("Hello"));
        assert_eq!(catalog.get("de", "Greeting"), Some("Hallo"));
    }

    #[test]
    fn missing_key_returns_none() {
        let catalog = greeting_catalog();
        assert_eq!(catalog.get("de", "Nonexistent"), None);
    }

    #[test]
    fn missing_locale_falls_back() {
        let catalog = greeting_catalog();
        assert_eq!(catalog.get("fr", "Greeting"), Some("Hello"));
    }

    #[test]
    fn missing_key_in_locale_falls_back() {
        let catalog = greeting_catalog();
        assert_eq!(catalog.get("de", "OnlyEnglish"), Some("English only"));
    }

    #[test]
    fn regional_locale_uses_neutral_parent() {
        let catalog = greeting_catalog();
        assert_eq!(catalog.get("de-AT", "Greeting"), Some("Hallo"));
        assert_eq!(catalog.get("de-AT", "OnlyEnglish"), Some("English only"));
    }

    #[test]
    fn regional_table_wins_over_neutral() {
        let mut catalog = greeting_catalog();
        catalog.add_locale("de-CH", [("Greeting", "Grüezi")].into_iter().collect());
        assert_eq!(catalog.get("de-CH", "Greeting"), Some("Grüezi"));
        assert_eq!(catalog.get("de-CH", "SwitchLanguage"), Some("Sprache wechseln"));
    }

    #[test]
    fn no_fallback_chain_means_no_fallback() {
        let mut catalog = StringCatalog::new();
        catalog.add_locale("en", [("Greeting", "Hello")].into_iter().collect());
        assert_eq!(catalog.get("de", "Greeting"), None);
    }

    #[test]
    fn empty_catalog() {
        let catalog = StringCatalog::new();
        assert_eq!(catalog.get("en", "anything"), None);
        assert!(catalog.locales().is_empty());
    }

    #[test]
    fn locale_listing_is_sorted() {
        let catalog = greeting_catalog();
        assert_eq!(catalog.locales(), vec!["de", "en"]);
        assert!(catalog.has_locale("de"));
        assert!(!catalog.has_locale("de-AT"));
    }

    #[test]
    fn try_insert_rejects_duplicates() {
        let mut ls = LocaleStrings::new();
        ls.try_insert("en", "Greeting", "Hello").unwrap();
        let err = ls.try_insert("en", "Greeting", "Hi").unwrap_err();
        assert_eq!(
            err,
            I18nError::DuplicateKey {
                locale: "en".into(),
                key: "Greeting".into()
            }
        );
        assert_eq!(ls.get("Greeting"), Some("Hello"));
        assert_eq!(err.to_string(), "duplicate key 'Greeting' in locale 'en'");
    }

    #[test]
    fn locale_strings_keys() {
        let ls: LocaleStrings = [("alpha", "A"), ("beta", "B")].into_iter().collect();
        let mut keys: Vec<&str> = ls.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["alpha", "beta"]);
        assert_eq!(ls.len(), 2);
        assert!(!ls.is_empty());
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_tables_load() {
        let catalog = StringCatalog::from_json_str(
            r#"{ "en": { "Greeting": "Hello" }, "de": { "Greeting": "Hallo" } }"#,
        )
        .unwrap();
        assert_eq!(catalog.locales(), vec!["de", "en"]);
        assert_eq!(catalog.get("de", "Greeting"), Some("Hallo"));
        assert!(catalog.fallback_chain().is_empty());
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_rejects_bad_documents() {
        assert!(matches!(
            StringCatalog::from_json_str("[1, 2]"),
            Err(I18nError::ParseError(_))
        ));
        assert_eq!(
            StringCatalog::from_json_str(r#"{ "not a tag": {} }"#).unwrap_err(),
            I18nError::InvalidLocale("not a tag".into())
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_locale_tags_are_normalized() {
        use crate::locale::DefaultLanguageService;
        use crate::lookup::{CatalogLookup, ResourceLookup};
        use std::rc::Rc;

        let catalog = StringCatalog::from_json_str(
            r#"{ "en": { "Greeting": "Hello" }, "de-at": { "Greeting": "Servus" } }"#,
        )
        .unwrap();
        assert_eq!(catalog.locales(), vec!["de-AT", "en"]);

        let languages = Rc::new(DefaultLanguageService::new(
            CultureInfo::new("en").unwrap(),
            CultureInfo::new("de-at").unwrap(),
        ));
        let lookup = CatalogLookup::new(catalog, languages);
        assert_eq!(lookup.resolve("Greeting").as_deref(), Some("Servus"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_rejects_duplicate_keys() {
        assert_eq!(
            StringCatalog::from_json_str(r#"{ "en": { "Greeting": "Hello", "Greeting": "Hi" } }"#)
                .unwrap_err(),
            I18nError::DuplicateKey {
                locale: "en".into(),
                key: "Greeting".into()
            }
        );
        // `DE` and `de` name the same culture.
        assert_eq!(
            StringCatalog::from_json_str(r#"{ "de": { "Greeting": "Hallo" }, "DE": { "Greeting": "Moin" } }"#)
                .unwrap_err(),
            I18nError::DuplicateKey {
                locale: "de".into(),
                key: "Greeting".into()
            }
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_merges_tags_naming_the_same_culture() {
        let catalog = StringCatalog::from_json_str(
            r#"{ "de": { "Greeting": "Hallo" }, "DE": { "Farewell": "Tschüss" } }"#,
        )
        .unwrap();
        assert_eq!(catalog.locales(), vec!["de"]);
        assert_eq!(catalog.get("de", "Farewell"), Some("Tschüss"));
    }

    #[test]
    fn non_canonical_regional_tag_uses_neutral_parent() {
        let catalog = greeting_catalog();
        assert_eq!(catalog.get("de-at", "Greeting"), Some("Hallo"));
        assert_eq!(catalog.get("not a tag", "Greeting"), Some("Hello"));
    }
}
