#![forbid(unsafe_code)]

//! Resource lookup: key to localized string under the active UI culture.

use std::rc::Rc;

use crate::catalog::StringCatalog;
use crate::locale::{LanguageInfo, LanguageService};

/// Resolves a resource key under the currently active locale.
///
/// A missing key resolves to `None`; implementations never panic on
/// unknown keys.
pub trait ResourceLookup {
    fn resolve(&self, key: &str) -> Option<String>;
}

impl<F> ResourceLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// [`ResourceLookup`] over a [`StringCatalog`], reading the UI culture of
/// a shared [`LanguageService`] on every call.
pub struct CatalogLookup {
    catalog: StringCatalog,
    languages: Rc<dyn LanguageService>,
}

impl std::fmt::Debug for CatalogLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogLookup")
            .field("locales", &self.catalog.locales())
            .field("ui_culture", &self.languages.ui_culture())
            .finish()
    }
}

impl CatalogLookup {
    /// Wrap `catalog`. If it has no fallback chain yet, the default
    /// language is used as the final fallback.
    #[must_use]
    pub fn new(mut catalog: StringCatalog, languages: Rc<dyn LanguageService>) -> Self {
        if catalog.fallback_chain().is_empty() {
            catalog.set_fallback_chain(vec![LanguageInfo::DEFAULT.code.to_string()]);
        }
        Self { catalog, languages }
    }

    #[must_use]
    pub fn catalog(&self) -> &StringCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn languages(&self) -> &Rc<dyn LanguageService> {
        &self.languages
    }
}

impl ResourceLookup for CatalogLookup {
    fn resolve(&self, key: &str) -> Option<String> {
        let culture = self.languages.ui_culture();
        self.catalog.get(culture.name(), key).map(str::to_string)
    }
}
