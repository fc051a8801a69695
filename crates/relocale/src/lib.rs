#![forbid(unsafe_code)]

//! Runtime language switching for string bindings.
//!
//! UI code asks a [`BindingRegistry`] to resolve a resource key for a
//! specific property of a specific UI object. The registry remembers the
//! pairing through a weak handle, and when the language changes it pushes
//! the new translation into every object that is still alive, dropping
//! the entries whose objects are gone.
//!
//! ```
//! use std::rc::Rc;
//! use relocale::{
//!     BindingRegistry, CatalogLookup, CultureInfo, DefaultLanguageService, Element,
//!     LanguageService, ProvideValueTarget, StringCatalog,
//! };
//!
//! let mut catalog = StringCatalog::new();
//! catalog.add_locale("en", [("Greeting", "Hello")].into_iter().collect());
//! catalog.add_locale("de", [("Greeting", "Hallo")].into_iter().collect());
//!
//! let languages = Rc::new(DefaultLanguageService::default());
//! let lookup = CatalogLookup::new(catalog, languages.clone());
//! let registry = Rc::new(BindingRegistry::new(Rc::new(lookup)));
//! let _follow = registry.follow(&*languages);
//!
//! let label = Element::new("TextBlock", "greeting");
//! let binding = registry.create_binding("Greeting");
//! let initial = registry.attach(binding, Some(&ProvideValueTarget::new(&label, Element::TEXT)));
//! assert_eq!(initial.as_resolved(), Some("Hello"));
//!
//! languages.set_ui_culture(CultureInfo::new("de").unwrap());
//! assert_eq!(label.text().as_deref(), Some("Hallo"));
//! ```

pub mod binding;
pub mod catalog;
pub mod locale;
pub mod lookup;
pub mod target;

pub use binding::{BindingId, BindingRegistry, ProvidedValue, Registration, StringRes, SweepStats};
pub use catalog::{I18nError, LocaleStrings, StringCatalog};
pub use locale::{
    CultureInfo, DefaultLanguageService, LanguageChanged, LanguageInfo, LanguageService,
    SUPPORTED_LANGUAGES, Subscription,
};
pub use lookup::{CatalogLookup, ResourceLookup};
pub use target::{
    DependencyObject, DependencyProperty, Element, ProvideValueTarget, SetValueError,
    TargetObject, TargetProperty,
};
