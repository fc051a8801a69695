#![forbid(unsafe_code)]

//! Cultures, the supported-language list, and the language service that
//! announces culture changes.
//!
//! # Design
//!
//! [`DefaultLanguageService`] keeps the formatting culture and the UI
//! culture behind `RefCell`s and hands out change notifications to
//! subscribers held as `Weak` callbacks. Dropping the returned
//! [`Subscription`] unsubscribes; dead entries are pruned on the next
//! notification.
//!
//! # Invariants
//!
//! 1. Setting a culture equal to the current one is a no-op (no event).
//! 2. Subscribers are notified in registration order.
//! 3. No borrow is held while subscriber callbacks run, so a callback may
//!    read the service back.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::info;

use crate::catalog::I18nError;

/// A validated culture tag such as `en`, `de` or `de-AT`.
///
/// Tags are normalized on construction: the language subtag is lowercased
/// and a two-letter region subtag is uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CultureInfo {
    name: String,
}

impl CultureInfo {
    /// Parse and normalize a culture tag.
    ///
    /// The first subtag must be 2-3 ASCII letters; every following subtag
    /// (separated by `-`) must be 1-8 ASCII alphanumerics.
    pub fn new(tag: &str) -> Result<Self, I18nError> {
        let invalid = || I18nError::InvalidLocale(tag.to_string());
        let mut subtags = tag.split('-');

        let language = subtags.next().ok_or_else(invalid)?;
        if !(2..=3).contains(&language.len()) || !language.bytes().all(|b| b.is_ascii_alphabetic())
        {
            return Err(invalid());
        }

        let mut name = language.to_ascii_lowercase();
        for subtag in subtags {
            if !(1..=8).contains(&subtag.len()) || !subtag.bytes().all(|b| b.is_ascii_alphanumeric())
            {
                return Err(invalid());
            }
            name.push('-');
            if subtag.len() == 2 && subtag.bytes().all(|b| b.is_ascii_alphabetic()) {
                name.push_str(&subtag.to_ascii_uppercase());
            } else {
                name.push_str(subtag);
            }
        }

        Ok(Self { name })
    }

    /// The normalized tag, e.g. `"de-AT"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The language subtag, e.g. `"de"` for `"de-AT"`.
    #[must_use]
    pub fn two_letter_language(&self) -> &str {
        self.name.split('-').next().unwrap_or(&self.name)
    }

    /// Whether this culture has no region or script subtags.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        !self.name.contains('-')
    }

    /// The neutral parent culture (`de-AT` -> `de`); neutral cultures
    /// return themselves.
    #[must_use]
    pub fn neutral(&self) -> Self {
        Self {
            name: self.two_letter_language().to_string(),
        }
    }
}

impl fmt::Display for CultureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl std::str::FromStr for CultureInfo {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A language offered to the user: its native display name and code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    pub native_name: &'static str,
    pub code: &'static str,
}

impl LanguageInfo {
    /// The default language.
    pub const DEFAULT: Self = SUPPORTED_LANGUAGES[0];

    /// This language's code as a culture.
    #[must_use]
    pub fn culture(&self) -> CultureInfo {
        CultureInfo {
            name: self.code.to_string(),
        }
    }

    /// Find a supported language by code (exact match on the language
    /// subtag, so `de-AT` finds Deutsch).
    #[must_use]
    pub fn find(code: &str) -> Option<Self> {
        let language = code.split('-').next().unwrap_or(code);
        SUPPORTED_LANGUAGES
            .iter()
            .copied()
            .find(|info| info.code.eq_ignore_ascii_case(language))
    }
}

/// Languages the application ships tables for. The first entry is the
/// default.
pub const SUPPORTED_LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo {
        native_name: "English",
        code: "en",
    },
    LanguageInfo {
        native_name: "Deutsch",
        code: "de",
    },
];

/// Event payload delivered to culture-change subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageChanged {
    /// Culture used for formatting numbers and dates.
    pub culture: CultureInfo,
    /// Culture used for resource lookup.
    pub ui_culture: CultureInfo,
}

/// Service for switching cultures at runtime.
///
/// All methods take `&self`; implementations are single-threaded and use
/// interior mutability so the service can be shared through `Rc`.
pub trait LanguageService {
    /// Current formatting culture.
    fn culture(&self) -> CultureInfo;

    /// Current UI (resource lookup) culture.
    fn ui_culture(&self) -> CultureInfo;

    /// Change the formatting culture. Returns whether it changed.
    fn set_culture(&self, culture: CultureInfo) -> bool;

    /// Change the UI culture. Returns whether it changed.
    fn set_ui_culture(&self, culture: CultureInfo) -> bool;

    /// Subscribe to culture changes. The callback runs after each change
    /// until the returned guard is dropped.
    fn on_culture_changed(&self, callback: Box<dyn Fn(&LanguageChanged)>) -> Subscription;
}

type ChangedRc = Rc<dyn Fn(&LanguageChanged)>;
type ChangedWeak = Weak<dyn Fn(&LanguageChanged)>;

#[derive(Debug, Clone)]
struct Cultures {
    culture: CultureInfo,
    ui_culture: CultureInfo,
}

/// In-memory [`LanguageService`].
pub struct DefaultLanguageService {
    cultures: RefCell<Cultures>,
    /// Dead entries are pruned on notify.
    subscribers: RefCell<Vec<ChangedWeak>>,
}

impl fmt::Debug for DefaultLanguageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cultures = self.cultures.borrow();
        f.debug_struct("DefaultLanguageService")
            .field("culture", &cultures.culture)
            .field("ui_culture", &cultures.ui_culture)
            .field("subscriber_count", &self.subscribers.borrow().len())
            .finish()
    }
}

impl Default for DefaultLanguageService {
    fn default() -> Self {
        let culture = LanguageInfo::DEFAULT.culture();
        Self::new(culture.clone(), culture)
    }
}

impl DefaultLanguageService {
    #[must_use]
    pub fn new(culture: CultureInfo, ui_culture: CultureInfo) -> Self {
        Self {
            cultures: RefCell::new(Cultures {
                culture,
                ui_culture,
            }),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Move the UI culture to the next supported language, wrapping
    /// around. An unsupported current culture switches to the default.
    pub fn toggle_ui_language(&self) -> CultureInfo {
        let current = self.ui_culture();
        let next = SUPPORTED_LANGUAGES
            .iter()
            .position(|info| info.code == current.two_letter_language())
            .map_or(LanguageInfo::DEFAULT, |idx| {
                SUPPORTED_LANGUAGES[(idx + 1) % SUPPORTED_LANGUAGES.len()]
            })
            .culture();
        self.set_ui_culture(next.clone());
        next
    }

    /// Number of registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    fn notify(&self) {
        let callbacks: Vec<ChangedRc> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(|w| w.upgrade()).collect()
        };

        let event = {
            let cultures = self.cultures.borrow();
            LanguageChanged {
                culture: cultures.culture.clone(),
                ui_culture: cultures.ui_culture.clone(),
            }
        };
        info!(
            culture = %event.culture,
            ui_culture = %event.ui_culture,
            subscribers = callbacks.len(),
            "culture changed"
        );
        for cb in &callbacks {
            cb(&event);
        }
    }
}

impl LanguageService for DefaultLanguageService {
    fn culture(&self) -> CultureInfo {
        self.cultures.borrow().culture.clone()
    }

    fn ui_culture(&self) -> CultureInfo {
        self.cultures.borrow().ui_culture.clone()
    }

    fn set_culture(&self, culture: CultureInfo) -> bool {
        {
            let mut cultures = self.cultures.borrow_mut();
            if cultures.culture == culture {
                return false;
            }
            cultures.culture = culture;
        }
        self.notify();
        true
    }

    fn set_ui_culture(&self, culture: CultureInfo) -> bool {
        {
            let mut cultures = self.cultures.borrow_mut();
            if cultures.ui_culture == culture {
                return false;
            }
            cultures.ui_culture = culture;
        }
        self.notify();
        true
    }

    fn on_culture_changed(&self, callback: Box<dyn Fn(&LanguageChanged)>) -> Subscription {
        let strong: ChangedRc = Rc::from(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }
}

/// RAII guard for a culture-change callback.
///
/// Dropping it drops the only strong reference to the callback, so the
/// service's weak entry stops upgrading and is pruned on the next change.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn culture(tag: &str) -> CultureInfo {
        CultureInfo::new(tag).unwrap()
    }

    #[test]
    fn culture_tags_normalize() {
        assert_eq!(culture("EN").name(), "en");
        assert_eq!(culture("de-at").name(), "de-AT");
        assert_eq!(culture("zh-Hant-TW").name(), "zh-Hant-TW");
        assert_eq!(culture("es-419").name(), "es-419");
    }

    #[test]
    fn culture_tags_reject_garbage() {
        for bad in ["", "e", "english", "de_AT", "de-", "-de", "de-toolongsubtag", "d3"] {
            assert_eq!(
                CultureInfo::new(bad),
                Err(I18nError::InvalidLocale(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn neutral_parent() {
        let at = culture("de-AT");
        assert_eq!(at.two_letter_language(), "de");
        assert!(!at.is_neutral());
        assert_eq!(at.neutral(), culture("de"));
        assert!(culture("de").is_neutral());
    }

    #[test]
    fn supported_languages_catalog() {
        assert_eq!(LanguageInfo::DEFAULT.code, "en");
        assert_eq!(SUPPORTED_LANGUAGES.len(), 2);
        assert_eq!(LanguageInfo::find("de-AT").map(|l| l.native_name), Some("Deutsch"));
        assert_eq!(LanguageInfo::find("fr"), None);
        assert_eq!(LanguageInfo::DEFAULT.culture(), culture("en"));
    }

    #[test]
    fn setting_same_culture_is_noop() {
        let service = DefaultLanguageService::default();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _sub = service.on_culture_changed(Box::new(move |_| {
            count_clone.set(count_clone.get() + 1);
        }));

        assert!(!service.set_ui_culture(culture("en")));
        assert_eq!(count.get(), 0);

        assert!(service.set_ui_culture(culture("de")));
        assert_eq!(count.get(), 1);
        assert_eq!(service.ui_culture(), culture("de"));
        assert_eq!(service.culture(), culture("en"));
    }

    #[test]
    fn event_carries_both_cultures() {
        let service = DefaultLanguageService::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = service.on_culture_changed(Box::new(move |ev| {
            seen_clone.borrow_mut().push(ev.clone());
        }));

        service.set_culture(culture("de-DE"));
        service.set_ui_culture(culture("de"));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].culture, culture("de-DE"));
        assert_eq!(seen[0].ui_culture, culture("en"));
        assert_eq!(seen[1].ui_culture, culture("de"));
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let service = DefaultLanguageService::default();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let sub = service.on_culture_changed(Box::new(move |_| {
            count_clone.set(count_clone.get() + 1);
        }));
        let _other = service.on_culture_changed(Box::new(|_| {}));
        assert_eq!(service.subscriber_count(), 2);

        drop(sub);
        service.set_ui_culture(culture("de"));
        assert_eq!(count.get(), 0);
        assert_eq!(service.subscriber_count(), 1);
    }

    #[test]
    fn notification_order_is_registration_order() {
        let service = DefaultLanguageService::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        let subs: Vec<Subscription> = ['A', 'B', 'C']
            .into_iter()
            .map(|tag| {
                let log = Rc::clone(&log);
                service.on_culture_changed(Box::new(move |_| log.borrow_mut().push(tag)))
            })
            .collect();

        service.set_ui_culture(culture("de"));
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
        drop(subs);
    }

    #[test]
    fn callback_may_read_service_back() {
        let service = Rc::new(DefaultLanguageService::default());
        let observed = Rc::new(RefCell::new(None));
        let observed_clone = Rc::clone(&observed);
        let weak = Rc::downgrade(&service);
        let _sub = service.on_culture_changed(Box::new(move |_| {
            if let Some(service) = weak.upgrade() {
                *observed_clone.borrow_mut() = Some(service.ui_culture());
            }
        }));

        service.set_ui_culture(culture("de"));
        assert_eq!(*observed.borrow(), Some(culture("de")));
    }

    #[test]
    fn toggle_cycles_supported_languages() {
        let service = DefaultLanguageService::default();
        assert_eq!(service.toggle_ui_language(), culture("de"));
        assert_eq!(service.toggle_ui_language(), culture("en"));

        service.set_ui_culture(culture("fr"));
        assert_eq!(service.toggle_ui_language(), culture("en"));

        service.set_ui_culture(culture("de-AT"));
        assert_eq!(service.toggle_ui_language(), culture("en"));
    }
}
