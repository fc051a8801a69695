#![forbid(unsafe_code)]

//! String-resource bindings and the registry that refreshes them.
//!
//! # Design
//!
//! A binding starts as a [`StringRes`]: a key with no target. When the UI
//! layer is ready to consume a value it calls [`BindingRegistry::attach`]
//! with the target context. If the context names a dependency property on
//! a dependency object, the registry keeps a [`Registration`] holding a
//! `Weak` handle to the object and returns the resolved string; otherwise
//! the binding comes back untouched as [`ProvidedValue::Deferred`].
//!
//! On a language change, [`BindingRegistry::refresh_all`] resolves every
//! live registration again and writes the result into its target. Entries
//! whose target has been dropped are removed at the end of that sweep.
//!
//! # Invariants
//!
//! 1. A binding is registered at most once, and only after a successful
//!    attach. `attach` consumes the [`StringRes`], so a registered binding
//!    cannot be attached twice.
//! 2. The registry never holds a strong reference to a target.
//! 3. After attach, `refresh_all` is the only writer of bound properties.
//!    The initial value is returned to the caller, not written.
//! 4. Dead entries leave the registry during the next sweep, never before.
//! 5. Writes are not gated on change: two sweeps without a locale change
//!    perform the same writes.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Missing resource | Key not in any table | `None` is provided/written |
//! | Attach rejected | No context, plain object, or member property | `Deferred(binding)`, nothing registered |
//! | Stale target write | Target refuses the write | Logged, counted, entry kept |
//! | Re-entrant attach | Target callback attaches during a sweep | New entry waits for next sweep |
//!
//! The registry is single-threaded (`!Send`): construct it once on the UI
//! thread and share it by `Rc`.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span, warn};

use crate::locale::{LanguageService, Subscription};
use crate::lookup::ResourceLookup;
use crate::target::{DependencyObject, DependencyProperty, ProvideValueTarget};

/// Identity of a binding, unique within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A binding that has been created but not attached to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringRes {
    id: BindingId,
    key: String,
}

impl StringRes {
    #[must_use]
    pub fn id(&self) -> BindingId {
        self.id
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Outcome of [`BindingRegistry::attach`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvidedValue {
    /// The binding is registered; this is its initial value. `None` means
    /// the resource is missing.
    Resolved(Option<String>),
    /// The context was not bindable. The binding is handed back unregistered.
    Deferred(StringRes),
}

impl ProvidedValue {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The resolved string, if registration succeeded and the resource
    /// exists.
    #[must_use]
    pub fn as_resolved(&self) -> Option<&str> {
        match self {
            Self::Resolved(value) => value.as_deref(),
            Self::Deferred(_) => None,
        }
    }

    /// Text to show: the resolved string, or the raw key when the binding
    /// was deferred or the resource is missing.
    #[must_use]
    pub fn display_text<'a>(&'a self, key: &'a str) -> &'a str {
        match self {
            Self::Resolved(Some(value)) => value,
            Self::Resolved(None) => key,
            Self::Deferred(binding) => binding.key(),
        }
    }
}

/// An attached binding as stored in the registry.
pub struct Registration {
    id: BindingId,
    key: String,
    target: Weak<dyn DependencyObject>,
    property: DependencyProperty,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("property", &self.property)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl Registration {
    #[must_use]
    pub fn id(&self) -> BindingId {
        self.id
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn property(&self) -> DependencyProperty {
        self.property
    }

    /// Whether the target object still exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }
}

/// Counters from the most recent [`BindingRegistry::refresh_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Entries found alive at the start of the sweep.
    pub live: usize,
    /// Live entries whose write succeeded.
    pub updated: usize,
    /// Live entries whose write was refused.
    pub failed: usize,
    /// Dead entries removed at the end of the sweep.
    pub pruned: usize,
}

/// Process-wide set of attached string bindings.
pub struct BindingRegistry {
    lookup: Rc<dyn ResourceLookup>,
    entries: RefCell<Vec<Registration>>,
    next_id: Cell<u64>,
    sweeps: Cell<u64>,
    last_sweep: Cell<SweepStats>,
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("entries", &self.entries.borrow().len())
            .field("sweeps", &self.sweeps.get())
            .field("last_sweep", &self.last_sweep.get())
            .finish()
    }
}

impl BindingRegistry {
    #[must_use]
    pub fn new(lookup: Rc<dyn ResourceLookup>) -> Self {
        Self {
            lookup,
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            sweeps: Cell::new(0),
            last_sweep: Cell::new(SweepStats::default()),
        }
    }

    /// Create an unattached binding for `key`. Does not resolve anything.
    pub fn create_binding(&self, key: impl Into<String>) -> StringRes {
        let id = BindingId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        StringRes {
            id,
            key: key.into(),
        }
    }

    /// Attach `binding` to the target described by `target`.
    ///
    /// On success the binding is registered and its initial value is
    /// returned for the caller to apply; the registry does not write it.
    /// Without a bindable context the binding is returned as
    /// [`ProvidedValue::Deferred`] and nothing is registered.
    pub fn attach(&self, binding: StringRes, target: Option<&ProvideValueTarget>) -> ProvidedValue {
        let Some((object, property)) = target.and_then(ProvideValueTarget::bindable) else {
            debug!(
                id = %binding.id,
                key = binding.key.as_str(),
                "binding deferred: target is not bindable"
            );
            return ProvidedValue::Deferred(binding);
        };

        debug!(
            id = %binding.id,
            key = binding.key.as_str(),
            target = object.type_name(),
            property = property.name(),
            "binding added"
        );
        let value = self.lookup.resolve(&binding.key);
        self.entries.borrow_mut().push(Registration {
            id: binding.id,
            key: binding.key,
            target: Rc::downgrade(object),
            property,
        });
        ProvidedValue::Resolved(value)
    }

    /// Resolve `key` once without registering anything.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.lookup.resolve(key)
    }

    /// Re-resolve every live binding and write the value into its target,
    /// then drop the entries whose target is gone.
    ///
    /// A refused write is logged and skipped; it never stops the sweep.
    /// Bindings attached while the sweep is writing wait for the next one.
    pub fn refresh_all(&self) {
        let sweep = self.sweeps.get() + 1;
        self.sweeps.set(sweep);
        let _span = debug_span!("refresh_all", sweep).entered();

        let (live, dead) = {
            let entries = self.entries.borrow();
            let mut live = Vec::with_capacity(entries.len());
            let mut dead = HashSet::new();
            for entry in entries.iter() {
                match entry.target.upgrade() {
                    Some(object) => live.push((entry.id, entry.key.clone(), object, entry.property)),
                    None => {
                        dead.insert(entry.id);
                    }
                }
            }
            (live, dead)
        };

        let mut stats = SweepStats {
            live: live.len(),
            ..SweepStats::default()
        };
        for (id, key, object, property) in &live {
            let value = self.lookup.resolve(key);
            match object.set_value(*property, value.as_deref()) {
                Ok(()) => stats.updated += 1,
                Err(err) => {
                    stats.failed += 1;
                    warn!(
                        id = %id,
                        key = key.as_str(),
                        target = object.type_name(),
                        property = property.name(),
                        error = %err,
                        "failed to update binding target"
                    );
                }
            }
        }
        // Strong handles end here.
        drop(live);

        if !dead.is_empty() {
            self.entries
                .borrow_mut()
                .retain(|entry| !dead.contains(&entry.id));
        }
        stats.pruned = dead.len();

        debug!(
            live = stats.live,
            updated = stats.updated,
            failed = stats.failed,
            pruned = stats.pruned,
            "sweep complete"
        );
        self.last_sweep.set(stats);
    }

    /// Run [`refresh_all`](Self::refresh_all) after every culture change
    /// announced by `service`, for as long as the returned guard lives.
    ///
    /// The subscription holds the registry weakly.
    pub fn follow(self: &Rc<Self>, service: &dyn LanguageService) -> Subscription {
        let registry = Rc::downgrade(self);
        service.on_culture_changed(Box::new(move |_| {
            if let Some(registry) = registry.upgrade() {
                registry.refresh_all();
            }
        }))
    }

    /// Number of registered entries, dead ones included until the next sweep.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: BindingId) -> bool {
        self.entries.borrow().iter().any(|entry| entry.id == id)
    }

    /// Borrow the registered entries, in registration order.
    ///
    /// The borrow must be released before calling `attach` or
    /// `refresh_all`.
    #[must_use]
    pub fn entries(&self) -> Ref<'_, [Registration]> {
        Ref::map(self.entries.borrow(), Vec::as_slice)
    }

    /// Keys of all registered entries, in registration order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Entries whose target is still alive right now.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.is_alive())
            .count()
    }

    /// Number of completed sweeps.
    #[must_use]
    pub fn sweep_count(&self) -> u64 {
        self.sweeps.get()
    }

    #[must_use]
    pub fn last_sweep(&self) -> SweepStats {
        self.last_sweep.get()
    }
}
