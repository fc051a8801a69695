#![forbid(unsafe_code)]

//! UI targets that bindings write into.
//!
//! A [`DependencyObject`] is any UI object whose lifetime is owned by the
//! UI layer through `Rc`, exposing string-valued [`DependencyProperty`]
//! slots. Bindings keep only `Weak` handles to such objects.
//!
//! [`ProvideValueTarget`] is the context a UI layer passes when it asks
//! for a value: which object and which property the value is meant for.
//! Only a dependency object paired with a dependency property can be bound;
//! plain objects and member properties are reported as not bindable.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Handle identifying a writable slot on a [`DependencyObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyProperty {
    name: &'static str,
    read_only: bool,
}

impl DependencyProperty {
    /// A writable property.
    #[must_use]
    pub const fn register(name: &'static str) -> Self {
        Self {
            name,
            read_only: false,
        }
    }

    /// A property that rejects every external write.
    #[must_use]
    pub const fn register_read_only(name: &'static str) -> Self {
        Self {
            name,
            read_only: true,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl fmt::Display for DependencyProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Why a target refused a property write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetValueError {
    /// The property does not accept external writes.
    ReadOnly { property: &'static str },
    /// The object has been torn down by its owner and accepts no writes.
    Sealed,
    /// The object rejected the value itself.
    Rejected {
        property: &'static str,
        reason: String,
    },
}

impl fmt::Display for SetValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly { property } => write!(f, "property '{property}' is read-only"),
            Self::Sealed => f.write_str("target object is sealed"),
            Self::Rejected { property, reason } => {
                write!(f, "value for '{property}' rejected: {reason}")
            }
        }
    }
}

impl std::error::Error for SetValueError {}

/// A UI object with string-valued dependency properties.
///
/// `None` means "no value available" (a missing resource) and clears the
/// property.
pub trait DependencyObject {
    /// Short type label for diagnostics, e.g. `"Button"`.
    fn type_name(&self) -> &str;

    fn set_value(
        &self,
        property: DependencyProperty,
        value: Option<&str>,
    ) -> Result<(), SetValueError>;

    fn get_value(&self, property: DependencyProperty) -> Option<String>;
}

/// The object a value is being provided for.
#[derive(Clone)]
pub enum TargetObject {
    /// A bindable UI object.
    Dependency(Rc<dyn DependencyObject>),
    /// Anything else (a style setter, a plain data object, ...).
    Plain(Rc<dyn Any>),
}

impl fmt::Debug for TargetObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dependency(obj) => f.debug_tuple("Dependency").field(&obj.type_name()).finish(),
            Self::Plain(_) => f.debug_tuple("Plain").finish_non_exhaustive(),
        }
    }
}

/// The property a value is being provided for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetProperty {
    Dependency(DependencyProperty),
    /// A plain field or accessor; not observable, so not bindable.
    Member(&'static str),
}

/// Context passed to `attach`: where the provided value will land.
#[derive(Debug, Clone)]
pub struct ProvideValueTarget {
    pub object: TargetObject,
    pub property: TargetProperty,
}

impl ProvideValueTarget {
    /// Target a dependency property on a UI object.
    #[must_use]
    pub fn new<T: DependencyObject + 'static>(object: &Rc<T>, property: DependencyProperty) -> Self {
        let object: Rc<dyn DependencyObject> = Rc::clone(object) as Rc<dyn DependencyObject>;
        Self {
            object: TargetObject::Dependency(object),
            property: TargetProperty::Dependency(property),
        }
    }

    /// The bindable `(object, property)` pair, if this context has one.
    #[must_use]
    pub fn bindable(&self) -> Option<(&Rc<dyn DependencyObject>, DependencyProperty)> {
        match (&self.object, self.property) {
            (TargetObject::Dependency(obj), TargetProperty::Dependency(prop)) => Some((obj, prop)),
            _ => None,
        }
    }
}

type Validator = Box<dyn Fn(DependencyProperty, Option<&str>) -> Result<(), String>>;

/// A minimal UI element backed by a property map.
///
/// Used by the demo window and by tests. [`seal`](Self::seal) simulates an
/// owner tearing the element down while handles to it are still around.
pub struct Element {
    type_name: &'static str,
    name: String,
    values: RefCell<HashMap<&'static str, String>>,
    sealed: Cell<bool>,
    writes: Cell<u64>,
    validator: RefCell<Option<Validator>>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("values", &self.values.borrow())
            .field("sealed", &self.sealed.get())
            .finish()
    }
}

impl Element {
    pub const TEXT: DependencyProperty = DependencyProperty::register("Text");
    pub const CONTENT: DependencyProperty = DependencyProperty::register("Content");
    pub const TITLE: DependencyProperty = DependencyProperty::register("Title");
    pub const TOOL_TIP: DependencyProperty = DependencyProperty::register("ToolTip");
    pub const NAME: DependencyProperty = DependencyProperty::register_read_only("Name");

    #[must_use]
    pub fn new(type_name: &'static str, name: impl Into<String>) -> Rc<Self> {
        let name = name.into();
        let mut values = HashMap::new();
        values.insert(Self::NAME.name(), name.clone());
        Rc::new(Self {
            type_name,
            name,
            values: RefCell::new(values),
            sealed: Cell::new(false),
            writes: Cell::new(0),
            validator: RefCell::new(None),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reject all further writes.
    pub fn seal(&self) {
        self.sealed.set(true);
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed.get()
    }

    /// Number of accepted writes so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.get()
    }

    /// Install a check run before every write.
    pub fn set_validator(
        &self,
        validator: impl Fn(DependencyProperty, Option<&str>) -> Result<(), String> + 'static,
    ) {
        *self.validator.borrow_mut() = Some(Box::new(validator));
    }

    /// Convenience accessor for [`Element::TEXT`].
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.get_value(Self::TEXT)
    }
}

impl DependencyObject for Element {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn set_value(
        &self,
        property: DependencyProperty,
        value: Option<&str>,
    ) -> Result<(), SetValueError> {
        if self.sealed.get() {
            return Err(SetValueError::Sealed);
        }
        if property.is_read_only() {
            return Err(SetValueError::ReadOnly {
                property: property.name(),
            });
        }
        if let Some(validator) = self.validator.borrow().as_ref() {
            validator(property, value).map_err(|reason| SetValueError::Rejected {
                property: property.name(),
                reason,
            })?;
        }

        let mut values = self.values.borrow_mut();
        match value {
            Some(v) => {
                values.insert(property.name(), v.to_string());
            }
            None => {
                values.remove(property.name());
            }
        }
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn get_value(&self, property: DependencyProperty) -> Option<String> {
        self.values.borrow().get(property.name()).cloned()
    }
}
