#![forbid(unsafe_code)]

//! The demo window: a title, a greeting and a language-switch button, all
//! bound to resource keys.

use std::io::{self, Write};
use std::rc::Rc;

use relocale::{
    BindingRegistry, CatalogLookup, CultureInfo, DefaultLanguageService, DependencyObject,
    DependencyProperty, Element, LanguageInfo, LanguageService, ProvideValueTarget, ProvidedValue,
    StringCatalog, StringRes, Subscription, TargetObject, TargetProperty,
};
use tracing::{debug, warn};

/// Whether the command loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

struct ChildSpec {
    type_name: &'static str,
    name: &'static str,
    bindings: &'static [(DependencyProperty, &'static str)],
}

const CHILDREN: &[ChildSpec] = &[
    ChildSpec {
        type_name: "TextBlock",
        name: "greeting",
        bindings: &[(Element::TEXT, "Greeting")],
    },
    ChildSpec {
        type_name: "Button",
        name: "switch",
        bindings: &[
            (Element::CONTENT, "SwitchLanguage"),
            (Element::TOOL_TIP, "SwitchLanguageHint"),
        ],
    },
];

const RENDERED: &[DependencyProperty] = &[
    Element::TITLE,
    Element::TEXT,
    Element::CONTENT,
    Element::TOOL_TIP,
];

pub struct MainWindow {
    languages: Rc<DefaultLanguageService>,
    registry: Rc<BindingRegistry>,
    window: Rc<Element>,
    children: Vec<Rc<Element>>,
    /// Bindings whose target could not be observed; they keep showing keys.
    deferred: Vec<StringRes>,
    _follow: Subscription,
}

impl MainWindow {
    pub fn new(catalog: StringCatalog, ui_culture: CultureInfo) -> Self {
        let languages = Rc::new(DefaultLanguageService::new(
            LanguageInfo::DEFAULT.culture(),
            ui_culture,
        ));
        let lookup = CatalogLookup::new(catalog, languages.clone());
        let registry = Rc::new(BindingRegistry::new(Rc::new(lookup)));
        let follow = registry.follow(&*languages);

        let mut window = Self {
            languages,
            registry,
            window: Element::new("Window", "main"),
            children: Vec::new(),
            deferred: Vec::new(),
            _follow: follow,
        };
        window.initialize_component();
        window
    }

    fn initialize_component(&mut self) {
        let root = Rc::clone(&self.window);
        self.bind(&root, Element::TITLE, "WindowTitle");

        for spec in CHILDREN {
            let el = Element::new(spec.type_name, spec.name);
            for &(property, key) in spec.bindings {
                self.bind(&el, property, key);
            }
            self.children.push(el);
        }

        // Accessibility names are plain members, not observable properties.
        if let Some(button) = self.child("switch") {
            let ctx = ProvideValueTarget {
                object: TargetObject::Dependency(button),
                property: TargetProperty::Member("AutomationName"),
            };
            let binding = self.registry.create_binding("SwitchLanguage");
            if let ProvidedValue::Deferred(binding) = self.registry.attach(binding, Some(&ctx)) {
                self.deferred.push(binding);
            }
        }
    }

    fn bind(&mut self, el: &Rc<Element>, property: DependencyProperty, key: &str) {
        let binding = self.registry.create_binding(key);
        match self
            .registry
            .attach(binding, Some(&ProvideValueTarget::new(el, property)))
        {
            ProvidedValue::Resolved(value) => {
                if let Err(err) = el.set_value(property, value.as_deref()) {
                    warn!(key, element = el.name(), error = %err, "initial value rejected");
                }
            }
            ProvidedValue::Deferred(binding) => self.deferred.push(binding),
        }
    }

    fn child(&self, name: &str) -> Option<Rc<Element>> {
        self.children.iter().find(|el| el.name() == name).cloned()
    }

    #[must_use]
    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    #[must_use]
    pub fn ui_culture(&self) -> CultureInfo {
        self.languages.ui_culture()
    }

    /// Current value of `property` on the element called `name`.
    #[must_use]
    pub fn value_of(&self, name: &str, property: DependencyProperty) -> Option<String> {
        if self.window.name() == name {
            return self.window.get_value(property);
        }
        self.child(name).and_then(|el| el.get_value(property))
    }

    /// The language-switch button: move to the next supported language.
    pub fn click_switch_language(&self) -> CultureInfo {
        self.languages.toggle_ui_language()
    }

    /// Drop an element. Its bindings are reclaimed on the next sweep.
    pub fn close(&mut self, name: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|el| el.name() != name);
        let closed = self.children.len() != before;
        if closed {
            debug!(element = name, "element closed");
        }
        closed
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        for el in std::iter::once(&self.window).chain(&self.children) {
            write!(out, "[{} {}]", el.type_name(), el.name())?;
            for property in RENDERED {
                if let Some(value) = el.get_value(*property) {
                    write!(out, " {property}={value:?}")?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Run one command line.
    pub fn execute(&mut self, line: &str, out: &mut impl Write) -> io::Result<Flow> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Flow::Continue);
        };
        let arg = words.next();

        match (command, arg) {
            ("switch", None) => {
                let culture = self.click_switch_language();
                let native = LanguageInfo::find(culture.name()).map_or("?", |l| l.native_name);
                writeln!(out, "language: {native} ({culture})")?;
            }
            ("lang", Some(tag)) => match CultureInfo::new(tag) {
                Ok(culture) => {
                    if !self.languages.set_ui_culture(culture.clone()) {
                        writeln!(out, "already using {culture}")?;
                    } else {
                        writeln!(out, "language: {culture}")?;
                    }
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            ("close", Some(name)) => {
                if self.close(name) {
                    writeln!(out, "closed {name}")?;
                } else {
                    writeln!(out, "no element named {name}")?;
                }
            }
            ("show", None) => self.render(out)?,
            ("stats", None) => {
                let stats = self.registry.last_sweep();
                writeln!(
                    out,
                    "bindings={} live={} deferred={} sweeps={} last: updated={} failed={} pruned={}",
                    self.registry.len(),
                    self.registry.live_count(),
                    self.deferred.len(),
                    self.registry.sweep_count(),
                    stats.updated,
                    stats.failed,
                    stats.pruned,
                )?;
            }
            ("quit" | "exit", None) => return Ok(Flow::Quit),
            _ => writeln!(out, "unknown command: {line}")?,
        }
        Ok(Flow::Continue)
    }
}
