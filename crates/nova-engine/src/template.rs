//! Controller templates and the prefab pool.
//!
//! A [`ControllerTemplate`] is an uninstantiated controller: a prototype
//! value plus the display configuration every instance starts with. The
//! [`ControllerPrefabPool`] is the read-only list of templates a window can
//! instantiate by type. It is filled once, at configuration time, and only
//! looked up afterwards.
//!
//! # Example
//!
//! ```
//! use nova_engine::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Settings;
//! impl ViewController for Settings {}
//!
//! let mut pool = ControllerPrefabPool::new();
//! pool.register(
//!     ControllerTemplate::new("Settings", Settings)
//!         .with_configuration(ViewControllerConfiguration::titled("Settings")),
//! );
//!
//! assert!(pool.find_type::<Settings>().is_some());
//! ```

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use nova_core::configuration::{clamp_presentation_duration, ViewControllerConfiguration};
use nova_core::layout::RectLayout;

use crate::controller::{controller_type, ViewController};
use crate::navigation::NavigationSettings;

type Factory = Box<dyn Fn() -> Box<dyn ViewController>>;

// ---------------------------------------------------------------------------
// ControllerTemplate
// ---------------------------------------------------------------------------

/// A reusable definition from which controller instances are created.
pub struct ControllerTemplate {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    configuration: ViewControllerConfiguration,
    presentation_duration: Option<f32>,
    navigation: Option<NavigationSettings>,
    layout: RectLayout,
    factory: Factory,
}

impl ControllerTemplate {
    /// A template whose instances are clones of `prototype`.
    pub fn new<T>(name: impl Into<String>, prototype: T) -> Self
    where
        T: ViewController + Clone,
    {
        let (type_id, type_name) = controller_type::<T>();
        Self {
            name: name.into(),
            type_id,
            type_name,
            configuration: ViewControllerConfiguration::default(),
            presentation_duration: None,
            navigation: None,
            layout: RectLayout::FILL,
            factory: Box::new(move || -> Box<dyn ViewController> { Box::new(prototype.clone()) }),
        }
    }

    pub fn with_configuration(mut self, configuration: ViewControllerConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Override the window's default presentation duration. Clamped to
    /// `0.1..=1.0` seconds.
    pub fn with_presentation_duration(mut self, seconds: f32) -> Self {
        self.presentation_duration = Some(clamp_presentation_duration(seconds));
        self
    }

    /// Give instances a navigation stack.
    pub fn with_navigation(mut self, settings: NavigationSettings) -> Self {
        self.navigation = Some(settings);
        self
    }

    /// Layout instances start with. Push and present reset it to fill the
    /// parent.
    pub fn with_layout(mut self, layout: RectLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Wrap in an `Rc` for registration or for use as an initial controller.
    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// Display name copied onto instances.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn configuration(&self) -> &ViewControllerConfiguration {
        &self.configuration
    }

    pub fn presentation_duration(&self) -> Option<f32> {
        self.presentation_duration
    }

    pub fn navigation(&self) -> Option<&NavigationSettings> {
        self.navigation.as_ref()
    }

    pub fn layout(&self) -> &RectLayout {
        &self.layout
    }

    /// Whether instances of this template are of type `T`.
    pub fn is<T: ViewController>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub(crate) fn instantiate(&self) -> Box<dyn ViewController> {
        (self.factory)()
    }
}

impl fmt::Debug for ControllerTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerTemplate")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("configuration", &self.configuration)
            .field("presentation_duration", &self.presentation_duration)
            .field("navigation", &self.navigation)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ControllerPrefabPool
// ---------------------------------------------------------------------------

/// The templates a window can instantiate, searched in registration order.
#[derive(Debug, Default)]
pub struct ControllerPrefabPool {
    templates: Vec<Rc<ControllerTemplate>>,
}

impl ControllerPrefabPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template. Returns `self` for chaining.
    pub fn register(&mut self, template: ControllerTemplate) -> &mut Self {
        self.templates.push(Rc::new(template));
        self
    }

    /// Add an already shared template.
    pub fn register_shared(&mut self, template: Rc<ControllerTemplate>) -> &mut Self {
        self.templates.push(template);
        self
    }

    /// First template whose instances have type `type_id`.
    pub fn find(&self, type_id: TypeId) -> Option<Rc<ControllerTemplate>> {
        self.templates
            .iter()
            .find(|t| t.type_id == type_id)
            .cloned()
    }

    pub fn find_type<T: ViewController>(&self) -> Option<Rc<ControllerTemplate>> {
        self.find(TypeId::of::<T>())
    }

    /// First template with the given display name.
    pub fn find_by_name(&self, name: &str) -> Option<Rc<ControllerTemplate>> {
        self.templates.iter().find(|t| t.name == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControllerTemplate> {
        self.templates.iter().map(|t| t.as_ref())
    }
}
