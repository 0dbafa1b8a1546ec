//! Component registry
//!
//! A `component "<type>" { ... }` block is decoded by the factory registered
//! under `<type>`. The set of types is fixed when the registry is built;
//! configuration documents can only pick from it, never extend it. A type
//! that is not registered is a fatal [`UnknownComponentType`] error.
//!
//! [`UnknownComponentType`]: crate::error::ErrorKind::UnknownComponentType

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use hcl::Body;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::context::EvaluationContext;
use crate::decode::{build, evaluate_body};
use crate::error::{Diagnostics, Error, Result};
use crate::schema::Shape;
use crate::value::Value;

/// Capability every decoded component config provides
pub trait ComponentConfig: fmt::Debug + Send + Sync {
    /// Human-readable summary of the resolved attributes
    fn describe(&self) -> String;

    /// Constraints that cannot be expressed in the attribute shape
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// A component type decodable through serde
///
/// Implement this for a config struct and register it with
/// [`ComponentRegistry::register_type`].
pub trait Component: ComponentConfig + DeserializeOwned + 'static {
    /// Label used in `component "<TYPE_NAME>" { ... }`
    const TYPE_NAME: &'static str;

    /// JSON Schema describing the accepted attributes
    fn shape() -> serde_json::Value;
}

/// Trait for component factory implementations
pub trait ComponentFactory: Send + Sync {
    /// Get the type name this factory decodes
    fn type_name(&self) -> &str;

    /// Attributes the type accepts
    fn shape(&self) -> &Shape;

    /// Build a config from evaluated, shape-checked attributes
    fn build(&self, attributes: &Value, block_path: &str) -> std::result::Result<Box<dyn ComponentConfig>, Diagnostics>;
}

/// Factory for a [`Component`] type
pub struct TypedFactory<T> {
    shape: Shape,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> TypedFactory<T> {
    pub fn new() -> Result<Self> {
        Ok(Self {
            shape: Shape::new(T::shape())?,
            _marker: PhantomData,
        })
    }
}

impl<T: Component> ComponentFactory for TypedFactory<T> {
    fn type_name(&self) -> &str {
        T::TYPE_NAME
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn build(&self, attributes: &Value, block_path: &str) -> std::result::Result<Box<dyn ComponentConfig>, Diagnostics> {
        let config: T = build(&self.shape, attributes, block_path)?;
        Ok(Box::new(config))
    }
}

/// A simple function-based factory
pub struct FnFactory<F>
where
    F: Fn(&IndexMap<String, Value>) -> Result<Box<dyn ComponentConfig>> + Send + Sync,
{
    name: String,
    shape: Shape,
    func: F,
}

impl<F> FnFactory<F>
where
    F: Fn(&IndexMap<String, Value>) -> Result<Box<dyn ComponentConfig>> + Send + Sync,
{
    /// Create a new function-based factory
    pub fn new(name: impl Into<String>, shape: Shape, func: F) -> Self {
        Self {
            name: name.into(),
            shape,
            func,
        }
    }
}

impl<F> ComponentFactory for FnFactory<F>
where
    F: Fn(&IndexMap<String, Value>) -> Result<Box<dyn ComponentConfig>> + Send + Sync,
{
    fn type_name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn build(&self, attributes: &Value, block_path: &str) -> std::result::Result<Box<dyn ComponentConfig>, Diagnostics> {
        self.shape.check(block_path, attributes).into_result(())?;
        let empty = IndexMap::new();
        let map = attributes.as_mapping().unwrap_or(&empty);
        (self.func)(map).map_err(|e| e.with_path(block_path).into())
    }
}

/// A component block as declared in the configuration, not yet decoded
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub type_name: String,
    pub body: Body,
    /// File the block came from
    pub origin: String,
}

impl ComponentSpec {
    pub fn new(type_name: impl Into<String>, body: Body) -> Self {
        Self {
            type_name: type_name.into(),
            body,
            origin: String::new(),
        }
    }

    /// Config path used in diagnostics, e.g. `component.foo`
    pub fn path(&self) -> String {
        format!("component.{}", self.type_name)
    }
}

/// A fully decoded component
#[derive(Debug)]
pub struct ResolvedComponent {
    pub type_name: String,
    /// Evaluated attributes, as written
    pub attributes: Value,
    pub config: Box<dyn ComponentConfig>,
}

impl ResolvedComponent {
    pub fn describe(&self) -> String {
        self.config.describe()
    }
}

/// Registry of available component types
#[derive(Clone)]
pub struct ComponentRegistry {
    factories: IndexMap<String, Arc<dyn ComponentFactory>>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Create a registry with the built-in component types (foo, bar)
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtin::register_builtins(&mut registry);
        registry
    }

    /// Register a factory, replacing any factory with the same type name
    pub fn register(&mut self, factory: Arc<dyn ComponentFactory>) {
        self.factories
            .insert(factory.type_name().to_string(), factory);
    }

    /// Register a factory with optional force overwrite.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(Error)` if force=false and a type with the same name exists
    pub fn register_with_force(
        &mut self,
        factory: Arc<dyn ComponentFactory>,
        force: bool,
    ) -> Result<()> {
        let name = factory.type_name().to_string();
        if !force && self.factories.contains_key(&name) {
            return Err(Error::already_registered(&name));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Register a serde-decodable component type
    pub fn register_type<T: Component>(&mut self) -> Result<()> {
        self.register_with_force(Arc::new(TypedFactory::<T>::new()?), false)
    }

    /// Register a function as a component factory
    pub fn register_fn<F>(&mut self, name: impl Into<String>, shape: Shape, func: F)
    where
        F: Fn(&IndexMap<String, Value>) -> Result<Box<dyn ComponentConfig>>
            + Send
            + Sync
            + 'static,
    {
        self.register(Arc::new(FnFactory::new(name, shape, func)));
    }

    /// Get a factory by type name
    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn ComponentFactory>> {
        self.factories.get(type_name)
    }

    /// Check if a type is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Registered type names, in registration order
    pub fn type_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Decode a component block with the factory registered for its type
    pub fn decode(
        &self,
        spec: &ComponentSpec,
        ctx: &EvaluationContext,
    ) -> std::result::Result<ResolvedComponent, Diagnostics> {
        let path = spec.path();
        let in_origin = |diags: Diagnostics| {
            if spec.origin.is_empty() {
                diags
            } else {
                diags.in_file(&spec.origin)
            }
        };

        let factory = self.get(&spec.type_name).ok_or_else(|| {
            in_origin(Error::unknown_component_type(&spec.type_name, Some(path.clone())).into())
        })?;

        let evaluated = evaluate_body(&spec.body, ctx, &path).map_err(in_origin)?;
        let attributes = factory.shape().coerce(&evaluated);
        let config = factory.build(&attributes, &path).map_err(in_origin)?;
        config
            .validate()
            .map_err(|e| in_origin(e.with_path(path.clone()).into()))?;

        Ok(ResolvedComponent {
            type_name: spec.type_name.clone(),
            attributes,
            config,
        })
    }
}

static GLOBAL_REGISTRY: OnceLock<Arc<ComponentRegistry>> = OnceLock::new();

/// Get the process-wide component registry.
///
/// Initialized with the built-in types on first use unless
/// [`init_global_registry`] ran before. Read-only once initialized.
pub fn global_registry() -> Arc<ComponentRegistry> {
    Arc::clone(GLOBAL_REGISTRY.get_or_init(|| Arc::new(ComponentRegistry::with_builtins())))
}

/// Install the process-wide registry. Must run before the first resolution pass.
pub fn init_global_registry(registry: ComponentRegistry) -> Result<()> {
    GLOBAL_REGISTRY
        .set(Arc::new(registry))
        .map_err(|_| Error::internal("the global component registry is already initialized"))
}
