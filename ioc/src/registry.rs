//! The type-lookup collaborator: per-type capability descriptors supplied by
//! the host environment (generated code or explicit registration), mapping a
//! configuration type name to a constructor, settable properties and init
//! callables.

use crate::global::Globals;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// A type-erased, shareable bean instance.
pub type BeanRef = Arc<dyn Any + Send + Sync>;

/// The declared type of a settable property, which decides how a raw
/// parameter string is interpreted during injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
  /// A plain value produced by the converter.
  Value(TypeId),
  /// A single bean, resolved by name through the container (or by declared
  /// type through the global pool when no parameter is present).
  Bean(TypeId),
  /// A comma-list of bean names, each resolved through the container.
  BeanList(TypeId),
}

/// The payload handed to a property setter.
pub(crate) enum Injected {
  Value(Box<dyn Any + Send + Sync>),
  Bean(BeanRef),
  Beans(Vec<BeanRef>),
}

type SetFn = Box<dyn Fn(&BeanRef, Injected) -> Result<(), String> + Send + Sync>;
type InitFn = Box<dyn Fn(&BeanRef, &Globals<'_>) -> Result<(), String> + Send + Sync>;

/// One settable property on a bean type.
pub struct Property {
  declared: DeclaredType,
  set: SetFn,
}

impl Property {
  pub(crate) fn declared(&self) -> DeclaredType {
    self.declared
  }

  pub(crate) fn set(&self, bean: &BeanRef, injected: Injected) -> Result<(), String> {
    (self.set)(bean, injected)
  }
}

/// The capability map for one registered bean type: how to construct it,
/// which properties can be set on it, which init callables run after
/// injection, and which additional type keys the instance qualifies for in
/// the global pool.
pub struct TypeDescriptor {
  name: String,
  type_id: TypeId,
  construct: Box<dyn Fn() -> BeanRef + Send + Sync>,
  properties: HashMap<String, Property>,
  initializers: Vec<InitFn>,
  supertypes: Vec<TypeId>,
}

impl TypeDescriptor {
  /// Creates a descriptor for `T`, registered under `name`, with a default
  /// constructor.
  pub fn new<T, F>(name: &str, construct: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn() -> T + Send + Sync + 'static,
  {
    Self {
      name: name.to_string(),
      type_id: TypeId::of::<T>(),
      construct: Box::new(move || Arc::new(construct()) as BeanRef),
      properties: HashMap::new(),
      initializers: Vec::new(),
      supertypes: Vec::new(),
    }
  }

  /// Declares a value-typed property: the raw parameter string goes through
  /// the converter and the converted `V` is handed to `set`.
  pub fn with_value_property<T, V, F>(mut self, name: &str, set: F) -> Self
  where
    T: Any + Send + Sync,
    V: Any + Send + Sync,
    F: Fn(&T, V) + Send + Sync + 'static,
  {
    let property = Property {
      declared: DeclaredType::Value(TypeId::of::<V>()),
      set: Box::new(move |bean, injected| {
        let target = downcast_target::<T>(bean)?;
        match injected {
          Injected::Value(value) => {
            let value = value
              .downcast::<V>()
              .map_err(|_| "converted value has an unexpected type".to_string())?;
            set(target, *value);
            Ok(())
          }
          _ => Err("expected a converted value".to_string()),
        }
      }),
    };
    self.properties.insert(name.to_string(), property);
    self
  }

  /// Declares a bean-typed property holding a shared `Arc<D>`.
  pub fn with_bean_property<T, D, F>(mut self, name: &str, set: F) -> Self
  where
    T: Any + Send + Sync,
    D: Any + Send + Sync,
    F: Fn(&T, Arc<D>) + Send + Sync + 'static,
  {
    let property = Property {
      declared: DeclaredType::Bean(TypeId::of::<D>()),
      set: Box::new(move |bean, injected| {
        let target = downcast_target::<T>(bean)?;
        match injected {
          Injected::Bean(dependency) => {
            let dependency = dependency
              .downcast::<D>()
              .map_err(|_| format!("injected bean is not a {}", std::any::type_name::<D>()))?;
            set(target, dependency);
            Ok(())
          }
          _ => Err("expected a bean reference".to_string()),
        }
      }),
    };
    self.properties.insert(name.to_string(), property);
    self
  }

  /// Declares a property holding a list of beans; the raw parameter value
  /// is treated as a comma-list of bean names.
  pub fn with_bean_list_property<T, D, F>(mut self, name: &str, set: F) -> Self
  where
    T: Any + Send + Sync,
    D: Any + Send + Sync,
    F: Fn(&T, Vec<Arc<D>>) + Send + Sync + 'static,
  {
    let property = Property {
      declared: DeclaredType::BeanList(TypeId::of::<D>()),
      set: Box::new(move |bean, injected| {
        let target = downcast_target::<T>(bean)?;
        match injected {
          Injected::Beans(dependencies) => {
            let mut list = Vec::with_capacity(dependencies.len());
            for dependency in dependencies {
              list.push(dependency.downcast::<D>().map_err(|_| {
                format!("injected bean is not a {}", std::any::type_name::<D>())
              })?);
            }
            set(target, list);
            Ok(())
          }
          _ => Err("expected a list of bean references".to_string()),
        }
      }),
    };
    self.properties.insert(name.to_string(), property);
    self
  }

  /// Adds a post-construction init callable. Callables run after property
  /// injection, in the order they were declared; their arguments resolve
  /// only through the [`Globals`] view.
  pub fn with_initializer<T, F>(mut self, init: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&T, &Globals<'_>) -> Result<(), String> + Send + Sync + 'static,
  {
    self.initializers.push(Box::new(move |bean, globals| {
      let target = downcast_target::<T>(bean)?;
      init(target, globals)
    }));
    self
  }

  /// Declares that instances of this type also satisfy lookups for `S` in
  /// the global pool.
  pub fn with_supertype<S: ?Sized + Any>(mut self) -> Self {
    self.supertypes.push(TypeId::of::<S>());
    self
  }

  /// The configuration name this descriptor is registered under.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The identity token of the described type.
  ///
  /// Deliberately not named `type_id`: on an `Arc<TypeDescriptor>` that
  /// name resolves to `Any::type_id` of the `Arc` itself, which is the
  /// same token for every descriptor.
  pub fn id(&self) -> TypeId {
    self.type_id
  }

  pub(crate) fn construct(&self) -> BeanRef {
    (self.construct)()
  }

  pub(crate) fn properties(&self) -> &HashMap<String, Property> {
    &self.properties
  }

  pub(crate) fn initializers(&self) -> &[InitFn] {
    &self.initializers
  }

  pub(crate) fn supertypes(&self) -> &[TypeId] {
    &self.supertypes
  }
}

fn downcast_target<T: Any>(bean: &BeanRef) -> Result<&T, String> {
  bean
    .downcast_ref::<T>()
    .ok_or_else(|| "bean has an unexpected runtime type".to_string())
}

/// Maps configuration type names and identity tokens to descriptors.
///
/// Keys are identity-based (`TypeId`), never structural, so two distinct
/// types with equal shape can never collide.
#[derive(Default)]
pub struct TypeRegistry {
  by_name: HashMap<String, Arc<TypeDescriptor>>,
  by_id: HashMap<TypeId, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a descriptor under its name and type id. A later
  /// registration for the same name or type wins.
  pub fn register(&mut self, descriptor: TypeDescriptor) {
    let descriptor = Arc::new(descriptor);
    self
      .by_name
      .insert(descriptor.name().to_string(), descriptor.clone());
    self.by_id.insert(descriptor.id(), descriptor);
  }

  pub fn by_name(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
    self.by_name.get(name).cloned()
  }

  pub fn by_id(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
    self.by_id.get(&id).cloned()
  }
}
