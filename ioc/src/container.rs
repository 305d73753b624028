//! The main `Container` struct: bean creation, injection and the local
//! named-bean cache.

use crate::convert::Converter;
use crate::error::{Error, Result};
use crate::global::{GlobalBeanManager, Globals};
use crate::provider::BeanProvider;
use crate::registry::{BeanRef, DeclaredType, Injected, TypeDescriptor, TypeRegistry};
use crate::resolve::{split_list, ParameterResolver, TypeResolver};

use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use strand_config::ConfigStore;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// A configuration-driven bean factory.
///
/// The container wires long-lived, named service instances from a
/// [`ConfigStore`] and a host-supplied [`TypeRegistry`]. Instances created
/// through [`get`](Self::get) are cached by name for the container's
/// lifetime; [`create`](Self::create) always produces a fresh one. Lookups
/// by type go through the owned [`GlobalBeanManager`].
///
/// Configuration and the replacement maps are frozen at build time; the
/// only mutable state afterwards is the two instance caches, which are safe
/// under concurrent access.
pub struct Container {
  config: ConfigStore,
  registry: TypeRegistry,
  converter: Arc<dyn Converter>,
  // Pre-sorted, descending priority.
  providers: Vec<Arc<dyn BeanProvider>>,
  type_replacements: HashMap<TypeId, TypeId>,
  name_replacements: HashMap<String, String>,
  beans: DashMap<String, BeanRef>,
  // Container-wide creation lock. Reentrant because injecting a bean
  // resolves its dependencies through `get` on the same thread.
  creation: ReentrantMutex<()>,
  globals: GlobalBeanManager,
}

impl Container {
  pub(crate) fn assemble(
    config: ConfigStore,
    registry: TypeRegistry,
    converter: Arc<dyn Converter>,
    providers: Vec<Arc<dyn BeanProvider>>,
    type_replacements: HashMap<TypeId, TypeId>,
    name_replacements: HashMap<String, String>,
  ) -> Self {
    Self {
      config,
      registry,
      converter,
      providers,
      type_replacements,
      name_replacements,
      beans: DashMap::new(),
      creation: ReentrantMutex::new(()),
      globals: GlobalBeanManager::new(),
    }
  }

  /// The configuration namespace this container was built from.
  pub fn config(&self) -> &ConfigStore {
    &self.config
  }

  /// The global singleton pool owned by this container.
  pub fn globals(&self) -> &GlobalBeanManager {
    &self.globals
  }

  // --- RESOLUTION HELPERS ---

  pub(crate) fn replacement_of(&self, ty: TypeId) -> TypeId {
    *self.type_replacements.get(&ty).unwrap_or(&ty)
  }

  fn replaced_name(&self, name: &str) -> String {
    self
      .name_replacements
      .get(name)
      .cloned()
      .unwrap_or_else(|| name.to_string())
  }

  pub(crate) fn provider_claims(&self, ty: TypeId) -> bool {
    self.providers.iter().any(|p| p.claims(ty))
  }

  pub(crate) fn descriptor_for_id(&self, ty: TypeId) -> Option<Arc<TypeDescriptor>> {
    self.registry.by_id(ty)
  }

  pub(crate) fn type_label(&self, ty: TypeId) -> String {
    self
      .registry
      .by_id(ty)
      .map(|d| d.name().to_string())
      .unwrap_or_else(|| format!("{ty:?}"))
  }

  fn resolve_type(&self, name: &str) -> Result<Arc<TypeDescriptor>> {
    TypeResolver {
      config: &self.config,
      registry: &self.registry,
      name_replacements: &self.name_replacements,
    }
    .resolve(name)
  }

  /// The flattened, precedence-ordered parameter map for a bean name:
  /// ancestors first, `@extends` profiles next, the name's own entries
  /// last.
  pub fn resolve_params(&self, name: &str) -> Result<HashMap<String, String>> {
    ParameterResolver {
      config: &self.config,
    }
    .resolve(&self.replaced_name(name))
  }

  // --- CONSTRUCTION & INJECTION ---

  /// Constructs an instance of `ty` (after type replacement): the first
  /// claiming provider wins, otherwise the registry's default constructor
  /// runs. No injection happens here.
  pub(crate) fn new_instance_of(&self, ty: TypeId) -> Result<BeanRef> {
    let ty = self.replacement_of(ty);
    for provider in &self.providers {
      if provider.claims(ty) {
        return provider.provide(ty, self).map_err(|reason| Error::Provider {
          type_name: self.type_label(ty),
          reason,
        });
      }
    }
    let descriptor = self
      .registry
      .by_id(ty)
      .ok_or_else(|| Error::UnknownType(self.type_label(ty)))?;
    Ok(descriptor.construct())
  }

  /// Injects `bean` using the parameter set resolved for `name`, then runs
  /// the init callables declared on its runtime type.
  ///
  /// A property with a parameter value is set from it (converted, or
  /// resolved as bean names through [`get`](Self::get)); a bean-typed
  /// property without one falls back to a global singleton of the declared
  /// type; otherwise the field keeps its default. Absence is not an error.
  pub(crate) fn do_inject(&self, name: &str, bean: &BeanRef) -> Result<()> {
    let runtime = bean.as_ref().type_id();
    let Some(descriptor) = self.registry.by_id(runtime) else {
      log::debug!("bean '{name}' has no registered descriptor; nothing to inject");
      return Ok(());
    };
    let params = ParameterResolver {
      config: &self.config,
    }
    .resolve(name)?;

    for (property_name, property) in descriptor.properties() {
      let injected = match params.get(property_name) {
        Some(raw) => Some(match property.declared() {
          DeclaredType::Value(target) => Injected::Value(
            self
              .converter
              .convert(raw, target)
              .map_err(|reason| Error::Convert {
                property: property_name.clone(),
                raw: raw.clone(),
                reason,
              })?,
          ),
          DeclaredType::Bean(_) => Injected::Bean(self.get(raw.trim())?),
          DeclaredType::BeanList(_) => {
            let mut list = Vec::new();
            for bean_name in split_list(raw) {
              list.push(self.get(bean_name)?);
            }
            Injected::Beans(list)
          }
        }),
        None => match property.declared() {
          DeclaredType::Bean(target) => self.globals.get(target, self)?.map(Injected::Bean),
          _ => None,
        },
      };
      if let Some(injected) = injected {
        property
          .set(bean, injected)
          .map_err(|reason| Error::Injection {
            bean: name.to_string(),
            property: property_name.clone(),
            reason,
          })?;
        log::trace!("injected '{property_name}' on bean '{name}'");
      }
    }

    let globals = Globals::new(&self.globals, self);
    for init in descriptor.initializers() {
      init(bean, &globals).map_err(|reason| Error::Initializer {
        bean: name.to_string(),
        reason,
      })?;
    }
    Ok(())
  }

  // --- PUBLIC API ---

  /// Returns the cached bean for `name`, creating and caching it on first
  /// use.
  ///
  /// The instance is published into the cache before injection so that a
  /// self-referencing name chain resolves to the one instance. The known,
  /// unfixed limitation: a racing caller on another thread may observe a
  /// not-yet-fully-injected bean through the unlocked fast path.
  pub fn get(&self, name: &str) -> Result<BeanRef> {
    if let Some(bean) = self.beans.get(name) {
      return Ok(bean.value().clone());
    }
    let _guard = self.creation.lock();
    if let Some(bean) = self.beans.get(name) {
      return Ok(bean.value().clone());
    }
    let resolved = self.replaced_name(name);
    let descriptor = self.resolve_type(name)?;
    let bean = self.new_instance_of(descriptor.id())?;
    self.beans.insert(name.to_string(), bean.clone());
    log::debug!("created bean '{name}' ({})", descriptor.name());
    if let Err(e) = self.do_inject(&resolved, &bean) {
      self.beans.remove(name);
      return Err(e);
    }
    Ok(bean)
  }

  /// Typed variant of [`get`](Self::get).
  pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self.get(name)?.downcast::<T>().map_err(|_| Error::WrongType {
      name: name.to_string(),
    })
  }

  /// Creates a fresh, fully injected, uncached instance for `name`.
  pub fn create(&self, name: &str) -> Result<BeanRef> {
    let resolved = self.replaced_name(name);
    let descriptor = self.resolve_type(name)?;
    let bean = self.new_instance_of(descriptor.id())?;
    self.do_inject(&resolved, &bean)?;
    Ok(bean)
  }

  /// Typed variant of [`create`](Self::create).
  pub fn create_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self
      .create(name)?
      .downcast::<T>()
      .map_err(|_| Error::WrongType {
        name: name.to_string(),
      })
  }

  /// Creates a fresh, fully injected instance of `T` through its registered
  /// descriptor, outside the name cache. Fails with [`Error::WrongType`]
  /// when a type replacement redirects `T` to a different concrete type.
  pub fn create_of<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
    let ty = TypeId::of::<T>();
    let descriptor = self
      .registry
      .by_id(ty)
      .ok_or_else(|| Error::UnknownType(self.type_label(ty)))?;
    let bean = self.new_instance_of(ty)?;
    self.do_inject(descriptor.name(), &bean)?;
    bean.downcast::<T>().map_err(|_| Error::WrongType {
      name: descriptor.name().to_string(),
    })
  }

  /// Registers (or replaces) the cached instance for `name`.
  pub fn register(&self, name: &str, bean: BeanRef) {
    self.beans.insert(name.to_string(), bean);
  }

  /// Convenience for [`register`](Self::register) taking an owned value.
  pub fn register_instance<T: Any + Send + Sync>(&self, name: &str, instance: T) {
    self.register(name, Arc::new(instance));
  }

  /// Registers `instance` as the canonical global singleton for `T`.
  pub fn register_global<T: Any + Send + Sync>(&self, instance: T) {
    self.register_global_ref(TypeId::of::<T>(), Arc::new(instance));
  }

  pub(crate) fn register_global_ref(&self, ty: TypeId, bean: BeanRef) {
    self.globals.register(ty, bean.clone());
    let runtime = bean.as_ref().type_id();
    if runtime != ty {
      self.globals.register_alias(runtime, bean.clone());
    }
    if let Some(descriptor) = self.registry.by_id(runtime) {
      for supertype in descriptor.supertypes() {
        self.globals.register_alias(*supertype, bean.clone());
      }
    }
  }

  /// Resolves a global singleton of `T`, constructing it on demand when the
  /// type is global-eligible; `Ok(None)` means the pool does not manage the
  /// type.
  pub fn get_global<T: Any + Send + Sync>(&self) -> Result<Option<Arc<T>>> {
    Ok(
      self
        .globals
        .get(TypeId::of::<T>(), self)?
        .and_then(|bean| bean.downcast::<T>().ok()),
    )
  }

  /// Token-level variant of [`get_global`](Self::get_global).
  pub fn get_global_by_id(&self, ty: TypeId) -> Result<Option<BeanRef>> {
    self.globals.get(ty, self)
  }

  // --- BOOTSTRAP ---

  /// Eagerly promotes the bean names listed under the `@global` key to
  /// global singletons, in two phases: every listed bean is constructed and
  /// registered first, then all of them are injected. The ordering is what
  /// lets two bootstrap beans hold references to each other.
  pub(crate) fn init_globals(&self) -> Result<()> {
    let Some(list) = self.config.get("@global")? else {
      return Ok(());
    };
    let names: Vec<String> = split_list(&list).map(str::to_string).collect();
    if names.is_empty() {
      return Ok(());
    }
    log::debug!("bootstrapping {} global beans", names.len());

    // Phase 1: construct, no injection.
    let mut constructed = Vec::with_capacity(names.len());
    for name in &names {
      let resolved = self.replaced_name(name);
      let descriptor = self.resolve_type(name)?;
      let bean = self.new_instance_of(descriptor.id())?;
      self.register_global_ref(descriptor.id(), bean.clone());
      self.beans.insert(name.clone(), bean.clone());
      constructed.push((resolved, bean));
    }
    // Phase 2: inject, now that every bootstrap bean is visible.
    for (name, bean) in &constructed {
      self.do_inject(name, bean)?;
    }
    Ok(())
  }
}
