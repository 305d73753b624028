//! The type-indexed, cycle-safe global singleton pool.

use crate::container::Container;
use crate::error::Result;
use crate::registry::BeanRef;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::ReentrantMutex;

use std::any::{Any, TypeId};
use std::sync::Arc;

/// The slot for one type: absent, mid-construction, or ready. An absent
/// type simply has no map entry.
enum Slot {
  InProgress(BeanRef),
  Ready(BeanRef),
}

/// Maintains one canonical instance per type, lazily constructed through
/// the container's providers or default constructors.
///
/// Construction runs under a single pool-wide reentrant lock. The lock is
/// intentionally coarse: global bean construction is a rare, short,
/// startup-time operation, and the reentrancy is what lets injection loop
/// back into the pool on the same thread.
pub struct GlobalBeanManager {
  slots: DashMap<TypeId, Slot>,
  lock: ReentrantMutex<()>,
}

impl Default for GlobalBeanManager {
  fn default() -> Self {
    Self {
      slots: DashMap::new(),
      lock: ReentrantMutex::new(()),
    }
  }
}

impl GlobalBeanManager {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Registers `bean` as the canonical instance for `ty`, overwriting any
  /// prior slot.
  pub fn register(&self, ty: TypeId, bean: BeanRef) {
    self.slots.insert(ty, Slot::Ready(bean));
  }

  /// Aliases `bean` under `ty` with first-writer-wins semantics: when
  /// another instance already occupies the slot, that existing instance is
  /// kept and returned.
  pub(crate) fn register_alias(&self, ty: TypeId, bean: BeanRef) -> BeanRef {
    match self.slots.entry(ty) {
      Entry::Occupied(occupied) => match occupied.get() {
        Slot::Ready(existing) | Slot::InProgress(existing) => existing.clone(),
      },
      Entry::Vacant(vacant) => {
        vacant.insert(Slot::Ready(bean.clone()));
        bean
      }
    }
  }

  /// Returns the ready instance for `ty`, if one has been published.
  pub fn ready(&self, ty: TypeId) -> Option<BeanRef> {
    let slot = self.slots.get(&ty)?;
    match slot.value() {
      Slot::Ready(bean) => Some(bean.clone()),
      Slot::InProgress(_) => None,
    }
  }

  /// Returns the instance for `ty` whether ready or still mid-construction.
  fn peek(&self, ty: TypeId) -> Option<BeanRef> {
    let slot = self.slots.get(&ty)?;
    match slot.value() {
      Slot::Ready(bean) | Slot::InProgress(bean) => Some(bean.clone()),
    }
  }

  /// Resolves a global singleton of `ty`. Returns `None` when the type is
  /// not managed here at all: nothing was ever registered under it (or its
  /// replacement) and no provider claims it — the caller then tries another
  /// resolution path.
  pub(crate) fn get(&self, ty: TypeId, container: &Container) -> Result<Option<BeanRef>> {
    if let Some(bean) = self.ready(ty) {
      return Ok(Some(bean));
    }
    if !self.eligible(ty, container) {
      return Ok(None);
    }
    self.create_if_absent(ty, container).map(Some)
  }

  fn eligible(&self, ty: TypeId, container: &Container) -> bool {
    if self.slots.contains_key(&ty) {
      return true;
    }
    let replacement = container.replacement_of(ty);
    if replacement != ty && self.slots.contains_key(&replacement) {
      return true;
    }
    container.provider_claims(replacement)
  }

  /// Constructs (or resolves) the canonical instance for `ty` under the
  /// pool-wide lock.
  ///
  /// The raw instance is published as in-progress before injection runs;
  /// any dependency edge that loops back to this type during injection
  /// observes that same reference instead of recursing without bound.
  /// Hazard, documented and preserved: a reentrant lookup that
  /// synchronously reads fields of an in-progress instance observes
  /// default/unset values. Storing the reference for later use is safe;
  /// using it immediately is not.
  pub(crate) fn create_if_absent(&self, ty: TypeId, container: &Container) -> Result<BeanRef> {
    let _guard = self.lock.lock();

    if let Some(bean) = self.peek(ty) {
      return Ok(bean);
    }
    let replacement = container.replacement_of(ty);
    if replacement != ty {
      if let Some(bean) = self.peek(replacement) {
        // The replacement already has an instance: alias it under the
        // requested type so both resolve to the same reference.
        return Ok(self.register_alias(ty, bean));
      }
    }

    let descriptor = container.descriptor_for_id(replacement);
    let bean = container.new_instance_of(replacement)?;
    self.slots.insert(ty, Slot::InProgress(bean.clone()));
    self
      .slots
      .insert(replacement, Slot::InProgress(bean.clone()));

    let inject_name = match &descriptor {
      Some(d) => d.name().to_string(),
      None => container.type_label(replacement),
    };
    if let Err(e) = container.do_inject(&inject_name, &bean) {
      self.slots.remove(&ty);
      self.slots.remove(&replacement);
      return Err(e);
    }

    self.slots.insert(ty, Slot::Ready(bean.clone()));
    self.slots.insert(replacement, Slot::Ready(bean.clone()));
    // Future lookups by compatible supertypes succeed too.
    if let Some(runtime) = container.descriptor_for_id(bean.as_ref().type_id()) {
      for supertype in runtime.supertypes() {
        self.register_alias(*supertype, bean.clone());
      }
    }
    log::debug!("global bean ready: {inject_name}");
    Ok(bean)
  }
}

/// The restricted lookup view handed to init callables: their arguments
/// resolve only from the global singleton pool, never from bean
/// parameters.
pub struct Globals<'a> {
  pool: &'a GlobalBeanManager,
  container: &'a Container,
}

impl<'a> Globals<'a> {
  pub(crate) fn new(pool: &'a GlobalBeanManager, container: &'a Container) -> Self {
    Self { pool, container }
  }

  /// Resolves a global singleton of `T`, constructing it on demand when the
  /// type is global-eligible. A failed on-demand construction resolves to
  /// `None` like an unmanaged type, but is logged; use
  /// [`get_by_id`](Self::get_by_id) to observe the error itself.
  pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    match self.pool.get(TypeId::of::<T>(), self.container) {
      Ok(bean) => bean.and_then(|bean| bean.downcast::<T>().ok()),
      Err(e) => {
        log::warn!(
          "global construction of {} failed: {e}",
          std::any::type_name::<T>()
        );
        None
      }
    }
  }

  /// Token-level variant of [`get`](Self::get).
  pub fn get_by_id(&self, ty: TypeId) -> Result<Option<BeanRef>> {
    self.pool.get(ty, self.container)
  }
}
