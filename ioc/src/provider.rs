//! The pluggable instance-provider collaborator.

use crate::container::Container;
use crate::registry::BeanRef;

use std::any::TypeId;

/// A build-time-supplied source of bean instances, consulted before default
/// construction. Providers are sorted once at build time and asked in
/// descending [`priority`](Self::priority) order; the first claiming
/// provider constructs the instance.
pub trait BeanProvider: Send + Sync {
  /// Larger values are consulted first. Defaults to `0`.
  fn priority(&self) -> i32 {
    0
  }

  /// Whether this provider constructs instances of `ty` (the type after
  /// replacement overrides were applied).
  fn claims(&self, ty: TypeId) -> bool;

  /// Constructs an instance of `ty`. The container is available for nested
  /// lookups.
  fn provide(&self, ty: TypeId, container: &Container) -> Result<BeanRef, String>;
}
