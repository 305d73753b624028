//! Bootstrap ordering, replacement overrides, providers, supertype lookups
//! and concurrent creation.

use pretty_assertions::assert_eq;
use strand_ioc::{
  BeanProvider, BeanRef, Container, ContainerBuilder, Converter, Error, StdConverter,
  TypeDescriptor,
};

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// --- Bootstrap ---

#[derive(Default)]
struct ServiceA {
  b: Mutex<Option<Arc<ServiceB>>>,
}

#[derive(Default)]
struct ServiceB {
  a: Mutex<Option<Arc<ServiceA>>>,
}

fn mutual_container() -> Container {
  ContainerBuilder::new()
    .with_config_text(
      "@global = a, b\n\
       [a:service_a]\n\
       [b:service_b]\n",
    )
    .with_type(
      TypeDescriptor::new("service_a", ServiceA::default).with_bean_property(
        "b",
        |s: &ServiceA, b: Arc<ServiceB>| *s.b.lock().unwrap() = Some(b),
      ),
    )
    .with_type(
      TypeDescriptor::new("service_b", ServiceB::default).with_bean_property(
        "a",
        |s: &ServiceB, a: Arc<ServiceA>| *s.a.lock().unwrap() = Some(a),
      ),
    )
    .build()
    .expect("bootstrap should succeed")
}

#[test]
fn test_bootstrap_allows_mutual_references() {
  let container = mutual_container();

  let a = container.get_as::<ServiceA>("a").unwrap();
  let b = container.get_as::<ServiceB>("b").unwrap();

  let a_sees = a.b.lock().unwrap().clone().expect("a.b should be injected");
  let b_sees = b.a.lock().unwrap().clone().expect("b.a should be injected");
  assert!(Arc::ptr_eq(&a_sees, &b));
  assert!(Arc::ptr_eq(&b_sees, &a));
}

#[test]
fn test_bootstrap_beans_are_globals_and_named() {
  let container = mutual_container();

  let named = container.get_as::<ServiceA>("a").unwrap();
  let global = container
    .get_global::<ServiceA>()
    .unwrap()
    .expect("bootstrap bean should be global");

  assert!(Arc::ptr_eq(&named, &global));
}

// --- Replacement overrides ---

#[derive(Default)]
struct Cache {
  size: Mutex<u64>,
}

#[derive(Default)]
struct FastCache {
  size: Mutex<u64>,
}

fn cache_descriptors() -> (TypeDescriptor, TypeDescriptor) {
  (
    TypeDescriptor::new("cache", Cache::default)
      .with_value_property("size", |c: &Cache, v: u64| *c.size.lock().unwrap() = v),
    TypeDescriptor::new("fast_cache", FastCache::default)
      .with_value_property("size", |c: &FastCache, v: u64| *c.size.lock().unwrap() = v),
  )
}

#[test]
fn test_replace_class_swaps_construction() {
  let (cache, fast_cache) = cache_descriptors();
  let container = ContainerBuilder::new()
    .with_config_text(
      "[c:cache]\n\
       [fast_cache]\n\
       size = 9\n",
    )
    .with_type(cache)
    .with_type(fast_cache)
    .replace_class("cache", "fast_cache")
    .build()
    .unwrap();

  // The name still resolves, but the constructed instance is the
  // replacement type and inherits its parameters.
  let c = container.get_as::<FastCache>("c").unwrap();

  assert_eq!(*c.size.lock().unwrap(), 9);
}

#[test]
fn test_replace_class_with_unknown_name_fails_build() {
  let (cache, _) = cache_descriptors();
  let result = ContainerBuilder::new()
    .with_type(cache)
    .replace_class("cache", "no_such_type")
    .build();

  assert!(matches!(result, Err(Error::UnknownType(name)) if name == "no_such_type"));
}

#[test]
fn test_replaced_type_aliases_in_the_global_pool() {
  let (cache, fast_cache) = cache_descriptors();
  let container = ContainerBuilder::new()
    .with_type(cache)
    .with_type(fast_cache)
    .replace_class("cache", "fast_cache")
    .build()
    .unwrap();
  container.register_global(FastCache::default());

  // A lookup under the replaced type resolves to the same instance.
  let by_old = container
    .get_global_by_id(TypeId::of::<Cache>())
    .unwrap()
    .expect("replaced lookup should alias");
  let by_new = container.get_global::<FastCache>().unwrap().unwrap();

  let by_old = by_old.downcast::<FastCache>().unwrap();
  assert!(Arc::ptr_eq(&by_old, &by_new));
}

#[test]
fn test_replace_bean_redirects_the_name() {
  #[derive(Default)]
  struct Old;
  #[derive(Default)]
  struct New;

  let container = ContainerBuilder::new()
    .with_config_text("[old:old_type]\n[new:new_type]\n")
    .with_type(TypeDescriptor::new("old_type", Old::default))
    .with_type(TypeDescriptor::new("new_type", New::default))
    .replace_bean("old", "new")
    .build()
    .unwrap();

  let redirected = container.get_as::<New>("old").unwrap();
  let direct = container.get("old").unwrap();

  let direct = direct.downcast::<New>().unwrap();
  assert!(Arc::ptr_eq(&redirected, &direct));
}

// --- Providers ---

struct Gadget {
  made_by: String,
}

struct FixedProvider {
  priority: i32,
  marker: &'static str,
}

impl BeanProvider for FixedProvider {
  fn priority(&self) -> i32 {
    self.priority
  }

  fn claims(&self, ty: TypeId) -> bool {
    ty == TypeId::of::<Gadget>()
  }

  fn provide(&self, _ty: TypeId, _container: &Container) -> Result<BeanRef, String> {
    Ok(Arc::new(Gadget {
      made_by: self.marker.to_string(),
    }))
  }
}

#[test]
fn test_highest_priority_provider_wins() {
  let container = ContainerBuilder::new()
    .with_config_text("[g:gadget_type]\n")
    .with_type(TypeDescriptor::new("gadget_type", || Gadget {
      made_by: "default".to_string(),
    }))
    .with_provider(Arc::new(FixedProvider {
      priority: 1,
      marker: "low",
    }))
    .with_provider(Arc::new(FixedProvider {
      priority: 10,
      marker: "high",
    }))
    .build()
    .unwrap();

  let gadget = container.get_as::<Gadget>("g").unwrap();

  assert_eq!(gadget.made_by, "high");
}

#[test]
fn test_provider_claim_makes_a_type_global_eligible() {
  let container = ContainerBuilder::new()
    .with_type(TypeDescriptor::new("gadget_type", || Gadget {
      made_by: "default".to_string(),
    }))
    .with_provider(Arc::new(FixedProvider {
      priority: 0,
      marker: "provided",
    }))
    .build()
    .unwrap();

  let first = container
    .get_global::<Gadget>()
    .unwrap()
    .expect("claimed type should be constructible");
  let second = container.get_global::<Gadget>().unwrap().unwrap();

  assert_eq!(first.made_by, "provided");
  assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_unmanaged_type_yields_no_global() {
  struct Orphan;
  let container = ContainerBuilder::new().build().unwrap();

  assert!(container.get_global::<Orphan>().unwrap().is_none());
}

// --- Supertype lookups ---

trait Backend: Send + Sync {}

#[derive(Default)]
struct SqlBackend;

impl Backend for SqlBackend {}

#[test]
fn test_global_lookup_by_declared_supertype() {
  let container = ContainerBuilder::new()
    .with_type(TypeDescriptor::new("sql_backend", SqlBackend::default).with_supertype::<dyn Backend>())
    .build()
    .unwrap();
  container.register_global(SqlBackend);

  let by_supertype = container
    .get_global_by_id(TypeId::of::<dyn Backend>())
    .unwrap()
    .expect("supertype lookup should alias the instance");
  let concrete = container.get_global::<SqlBackend>().unwrap().unwrap();

  let by_supertype = by_supertype.downcast::<SqlBackend>().unwrap();
  assert!(Arc::ptr_eq(&by_supertype, &concrete));
}

// --- Init callables ---

#[derive(Default)]
struct Metrics {
  name: Mutex<String>,
}

#[derive(Default)]
struct Reporter {
  metrics: Mutex<Option<Arc<Metrics>>>,
}

#[test]
fn test_initializer_runs_with_the_globals_view() {
  let container = ContainerBuilder::new()
    .with_config_text("[reporter:reporter_type]\n")
    .with_type(
      TypeDescriptor::new("reporter_type", Reporter::default).with_initializer(
        |r: &Reporter, globals| {
          *r.metrics.lock().unwrap() = globals.get::<Metrics>();
          Ok(())
        },
      ),
    )
    .with_global(Metrics {
      name: Mutex::new("prod".to_string()),
    })
    .build()
    .unwrap();

  let reporter = container.get_as::<Reporter>("reporter").unwrap();

  let metrics = reporter
    .metrics
    .lock()
    .unwrap()
    .clone()
    .expect("initializer should see the global");
  assert_eq!(*metrics.name.lock().unwrap(), "prod");
}

#[test]
fn test_initializer_resolves_none_when_global_construction_fails() {
  struct Broken;

  struct BrokenProvider;

  impl BeanProvider for BrokenProvider {
    fn claims(&self, ty: TypeId) -> bool {
      ty == TypeId::of::<Broken>()
    }

    fn provide(&self, _ty: TypeId, _container: &Container) -> Result<BeanRef, String> {
      Err("backing service unavailable".to_string())
    }
  }

  #[derive(Default)]
  struct Watcher {
    saw_broken: Mutex<Option<bool>>,
  }

  let container = ContainerBuilder::new()
    .with_config_text("[watcher:watcher_type]\n")
    .with_type(
      TypeDescriptor::new("watcher_type", Watcher::default).with_initializer(
        |w: &Watcher, globals| {
          *w.saw_broken.lock().unwrap() = Some(globals.get::<Broken>().is_some());
          Ok(())
        },
      ),
    )
    .with_provider(Arc::new(BrokenProvider))
    .build()
    .unwrap();

  // The init callable still runs and observes the absence.
  let watcher = container.get_as::<Watcher>("watcher").unwrap();
  assert_eq!(*watcher.saw_broken.lock().unwrap(), Some(false));

  // The fallible lookup surface keeps the construction error visible.
  assert!(container.get_global::<Broken>().is_err());
}

#[test]
fn test_initializer_failure_is_fatal() {
  let container = ContainerBuilder::new()
    .with_config_text("[reporter:reporter_type]\n")
    .with_type(
      TypeDescriptor::new("reporter_type", Reporter::default)
        .with_initializer(|_: &Reporter, _| Err("boom".to_string())),
    )
    .build()
    .unwrap();

  let result = container.get("reporter");

  assert!(matches!(result, Err(Error::Initializer { reason, .. }) if reason == "boom"));
}

// --- Custom conversion ---

struct Temperature(f64);

struct UnitConverter;

impl Converter for UnitConverter {
  fn convert(&self, raw: &str, target: TypeId) -> Result<Box<dyn Any + Send + Sync>, String> {
    if target == TypeId::of::<Temperature>() {
      let degrees = raw
        .trim()
        .strip_suffix('C')
        .ok_or_else(|| "expected a trailing C".to_string())?;
      let degrees: f64 = degrees.trim().parse().map_err(|_| "not a number".to_string())?;
      return Ok(Box::new(Temperature(degrees)));
    }
    StdConverter.convert(raw, target)
  }
}

#[test]
fn test_custom_converter_handles_domain_types() {
  #[derive(Default)]
  struct Boiler {
    limit: Mutex<f64>,
  }

  let container = ContainerBuilder::new()
    .with_config_text("[boiler:boiler_type]\nlimit = 95C\n")
    .with_type(
      TypeDescriptor::new("boiler_type", Boiler::default).with_value_property(
        "limit",
        |b: &Boiler, t: Temperature| *b.limit.lock().unwrap() = t.0,
      ),
    )
    .with_converter(Arc::new(UnitConverter))
    .build()
    .unwrap();

  let boiler = container.get_as::<Boiler>("boiler").unwrap();

  assert_eq!(*boiler.limit.lock().unwrap(), 95.0);
}

// --- Concurrency ---

#[test]
fn test_concurrent_get_creates_one_instance() {
  struct Counted;

  let constructions = Arc::new(AtomicUsize::new(0));
  let counter = constructions.clone();
  let container = ContainerBuilder::new()
    .with_config_text("[singleton:counted_type]\n")
    .with_type(TypeDescriptor::new("counted_type", move || {
      counter.fetch_add(1, Ordering::SeqCst);
      Counted
    }))
    .build()
    .unwrap();

  let beans: Vec<BeanRef> = std::thread::scope(|scope| {
    let handles: Vec<_> = (0..8)
      .map(|_| scope.spawn(|| container.get("singleton").unwrap()))
      .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
  });

  assert_eq!(constructions.load(Ordering::SeqCst), 1);
  for bean in &beans[1..] {
    assert!(Arc::ptr_eq(&beans[0], bean));
  }
}
