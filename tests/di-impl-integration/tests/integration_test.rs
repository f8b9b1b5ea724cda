//! Centralized integration tests for the service registry

use async_trait::async_trait;
use di_abstractions::{
    provides, service_contract, AutoDiscoverable, ContractDescriptor, Injectable, ModuleLoader,
    ModuleReference, ServiceContract, ServiceModule, ServiceStore, TypeDescriptor,
};
use di_impl::{ServiceContainer, StaticModule, StaticModuleLoader};
use infrastructure_common::{
    ContractKey, DependencyError, DiscoveryError, DiscoveryPolicy, DiscoveryResult, Lifetime,
    RegistrationError, RegistryConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ---------------------------------------------------------------------------
// 日志服务场景
// ---------------------------------------------------------------------------

trait Logger: Send + Sync {
    fn log(&self, message: &str);
    fn lines(&self) -> Vec<String>;
}

trait Service: Send + Sync {
    fn run(&self) -> String;
    fn logger(&self) -> Arc<dyn Logger>;
}

service_contract!(dyn Logger, dyn Service);

#[derive(Default)]
struct ConsoleLogger {
    prefix: String,
    lines: Mutex<Vec<String>>,
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        let line = format!("{}{}", self.prefix, message);
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }
}

provides!(ConsoleLogger => dyn Logger);

impl Injectable for ConsoleLogger {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<ConsoleLogger>()
            .default_constructor()
            .build()
    }
}

#[derive(Default)]
struct FileLogger;

impl Logger for FileLogger {
    fn log(&self, _message: &str) {}

    fn lines(&self) -> Vec<String> {
        Vec::new()
    }
}

provides!(FileLogger => dyn Logger);

impl Injectable for FileLogger {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<FileLogger>()
            .default_constructor()
            .build()
    }
}

struct ServiceImpl {
    logger: Arc<dyn Logger>,
}

impl Service for ServiceImpl {
    fn run(&self) -> String {
        self.logger.log("running");
        "done".to_string()
    }

    fn logger(&self) -> Arc<dyn Logger> {
        self.logger.clone()
    }
}

provides!(ServiceImpl => dyn Service);

impl Injectable for ServiceImpl {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<ServiceImpl>()
            .constructor(vec![ContractKey::of::<dyn Logger>()], |args| {
                Ok(ServiceImpl {
                    logger: args.service::<dyn Logger>(0)?,
                })
            })
            .build()
    }
}

#[test]
fn test_service_receives_the_singleton_logger() {
    init_tracing();
    let container = ServiceContainer::new();
    let hook_calls = Arc::new(AtomicUsize::new(0));
    let calls = hook_calls.clone();

    container
        .registry()
        .register_singleton_with_hook::<dyn Logger, ConsoleLogger, _>(move |logger| {
            calls.fetch_add(1, Ordering::SeqCst);
            logger.prefix = "[app] ".to_string();
        })
        .unwrap();
    container.register::<dyn Service, ServiceImpl>().unwrap();

    let service = container.get::<dyn Service>().unwrap();
    assert_eq!(service.run(), "done");

    let logger = container.get::<dyn Logger>().unwrap();
    assert!(Arc::ptr_eq(&service.logger(), &logger));
    assert_eq!(logger.lines(), vec!["[app] running".to_string()]);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_re_registration_keeps_cached_singleton() {
    init_tracing();
    let container = ServiceContainer::new();
    container
        .register_singleton::<dyn Logger, ConsoleLogger>()
        .unwrap();
    let cached = container.get::<dyn Logger>().unwrap();

    container.register::<dyn Logger, FileLogger>().unwrap();
    let registration = container
        .registry()
        .lookup(&ContractKey::of::<dyn Logger>())
        .unwrap();
    assert_eq!(registration.implementation.name(), "FileLogger");

    let resolved = container.get::<dyn Logger>().unwrap();
    assert!(Arc::ptr_eq(&cached, &resolved));
}

// ---------------------------------------------------------------------------
// 构造顺序
// ---------------------------------------------------------------------------

trait Alpha: Send + Sync {}
trait Beta: Send + Sync {}
trait Gamma: Send + Sync {}

service_contract!(dyn Alpha, dyn Beta, dyn Gamma);

struct A(#[allow(dead_code)] Arc<dyn Beta>);
struct B(#[allow(dead_code)] Arc<dyn Gamma>);
struct C;

impl Alpha for A {}
impl Beta for B {}
impl Gamma for C {}

provides!(A => dyn Alpha);
provides!(B => dyn Beta);
provides!(C => dyn Gamma);

fn recording_descriptors(
    order: &Arc<Mutex<Vec<&'static str>>>,
) -> (TypeDescriptor, TypeDescriptor, TypeDescriptor) {
    let record_a = order.clone();
    let a = TypeDescriptor::builder::<A>()
        .constructor(vec![ContractKey::of::<dyn Beta>()], move |args| {
            let beta = args.service::<dyn Beta>(0)?;
            record_a.lock().unwrap().push("A");
            Ok(A(beta))
        })
        .provides::<dyn Alpha>()
        .build();

    let record_b = order.clone();
    let b = TypeDescriptor::builder::<B>()
        .constructor(vec![ContractKey::of::<dyn Gamma>()], move |args| {
            let gamma = args.service::<dyn Gamma>(0)?;
            record_b.lock().unwrap().push("B");
            Ok(B(gamma))
        })
        .provides::<dyn Beta>()
        .build();

    let record_c = order.clone();
    let c = TypeDescriptor::builder::<C>()
        .constructor(Vec::new(), move |_| {
            record_c.lock().unwrap().push("C");
            Ok(C)
        })
        .provides::<dyn Gamma>()
        .build();

    (a, b, c)
}

#[test]
fn test_dependencies_are_constructed_depth_first() {
    init_tracing();
    let container = ServiceContainer::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    let (a, b, c) = recording_descriptors(&order);

    let store: &dyn ServiceStore = container.registry();
    store
        .register(
            <dyn Alpha as ServiceContract>::contract(),
            Arc::new(a),
            None,
            Lifetime::Transient,
        )
        .unwrap();
    store
        .register(
            <dyn Beta as ServiceContract>::contract(),
            Arc::new(b),
            None,
            Lifetime::Transient,
        )
        .unwrap();
    store
        .register(
            <dyn Gamma as ServiceContract>::contract(),
            Arc::new(c),
            None,
            Lifetime::Singleton,
        )
        .unwrap();

    container.get::<dyn Alpha>().unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["C", "B", "A"]);

    // Gamma 已缓存，第二次解析不再构造 C
    container.get::<dyn Alpha>().unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["C", "B", "A", "B", "A"]);
}

#[test]
fn test_unregistered_contract_typed_and_untyped() {
    init_tracing();
    let container = ServiceContainer::new();

    let err = container.get::<dyn Service>().err().expect("应当返回错误");
    assert!(matches!(err, DependencyError::UnregisteredService { .. }));

    let absent = container
        .get_untyped(&ContractKey::of::<dyn Service>())
        .unwrap();
    assert!(absent.is_none());
}

#[test]
fn test_keyed_registration_rejects_concrete_contract() {
    init_tracing();
    let container = ServiceContainer::new();
    let store: &dyn ServiceStore = container.registry();

    let err = store
        .register(
            ContractDescriptor::concrete::<ConsoleLogger>(),
            Arc::new(ConsoleLogger::descriptor()),
            None,
            Lifetime::Transient,
        )
        .err().expect("应当返回错误");
    assert!(matches!(err, RegistrationError::InvalidContract { .. }));
}

// ---------------------------------------------------------------------------
// 服务发现
// ---------------------------------------------------------------------------

trait Repository: AutoDiscoverable {
    fn table(&self) -> &'static str;
}
trait Cache: AutoDiscoverable {}
trait Clock: Send + Sync {}

service_contract!(dyn Repository: dyn AutoDiscoverable);
service_contract!(dyn Cache: dyn AutoDiscoverable);
service_contract!(dyn Clock);

#[derive(Default)]
struct OrderRepository;
impl AutoDiscoverable for OrderRepository {}
impl Repository for OrderRepository {
    fn table(&self) -> &'static str {
        "orders"
    }
}
provides!(OrderRepository => dyn Repository);

impl Injectable for OrderRepository {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<OrderRepository>()
            .default_constructor()
            .provides::<dyn Repository>()
            .build()
    }
}

#[derive(Default)]
struct CachedRepository;
impl AutoDiscoverable for CachedRepository {}
impl Cache for CachedRepository {}
impl Repository for CachedRepository {
    fn table(&self) -> &'static str {
        "cached"
    }
}
provides!(CachedRepository => dyn Cache, dyn Repository);

impl Injectable for CachedRepository {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<CachedRepository>()
            .default_constructor()
            .provides::<dyn Cache>()
            .provides::<dyn Repository>()
            .build()
    }
}

#[derive(Default)]
struct SystemClock;
impl Clock for SystemClock {}
provides!(SystemClock => dyn Clock);

impl Injectable for SystemClock {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<SystemClock>()
            .default_constructor()
            .provides::<dyn Clock>()
            .build()
    }
}

#[test]
fn test_marker_discovery_without_explicit_registration() {
    init_tracing();
    let container = ServiceContainer::new();
    let module = StaticModule::builder("infrastructure")
        .discoverable_service::<dyn Clock, SystemClock>()
        .shared();

    let report = container.register_discoverable_services(&[module]);
    assert!(report.is_clean());
    assert!(container.get::<dyn Clock>().is_ok());
}

#[test]
fn test_cross_scan_registration() {
    init_tracing();
    let container = ServiceContainer::new();
    let contracts = StaticModule::builder("contracts")
        .interface::<dyn Repository>()
        .build();
    let implementations = StaticModule::builder("persistence")
        .export::<SystemClock>()
        .export::<OrderRepository>()
        .export::<CachedRepository>()
        .build();

    container
        .register_from_modules(&contracts, &implementations)
        .unwrap();
    assert_eq!(container.get::<dyn Repository>().unwrap().table(), "orders");
}

#[test]
fn test_structural_discovery_policies() {
    init_tracing();
    let module = || {
        StaticModule::builder("persistence")
            .export::<CachedRepository>()
            .export::<SystemClock>()
            .shared()
    };

    let first_match = ServiceContainer::with_config(
        RegistryConfig::default().with_discovery_policy(DiscoveryPolicy::FirstMatch),
    );
    let report = first_match.register_by_auto_discovery(&[module()]);
    assert_eq!(report.registered.len(), 1);
    assert!(first_match
        .registry()
        .is_registered(&ContractKey::of::<dyn Cache>()));
    assert!(!first_match
        .registry()
        .is_registered(&ContractKey::of::<dyn Clock>()));

    let strict = ServiceContainer::with_config(
        RegistryConfig::default().with_discovery_policy(DiscoveryPolicy::StrictUnique),
    );
    let report = strict.register_by_auto_discovery(&[module()]);
    assert!(report.registered.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert!(strict
        .get_untyped(&ContractKey::of::<dyn Cache>())
        .unwrap()
        .is_none());
}

/// 记录加载次数的模块加载器
struct CountingLoader {
    inner: StaticModuleLoader,
    loads: AtomicUsize,
}

#[async_trait]
impl ModuleLoader for CountingLoader {
    async fn load(&self, reference: &ModuleReference) -> DiscoveryResult<Arc<dyn ServiceModule>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(reference).await
    }
}

#[tokio::test]
async fn test_transitive_discovery_from_root_module() {
    init_tracing();
    let container = ServiceContainer::new();
    let root = StaticModule::builder("app")
        .references(["persistence", "persistence"])
        .shared();
    let loader = CountingLoader {
        inner: StaticModuleLoader::new().with_module(
            StaticModule::builder("persistence")
                .export::<OrderRepository>()
                .shared(),
        ),
        loads: AtomicUsize::new(0),
    };

    let report = container
        .register_with_auto_discovery_from(root, &loader)
        .await
        .unwrap();
    assert_eq!(report.registered.len(), 1);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    assert_eq!(container.get::<dyn Repository>().unwrap().table(), "orders");
}

#[tokio::test]
async fn test_transitive_discovery_requires_reference_metadata() {
    init_tracing();
    let container = ServiceContainer::new();
    let root = StaticModule::builder("opaque")
        .export::<OrderRepository>()
        .shared();

    let err = container
        .register_with_auto_discovery_from(root, &StaticModuleLoader::new())
        .await
        .err().expect("应当返回错误");
    assert!(matches!(err, DiscoveryError::MetadataAccess { .. }));
    assert!(!container.registry().is_registered(&ContractKey::of::<dyn Repository>()));
}

#[tokio::test]
async fn test_missing_referenced_module_fails_to_load() {
    init_tracing();
    let container = ServiceContainer::new();
    let root = StaticModule::builder("app").references(["ghost"]).shared();

    let err = container
        .register_with_auto_discovery_from(root, &StaticModuleLoader::new())
        .await
        .err().expect("应当返回错误");
    assert!(matches!(err, DiscoveryError::ModuleLoad { .. }));
}
