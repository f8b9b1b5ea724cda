//! 服务容器
//!
//! 组合注册表、解析器与发现器，并提供进程级的全局容器

use crate::discovery::{DiscoveryReport, ServiceDiscovery};
use crate::registry::ServiceRegistry;
use crate::resolver::Resolver;
use di_abstractions::{
    Argument, Injectable, ModuleLoader, Provides, RegistrationInfo, ServiceContract,
    ServiceLocator, ServiceModule, ServiceRef, ServiceStore,
};
use infrastructure_common::{
    ContractKey, DependencyResult, DiscoveryResult, RegistrationResult, RegistryConfig,
};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::{info, warn};

static GLOBAL_CONTAINER: Lazy<ServiceContainer> = Lazy::new(|| {
    let config = RegistryConfig::from_env().unwrap_or_else(|e| {
        warn!("全局容器配置加载失败，使用默认配置: {}", e);
        RegistryConfig::default()
    });
    info!("初始化全局服务容器");
    ServiceContainer::with_config(config)
});

/// 服务容器
#[derive(Debug, Clone)]
pub struct ServiceContainer {
    registry: Arc<ServiceRegistry>,
    resolver: Resolver,
    discovery: ServiceDiscovery,
}

impl ServiceContainer {
    /// 创建新的容器
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// 使用指定配置创建容器
    pub fn with_config(config: RegistryConfig) -> Self {
        let registry = Arc::new(ServiceRegistry::with_config(config));
        let store: Arc<dyn ServiceStore> = registry.clone();
        Self {
            registry,
            resolver: Resolver::new(store.clone()),
            discovery: ServiceDiscovery::new(store),
        }
    }

    /// 进程级全局容器，首次访问时创建
    pub fn global() -> &'static ServiceContainer {
        &GLOBAL_CONTAINER
    }

    /// 注册表
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// 解析器
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// 发现器
    pub fn discovery(&self) -> &ServiceDiscovery {
        &self.discovery
    }

    /// 注册瞬时服务
    pub fn register<C, I>(&self) -> RegistrationResult<()>
    where
        C: ServiceContract + ?Sized + Send + Sync,
        I: Injectable + Provides<C>,
    {
        self.registry.register::<C, I>()
    }

    /// 注册单例服务
    pub fn register_singleton<C, I>(&self) -> RegistrationResult<()>
    where
        C: ServiceContract + ?Sized + Send + Sync,
        I: Injectable + Provides<C>,
    {
        self.registry.register_singleton::<C, I>()
    }

    /// 注册带构造后回调的服务
    pub fn register_with_hook<C, I, F>(&self, hook: F) -> RegistrationResult<()>
    where
        C: ServiceContract + ?Sized + Send + Sync,
        I: Injectable + Provides<C>,
        F: Fn(&mut I) + Send + Sync + 'static,
    {
        self.registry.register_with_hook::<C, I, F>(hook)
    }

    /// 以实现类型自身注册
    pub fn register_type<T: Injectable>(&self) -> RegistrationResult<()> {
        self.registry.register_type::<T>()
    }

    /// 解析服务
    pub fn get<C: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Arc<C>> {
        self.resolver.resolve::<C>()
    }

    /// 使用显式构造参数解析服务
    pub fn get_with<C: ?Sized + Send + Sync + 'static>(
        &self,
        args: Vec<Argument>,
    ) -> DependencyResult<Arc<C>> {
        self.resolver.resolve_with::<C>(args)
    }

    /// 按契约键解析服务，未注册时返回 `Ok(None)`
    pub fn get_untyped(&self, contract: &ContractKey) -> DependencyResult<Option<ServiceRef>> {
        self.resolver.resolve_untyped(contract)
    }

    /// 交叉扫描注册
    pub fn register_from_modules(
        &self,
        interfaces: &dyn ServiceModule,
        implementations: &dyn ServiceModule,
    ) -> DiscoveryResult<DiscoveryReport> {
        self.discovery
            .register_from_modules(interfaces, implementations)
    }

    /// 结构化自动发现注册
    pub fn register_by_auto_discovery(
        &self,
        modules: &[Arc<dyn ServiceModule>],
    ) -> DiscoveryReport {
        self.discovery.register_by_auto_discovery(modules)
    }

    /// 注册模块级可发现服务声明
    pub fn register_discoverable_services(
        &self,
        modules: &[Arc<dyn ServiceModule>],
    ) -> DiscoveryReport {
        self.discovery.register_discoverable_services(modules)
    }

    /// 从根模块及其引用模块做结构化自动发现
    pub async fn register_with_auto_discovery_from(
        &self,
        root: Arc<dyn ServiceModule>,
        loader: &dyn ModuleLoader,
    ) -> DiscoveryResult<DiscoveryReport> {
        self.discovery
            .register_with_auto_discovery_from(root, loader)
            .await
    }

    /// 注册快照
    pub fn snapshot(&self) -> Vec<RegistrationInfo> {
        self.registry.snapshot()
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{provides, service_contract, TypeDescriptor};

    trait Counter: Send + Sync {
        fn value(&self) -> u32;
    }

    service_contract!(dyn Counter);

    #[derive(Default)]
    struct Zero;

    impl Counter for Zero {
        fn value(&self) -> u32 {
            0
        }
    }

    provides!(Zero => dyn Counter);

    impl Injectable for Zero {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::builder::<Zero>().default_constructor().build()
        }
    }

    #[test]
    fn containers_are_isolated() {
        let first = ServiceContainer::new();
        let second = ServiceContainer::new();
        first.register::<dyn Counter, Zero>().unwrap();

        assert_eq!(first.get::<dyn Counter>().unwrap().value(), 0);
        assert!(second.get::<dyn Counter>().err().expect("应当返回错误").is_unregistered());
        assert!(second
            .get_untyped(&ContractKey::of::<dyn Counter>())
            .unwrap()
            .is_none());
    }

    #[test]
    fn global_container_is_shared() {
        assert!(std::ptr::eq(
            ServiceContainer::global(),
            ServiceContainer::global()
        ));
    }
}
