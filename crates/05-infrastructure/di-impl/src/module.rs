//! 静态模块元数据
//!
//! 在代码中声明模块导出的类型、接口、可发现服务以及模块引用

use async_trait::async_trait;
use di_abstractions::{
    Capability, ContractDescriptor, DiscoverableService, Injectable, ModuleLoader,
    ModuleReference, Provides, ServiceContract, ServiceModule, TypeDescriptor,
};
use infrastructure_common::{DiscoveryError, DiscoveryResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 静态声明的服务模块
#[derive(Debug, Clone)]
pub struct StaticModule {
    name: String,
    types: Vec<Arc<TypeDescriptor>>,
    interfaces: Vec<ContractDescriptor>,
    discoverable: Vec<DiscoverableService>,
    references: Option<Vec<ModuleReference>>,
    auto_discovery: bool,
}

impl StaticModule {
    /// 创建模块构建器
    pub fn builder(name: impl Into<String>) -> StaticModuleBuilder {
        StaticModuleBuilder {
            module: StaticModule {
                name: name.into(),
                types: Vec::new(),
                interfaces: Vec::new(),
                discoverable: Vec::new(),
                references: None,
                auto_discovery: false,
            },
        }
    }
}

impl ServiceModule for StaticModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn types(&self) -> DiscoveryResult<Vec<Arc<TypeDescriptor>>> {
        Ok(self.types.clone())
    }

    fn interfaces(&self) -> DiscoveryResult<Vec<ContractDescriptor>> {
        Ok(self.interfaces.clone())
    }

    fn discoverable_services(&self) -> DiscoveryResult<Vec<DiscoverableService>> {
        Ok(self.discoverable.clone())
    }

    fn references(&self) -> DiscoveryResult<Vec<ModuleReference>> {
        self.references.clone().ok_or_else(|| {
            DiscoveryError::metadata_access(&self.name, "模块未声明引用元数据")
        })
    }

    fn auto_discovery(&self) -> bool {
        self.auto_discovery
    }
}

/// 静态模块构建器
#[derive(Debug)]
pub struct StaticModuleBuilder {
    module: StaticModule,
}

impl StaticModuleBuilder {
    /// 导出接口契约
    pub fn interface<C: ServiceContract + ?Sized>(mut self) -> Self {
        self.module.interfaces.push(C::contract());
        self
    }

    /// 导出实现类型
    pub fn export<T: Injectable>(self) -> Self {
        self.export_descriptor(T::descriptor())
    }

    /// 导出实现类型描述符
    pub fn export_descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.module.types.push(Arc::new(descriptor));
        self
    }

    /// 声明模块级可发现服务
    pub fn discoverable_service<C, I>(mut self) -> Self
    where
        C: ServiceContract + ?Sized + Send + Sync,
        I: Injectable + Provides<C>,
    {
        let implementation = I::descriptor().with_capability(Capability::of::<C, I>());
        self.module.discoverable.push(DiscoverableService {
            contract: C::contract(),
            implementation: Arc::new(implementation),
        });
        self
    }

    /// 声明直接引用的模块
    pub fn references<I, R>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ModuleReference>,
    {
        self.module.references = Some(references.into_iter().map(Into::into).collect());
        self
    }

    /// 设置是否参与结构化自动发现
    pub fn auto_discovery(mut self, enabled: bool) -> Self {
        self.module.auto_discovery = enabled;
        self
    }

    /// 构建模块
    pub fn build(self) -> StaticModule {
        self.module
    }

    /// 构建为共享模块
    pub fn shared(self) -> Arc<dyn ServiceModule> {
        Arc::new(self.module)
    }
}

/// 按名称加载静态模块的加载器
#[derive(Default)]
pub struct StaticModuleLoader {
    modules: HashMap<String, Arc<dyn ServiceModule>>,
}

impl StaticModuleLoader {
    /// 创建新的加载器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加模块
    pub fn with_module(mut self, module: Arc<dyn ServiceModule>) -> Self {
        self.insert(module);
        self
    }

    /// 添加模块，同名模块会被替换
    pub fn insert(&mut self, module: Arc<dyn ServiceModule>) {
        self.modules.insert(module.name().to_string(), module);
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn load(&self, reference: &ModuleReference) -> DiscoveryResult<Arc<dyn ServiceModule>> {
        debug!("加载模块: {}", reference);
        self.modules
            .get(reference.name())
            .cloned()
            .ok_or_else(|| DiscoveryError::module_load(reference.name(), "模块不存在"))
    }
}

impl std::fmt::Debug for StaticModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.modules.keys().collect();
        names.sort();
        f.debug_struct("StaticModuleLoader")
            .field("modules", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_unavailable_unless_declared() {
        let module = StaticModule::builder("plain").build();
        let err = module.references().err().expect("应当返回错误");
        assert!(matches!(err, DiscoveryError::MetadataAccess { .. }));

        let module = StaticModule::builder("root")
            .references(["a", "b"])
            .build();
        let names: Vec<String> = module
            .references()
            .unwrap()
            .iter()
            .map(|reference| reference.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn loader_reports_unknown_modules() {
        let loader = StaticModuleLoader::new()
            .with_module(StaticModule::builder("known").shared());

        let module = loader.load(&ModuleReference::new("known")).await.unwrap();
        assert_eq!(module.name(), "known");

        let err = loader
            .load(&ModuleReference::new("unknown"))
            .await
            .err().expect("应当返回错误");
        assert!(matches!(err, DiscoveryError::ModuleLoad { .. }));
    }
}
