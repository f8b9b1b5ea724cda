//! 模块元数据抽象接口
//!
//! 模块是一组导出的实现类型、接口契约和模块级的"可发现服务"声明。
//! 元数据的来源（静态声明、插件等）对注册表透明。

use crate::contract::ContractDescriptor;
use crate::descriptor::TypeDescriptor;
use async_trait::async_trait;
use infrastructure_common::{DiscoveryError, DiscoveryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 模块引用
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleReference(String);

impl ModuleReference {
    /// 创建模块引用
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 模块名称
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleReference {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// 模块级声明的可发现服务
#[derive(Debug, Clone)]
pub struct DiscoverableService {
    /// 契约
    pub contract: ContractDescriptor,
    /// 实现类型
    pub implementation: Arc<TypeDescriptor>,
}

/// 服务模块 trait
pub trait ServiceModule: Send + Sync {
    /// 模块名称
    fn name(&self) -> &str;

    /// 导出的实现类型
    fn types(&self) -> DiscoveryResult<Vec<Arc<TypeDescriptor>>>;

    /// 导出的接口契约
    fn interfaces(&self) -> DiscoveryResult<Vec<ContractDescriptor>>;

    /// 模块级可发现服务声明
    fn discoverable_services(&self) -> DiscoveryResult<Vec<DiscoverableService>>;

    /// 直接引用的模块
    fn references(&self) -> DiscoveryResult<Vec<ModuleReference>> {
        Err(DiscoveryError::metadata_access(
            self.name(),
            "模块未提供引用元数据",
        ))
    }

    /// 是否参与结构化自动发现
    fn auto_discovery(&self) -> bool {
        false
    }
}

impl fmt::Debug for dyn ServiceModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceModule")
            .field("name", &self.name())
            .field("auto_discovery", &self.auto_discovery())
            .finish()
    }
}

/// 模块加载器 trait
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// 按引用加载模块
    async fn load(&self, reference: &ModuleReference) -> DiscoveryResult<Arc<dyn ServiceModule>>;
}
