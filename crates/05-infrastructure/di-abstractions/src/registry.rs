//! 服务注册表抽象接口

use crate::contract::ContractDescriptor;
use crate::descriptor::TypeDescriptor;
use crate::hook::PostConstruct;
use crate::instance::ServiceRef;
use infrastructure_common::{
    ContractKey, Lifetime, RegistrationOrigin, RegistrationResult, RegistryConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 服务注册表 trait
///
/// 保存契约到实现类型的映射、单例缓存以及每个契约的构造后回调。
/// 所有方法都是短操作，实现不应在调用方回调期间持有锁
pub trait ServiceStore: Send + Sync {
    /// 以契约为键注册实现类型，覆盖同一契约的旧注册
    ///
    /// `hook` 为 `None` 时保留契约已有的回调
    fn register(
        &self,
        contract: ContractDescriptor,
        implementation: Arc<TypeDescriptor>,
        hook: Option<PostConstruct>,
        lifetime: Lifetime,
    ) -> RegistrationResult<()>;

    /// 以实现类型自身为契约注册，没有接口限制
    fn register_type(
        &self,
        implementation: Arc<TypeDescriptor>,
        hook: Option<PostConstruct>,
        lifetime: Lifetime,
    ) -> RegistrationResult<()>;

    /// 注册发现得到的服务，不覆盖显式注册；返回是否写入
    fn register_discoverable(
        &self,
        contract: ContractDescriptor,
        implementation: Arc<TypeDescriptor>,
    ) -> RegistrationResult<bool>;

    /// 查找契约对应的注册，精确匹配失败时回退扫描已知实现类型
    fn lookup(&self, contract: &ContractKey) -> Option<Registration>;

    /// 获取契约的构造后回调
    fn hook(&self, contract: &ContractKey) -> Option<PostConstruct>;

    /// 实现类型是否按单例处理
    fn is_singleton(&self, implementation: &ContractKey) -> bool;

    /// 获取缓存的单例
    fn get_cached(&self, contract: &ContractKey) -> Option<ServiceRef>;

    /// 缓存单例，已存在时不覆盖并返回 `false`
    fn put_cached(&self, contract: ContractKey, instance: ServiceRef) -> bool;

    /// 所有注册的快照
    fn registrations(&self) -> Vec<Registration>;

    /// 注册表配置
    fn config(&self) -> &RegistryConfig;
}

/// 注册信息
#[derive(Debug, Clone)]
pub struct Registration {
    /// 契约
    pub contract: ContractDescriptor,
    /// 实现类型
    pub implementation: Arc<TypeDescriptor>,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 注册来源
    pub origin: RegistrationOrigin,
}

impl Registration {
    /// 创建注册信息
    pub fn new(
        contract: ContractDescriptor,
        implementation: Arc<TypeDescriptor>,
        lifetime: Lifetime,
        origin: RegistrationOrigin,
    ) -> Self {
        Self {
            contract,
            implementation,
            lifetime,
            origin,
        }
    }

    /// 契约键
    pub fn contract_key(&self) -> ContractKey {
        self.contract.key()
    }

    /// 是否按单例处理（注册生命周期或类型标记）
    pub fn is_singleton(&self) -> bool {
        self.lifetime.is_singleton() || self.implementation.is_singleton()
    }
}

/// 可序列化的注册快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationInfo {
    /// 契约名称
    pub contract: String,
    /// 实现类型名称
    pub implementation: String,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 注册来源
    pub origin: RegistrationOrigin,
    /// 是否已有缓存实例
    pub cached: bool,
}

impl RegistrationInfo {
    /// 从注册信息创建快照
    pub fn from_registration(registration: &Registration, cached: bool) -> Self {
        Self {
            contract: registration.contract_key().short_name().to_string(),
            implementation: registration.implementation.name().to_string(),
            lifetime: registration.lifetime,
            origin: registration.origin,
            cached,
        }
    }
}
