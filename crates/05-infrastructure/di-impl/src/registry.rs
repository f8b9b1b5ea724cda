//! 服务注册表实现

use di_abstractions::{
    Capability, ContractDescriptor, Injectable, PostConstruct, Provides, Registration,
    RegistrationInfo, ServiceContract, ServiceRef, ServiceStore, TypeDescriptor,
};
use infrastructure_common::{
    ContractKey, Lifetime, RegistrationError, RegistrationOrigin, RegistrationResult,
    RegistryConfig,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 注册表内部状态
#[derive(Default)]
struct RegistryState {
    /// 契约到注册信息的映射
    registrations: HashMap<ContractKey, Registration>,
    /// 按注册顺序排列的已知实现类型，用于能力回退查找
    implementations: Vec<Arc<TypeDescriptor>>,
    /// 每个契约的构造后回调
    hooks: HashMap<ContractKey, PostConstruct>,
    /// 单例缓存
    cache: HashMap<ContractKey, ServiceRef>,
}

impl RegistryState {
    fn remember(&mut self, implementation: &Arc<TypeDescriptor>) {
        let key = implementation.key();
        match self
            .implementations
            .iter_mut()
            .find(|known| known.key() == key)
        {
            Some(known) => *known = implementation.clone(),
            None => self.implementations.push(implementation.clone()),
        }
    }

    fn registration_of(&self, implementation: &ContractKey) -> Option<&Registration> {
        self.registrations
            .values()
            .find(|registration| registration.implementation.key() == *implementation)
    }
}

/// 服务注册表
pub struct ServiceRegistry {
    state: RwLock<RegistryState>,
    config: RegistryConfig,
}

impl ServiceRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// 使用指定配置创建注册表
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            config,
        }
    }

    /// 注册瞬时服务
    pub fn register<C, I>(&self) -> RegistrationResult<()>
    where
        C: ServiceContract + ?Sized + Send + Sync,
        I: Injectable + Provides<C>,
    {
        self.register_typed::<C, I>(None, Lifetime::Transient)
    }

    /// 注册单例服务
    pub fn register_singleton<C, I>(&self) -> RegistrationResult<()>
    where
        C: ServiceContract + ?Sized + Send + Sync,
        I: Injectable + Provides<C>,
    {
        self.register_typed::<C, I>(None, Lifetime::Singleton)
    }

    /// 注册带构造后回调的瞬时服务
    pub fn register_with_hook<C, I, F>(&self, hook: F) -> RegistrationResult<()>
    where
        C: ServiceContract + ?Sized + Send + Sync,
        I: Injectable + Provides<C>,
        F: Fn(&mut I) + Send + Sync + 'static,
    {
        self.register_typed::<C, I>(Some(PostConstruct::new(hook)), Lifetime::Transient)
    }

    /// 注册带构造后回调的单例服务
    pub fn register_singleton_with_hook<C, I, F>(&self, hook: F) -> RegistrationResult<()>
    where
        C: ServiceContract + ?Sized + Send + Sync,
        I: Injectable + Provides<C>,
        F: Fn(&mut I) + Send + Sync + 'static,
    {
        self.register_typed::<C, I>(Some(PostConstruct::new(hook)), Lifetime::Singleton)
    }

    /// 以实现类型自身注册
    pub fn register_type<T: Injectable>(&self) -> RegistrationResult<()> {
        ServiceStore::register_type(self, Arc::new(T::descriptor()), None, Lifetime::Transient)
    }

    /// 以实现类型自身注册单例
    pub fn register_singleton_type<T: Injectable>(&self) -> RegistrationResult<()> {
        ServiceStore::register_type(self, Arc::new(T::descriptor()), None, Lifetime::Singleton)
    }

    /// 以实现类型自身注册，并附带构造后回调
    pub fn register_type_with_hook<T, F>(&self, hook: F) -> RegistrationResult<()>
    where
        T: Injectable,
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        ServiceStore::register_type(
            self,
            Arc::new(T::descriptor()),
            Some(PostConstruct::new(hook)),
            Lifetime::Transient,
        )
    }

    fn register_typed<C, I>(
        &self,
        hook: Option<PostConstruct>,
        lifetime: Lifetime,
    ) -> RegistrationResult<()>
    where
        C: ServiceContract + ?Sized + Send + Sync,
        I: Injectable + Provides<C>,
    {
        let implementation = I::descriptor().with_capability(Capability::of::<C, I>());
        ServiceStore::register(self, C::contract(), Arc::new(implementation), hook, lifetime)
    }

    /// 可序列化的注册快照，按契约名称排序
    pub fn snapshot(&self) -> Vec<RegistrationInfo> {
        let state = self.state.read();
        let mut infos: Vec<RegistrationInfo> = state
            .registrations
            .iter()
            .map(|(key, registration)| {
                RegistrationInfo::from_registration(registration, state.cache.contains_key(key))
            })
            .collect();
        infos.sort_by(|a, b| a.contract.cmp(&b.contract));
        infos
    }

    /// 注册数量
    pub fn len(&self) -> usize {
        self.state.read().registrations.len()
    }

    /// 是否没有任何注册
    pub fn is_empty(&self) -> bool {
        self.state.read().registrations.is_empty()
    }

    /// 契约是否有精确匹配的注册
    pub fn is_registered(&self, contract: &ContractKey) -> bool {
        self.state.read().registrations.contains_key(contract)
    }

    /// 已缓存的单例数量
    pub fn cached_count(&self) -> usize {
        self.state.read().cache.len()
    }

    fn validate(
        contract: &ContractDescriptor,
        implementation: &TypeDescriptor,
    ) -> RegistrationResult<()> {
        if !implementation.is_concrete() {
            return Err(RegistrationError::NotConstructible {
                implementation: implementation.name().to_string(),
            });
        }
        if !implementation.provides(&contract.key()) {
            return Err(RegistrationError::ContractNotProvided {
                contract: contract.key().name().to_string(),
                implementation: implementation.name().to_string(),
            });
        }
        Ok(())
    }

    fn insert(
        &self,
        contract: ContractDescriptor,
        implementation: Arc<TypeDescriptor>,
        hook: Option<PostConstruct>,
        lifetime: Lifetime,
        origin: RegistrationOrigin,
    ) -> bool {
        let key = contract.key();
        let mut state = self.state.write();

        if let Some(existing) = state.registrations.get(&key) {
            if !existing.origin.yields_to(origin) {
                warn!(
                    "忽略发现的服务 {} -> {}，契约已被显式注册为 {}",
                    key.short_name(),
                    implementation.name(),
                    existing.implementation.name()
                );
                return false;
            }
            debug!(
                "覆盖注册: {} ({} -> {})",
                key.short_name(),
                existing.implementation.name(),
                implementation.name()
            );
        }

        state.remember(&implementation);
        if let Some(hook) = hook {
            state.hooks.insert(key, hook);
        }

        info!(
            "注册服务: {} -> {} ({})",
            key.short_name(),
            implementation.name(),
            lifetime
        );
        state.registrations.insert(
            key,
            Registration::new(contract, implementation, lifetime, origin),
        );
        true
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ServiceRegistry")
            .field("registrations", &state.registrations.len())
            .field("implementations", &state.implementations.len())
            .field("cached", &state.cache.len())
            .field("config", &self.config)
            .finish()
    }
}

impl ServiceStore for ServiceRegistry {
    fn register(
        &self,
        contract: ContractDescriptor,
        implementation: Arc<TypeDescriptor>,
        hook: Option<PostConstruct>,
        lifetime: Lifetime,
    ) -> RegistrationResult<()> {
        if !contract.is_interface() {
            return Err(RegistrationError::InvalidContract {
                contract: contract.key().name().to_string(),
            });
        }
        Self::validate(&contract, &implementation)?;
        self.insert(
            contract,
            implementation,
            hook,
            lifetime,
            RegistrationOrigin::Explicit,
        );
        Ok(())
    }

    fn register_type(
        &self,
        implementation: Arc<TypeDescriptor>,
        hook: Option<PostConstruct>,
        lifetime: Lifetime,
    ) -> RegistrationResult<()> {
        let contract = implementation.self_contract().clone();
        Self::validate(&contract, &implementation)?;
        self.insert(
            contract,
            implementation,
            hook,
            lifetime,
            RegistrationOrigin::Explicit,
        );
        Ok(())
    }

    fn register_discoverable(
        &self,
        contract: ContractDescriptor,
        implementation: Arc<TypeDescriptor>,
    ) -> RegistrationResult<bool> {
        Self::validate(&contract, &implementation)?;
        Ok(self.insert(
            contract,
            implementation,
            None,
            Lifetime::Transient,
            RegistrationOrigin::Discovered,
        ))
    }

    fn lookup(&self, contract: &ContractKey) -> Option<Registration> {
        let state = self.state.read();
        if let Some(registration) = state.registrations.get(contract) {
            return Some(registration.clone());
        }
        if !self.config.capability_fallback {
            return None;
        }

        let implementation = state
            .implementations
            .iter()
            .find(|implementation| implementation.provides(contract))?;
        let capability = implementation.capability(contract)?;
        let (lifetime, origin) = state
            .registration_of(&implementation.key())
            .map(|registration| (registration.lifetime, registration.origin))
            .unwrap_or((Lifetime::Transient, RegistrationOrigin::Discovered));

        debug!(
            "契约 {} 未注册，回退到实现类型 {}",
            contract.short_name(),
            implementation.name()
        );
        Some(Registration::new(
            capability.contract().clone(),
            implementation.clone(),
            lifetime,
            origin,
        ))
    }

    fn hook(&self, contract: &ContractKey) -> Option<PostConstruct> {
        self.state.read().hooks.get(contract).cloned()
    }

    fn is_singleton(&self, implementation: &ContractKey) -> bool {
        let state = self.state.read();
        state.registrations.values().any(|registration| {
            registration.implementation.key() == *implementation && registration.is_singleton()
        }) || state
            .implementations
            .iter()
            .any(|known| known.key() == *implementation && known.is_singleton())
    }

    fn get_cached(&self, contract: &ContractKey) -> Option<ServiceRef> {
        self.state.read().cache.get(contract).cloned()
    }

    fn put_cached(&self, contract: ContractKey, instance: ServiceRef) -> bool {
        let mut state = self.state.write();
        if state.cache.contains_key(&contract) {
            return false;
        }
        debug!("缓存单例: {}", contract.short_name());
        state.cache.insert(contract, instance);
        true
    }

    fn registrations(&self) -> Vec<Registration> {
        self.state.read().registrations.values().cloned().collect()
    }

    fn config(&self) -> &RegistryConfig {
        &self.config
    }
}
