//! 服务解析器实现

use di_abstractions::{
    Argument, ConstructorArgs, Registration, ServiceLocator, ServiceRef, ServiceStore,
    TypeDescriptor,
};
use infrastructure_common::{ContractKey, DependencyError, DependencyResult};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, warn};

/// 服务解析器
///
/// 按注册信息选择构造函数、递归解析构造参数、执行构造后回调并缓存单例。
/// 递归解析期间不持有注册表的锁
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn ServiceStore>,
}

impl Resolver {
    /// 创建新的解析器
    pub fn new(store: Arc<dyn ServiceStore>) -> Self {
        Self { store }
    }

    /// 底层注册表
    pub fn store(&self) -> &Arc<dyn ServiceStore> {
        &self.store
    }

    /// 解析契约
    pub fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Arc<C>> {
        let contract = ContractKey::of::<C>();
        let service = self.resolve_service(&contract, None)?;
        Self::downcast(&contract, service)
    }

    /// 使用显式构造参数解析契约
    pub fn resolve_with<C: ?Sized + Send + Sync + 'static>(
        &self,
        args: Vec<Argument>,
    ) -> DependencyResult<Arc<C>> {
        let contract = ContractKey::of::<C>();
        let service = self.resolve_service(&contract, Some(args))?;
        Self::downcast(&contract, service)
    }

    fn downcast<C: ?Sized + Send + Sync + 'static>(
        contract: &ContractKey,
        service: ServiceRef,
    ) -> DependencyResult<Arc<C>> {
        service
            .downcast::<C>()
            .ok_or_else(|| DependencyError::ContractMismatch {
                contract: contract.name().to_string(),
                implementation: service.contract().name().to_string(),
            })
    }

    fn resolve_at(
        &self,
        contract: &ContractKey,
        explicit_args: Option<Vec<Argument>>,
        depth: usize,
    ) -> DependencyResult<ServiceRef> {
        let max_depth = self.store.config().max_resolution_depth;
        if depth >= max_depth {
            return Err(DependencyError::ResolutionDepthExceeded {
                contract: contract.name().to_string(),
                max_depth,
            });
        }

        let registration = self
            .store
            .lookup(contract)
            .ok_or_else(|| DependencyError::unregistered(contract.name()))?;

        let explicit_args = explicit_args.filter(|args| !args.is_empty());
        if explicit_args.is_none() {
            if let Some(cached) = self.store.get_cached(contract) {
                debug!("命中单例缓存: {}", contract.short_name());
                return Ok(cached);
            }
        }

        let shared = explicit_args.is_none();
        let implementation = &registration.implementation;
        let mut value = match explicit_args {
            Some(args) => Self::construct_with(implementation, args)?,
            None => self.construct(implementation, depth)?,
        };

        if let Some(hook) = self.store.hook(contract) {
            if !hook.apply(value.as_mut()) {
                warn!(
                    "构造后回调的目标类型 {} 与实现类型 {} 不一致，已跳过",
                    hook.target().short_name(),
                    implementation.name()
                );
            }
        }

        self.finish(contract, &registration, value, shared)
    }

    /// 封装实例并按需写入单例缓存
    ///
    /// `shared` 为真时（未传显式参数），若缓存已被其他线程先写入，
    /// 返回缓存中的实例，保证所有调用者拿到同一个单例
    fn finish(
        &self,
        contract: &ContractKey,
        registration: &Registration,
        value: Box<dyn Any + Send + Sync>,
        shared: bool,
    ) -> DependencyResult<ServiceRef> {
        let implementation = &registration.implementation;
        let instance =
            implementation
                .seal(value)
                .ok_or_else(|| DependencyError::NotConstructible {
                    implementation: implementation.name().to_string(),
                    reason: "构造函数返回的类型与实现类型不一致".to_string(),
                })?;

        let service = implementation.view_as(contract, &instance).ok_or_else(|| {
            DependencyError::ContractMismatch {
                contract: contract.name().to_string(),
                implementation: implementation.name().to_string(),
            }
        })?;

        if registration.is_singleton() || self.store.is_singleton(&implementation.key()) {
            if !self.store.put_cached(*contract, service.clone()) && shared {
                if let Some(cached) = self.store.get_cached(contract) {
                    debug!("单例已由其他调用者缓存，丢弃新实例: {}", contract.short_name());
                    return Ok(cached);
                }
            }
        }

        Ok(service)
    }

    fn construct(
        &self,
        implementation: &TypeDescriptor,
        depth: usize,
    ) -> DependencyResult<Box<dyn Any + Send + Sync>> {
        let constructor =
            implementation
                .primary_constructor()
                .ok_or_else(|| DependencyError::NotConstructible {
                    implementation: implementation.name().to_string(),
                    reason: "没有声明构造函数".to_string(),
                })?;

        let mut args = Vec::with_capacity(constructor.arity());
        for parameter in constructor.parameters() {
            let dependency = self.resolve_at(parameter, None, depth + 1)?;
            args.push(Argument::from(dependency));
        }

        debug!(
            "构造 {}，参数数量: {}",
            implementation.name(),
            constructor.arity()
        );
        constructor.invoke(&ConstructorArgs::new(implementation.name(), args))
    }

    fn construct_with(
        implementation: &TypeDescriptor,
        args: Vec<Argument>,
    ) -> DependencyResult<Box<dyn Any + Send + Sync>> {
        if let Some(constructor) = implementation.constructor_with_arity(args.len()) {
            debug!(
                "使用显式参数构造 {}，参数数量: {}",
                implementation.name(),
                args.len()
            );
            return constructor.invoke(&ConstructorArgs::new(implementation.name(), args));
        }

        warn!(
            "{} 没有参数数量为 {} 的构造函数，回退到无参构造函数",
            implementation.name(),
            args.len()
        );
        let constructor =
            implementation
                .default_constructor()
                .ok_or_else(|| DependencyError::NotConstructible {
                    implementation: implementation.name().to_string(),
                    reason: format!("没有参数数量为 {} 的构造函数，也没有无参构造函数", args.len()),
                })?;
        constructor.invoke(&ConstructorArgs::new(implementation.name(), Vec::new()))
    }
}

impl ServiceLocator for Resolver {
    fn resolve_service(
        &self,
        contract: &ContractKey,
        explicit_args: Option<Vec<Argument>>,
    ) -> DependencyResult<ServiceRef> {
        self.resolve_at(contract, explicit_args, 0)
    }

    fn resolve_untyped(&self, contract: &ContractKey) -> DependencyResult<Option<ServiceRef>> {
        if self.store.lookup(contract).is_none() {
            debug!("契约未注册: {}", contract.short_name());
            return Ok(None);
        }
        self.resolve_at(contract, None, 0).map(Some)
    }

    fn can_resolve(&self, contract: &ContractKey) -> bool {
        self.store.lookup(contract).is_some()
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("store", &"<service store>")
            .finish()
    }
}
