//! 服务实例与构造参数

use infrastructure_common::{ContractKey, DependencyError};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 已构造的实现实例，内部保存 `Arc<Impl>`
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 以某个契约视图返回的服务
///
/// 内部保存 `Arc<C>`（`C` 通常为 `dyn Trait`），通过 [`ServiceRef::downcast`] 取出
#[derive(Clone)]
pub struct ServiceRef {
    contract: ContractKey,
    handle: Arc<dyn Any + Send + Sync>,
    address: usize,
}

impl ServiceRef {
    /// 从契约视图创建服务引用
    pub fn new<C: ?Sized + Send + Sync + 'static>(service: Arc<C>) -> Self {
        let address = Arc::as_ptr(&service) as *const () as usize;
        Self {
            contract: ContractKey::of::<C>(),
            handle: Arc::new(service),
            address,
        }
    }

    /// 服务所对应的契约
    pub fn contract(&self) -> ContractKey {
        self.contract
    }

    /// 取出契约视图
    pub fn downcast<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.handle.downcast_ref::<Arc<C>>().cloned()
    }

    /// 是否与另一个引用指向同一个实例
    pub fn ptr_eq(&self, other: &ServiceRef) -> bool {
        self.address == other.address
    }
}

impl fmt::Debug for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRef")
            .field("contract", &self.contract)
            .field("handle", &"<instance>")
            .finish()
    }
}

/// 显式构造参数
///
/// 可以是任意值，也可以是某个契约视图（`Arc<C>`）
#[derive(Clone)]
pub struct Argument(Arc<dyn Any + Send + Sync>);

impl Argument {
    /// 普通值参数
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// 服务参数，以 `Arc<C>` 形式传递
    pub fn service<C: ?Sized + Send + Sync + 'static>(service: Arc<C>) -> Self {
        Self(Arc::new(service))
    }

    /// 按类型借用参数值
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl From<ServiceRef> for Argument {
    fn from(service: ServiceRef) -> Self {
        Self(service.handle)
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Argument(<value>)")
    }
}

/// 传递给构造函数的参数列表
#[derive(Debug, Clone)]
pub struct ConstructorArgs {
    implementation: String,
    args: Vec<Argument>,
}

impl ConstructorArgs {
    /// 创建参数列表
    pub fn new(implementation: impl Into<String>, args: Vec<Argument>) -> Self {
        Self {
            implementation: implementation.into(),
            args,
        }
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// 构造的实现类型名称
    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// 获取指定位置的原始参数
    pub fn argument(&self, index: usize) -> Option<&Argument> {
        self.args.get(index)
    }

    /// 按类型获取指定位置的参数值
    pub fn get<T: Clone + 'static>(&self, index: usize) -> Result<T, DependencyError> {
        let argument = self
            .args
            .get(index)
            .ok_or_else(|| DependencyError::MissingArgument {
                implementation: self.implementation.clone(),
                index,
            })?;

        argument
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| DependencyError::ArgumentTypeMismatch {
                implementation: self.implementation.clone(),
                index,
                expected: std::any::type_name::<T>(),
            })
    }

    /// 获取指定位置的服务参数
    pub fn service<C: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<Arc<C>, DependencyError> {
        self.get::<Arc<C>>(index)
    }
}
