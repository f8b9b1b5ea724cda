//! 实现类型描述符
//!
//! 用显式的描述符代替运行时反射：构造函数是带参数契约列表的工厂闭包，
//! 能力（capability）是把实现实例转换为某个契约视图的函数。

use crate::contract::{ContractDescriptor, ServiceContract};
use crate::instance::{ConstructorArgs, Instance, ServiceRef};
use infrastructure_common::{ContractKey, DependencyError};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 实现类型可以作为契约 `C` 提供
///
/// 每个类型都可以作为自身提供；`dyn Trait` 契约通过 [`provides!`](crate::provides) 声明
pub trait Provides<C: ?Sized + 'static>: Send + Sync + 'static {
    /// 转换为契约视图
    fn upcast(self: Arc<Self>) -> Arc<C>;
}

impl<T: Send + Sync + 'static> Provides<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// 声明实现类型可以作为一个或多个 `dyn Trait` 契约提供
///
/// ```rust
/// use di_abstractions::{provides, Provides};
/// use std::sync::Arc;
///
/// pub trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// pub struct FixedClock;
///
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 {
///         42
///     }
/// }
///
/// provides!(FixedClock => dyn Clock);
///
/// let clock: Arc<dyn Clock> = Provides::<dyn Clock>::upcast(Arc::new(FixedClock));
/// assert_eq!(clock.now(), 42);
/// ```
#[macro_export]
macro_rules! provides {
    ($implementation:ty => $($contract:ty),+ $(,)?) => {
        $(
            impl $crate::Provides<$contract> for $implementation {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
                    self
                }
            }
        )+
    };
}

/// 工厂函数类型
pub type FactoryFn = Arc<
    dyn Fn(&ConstructorArgs) -> Result<Box<dyn Any + Send + Sync>, DependencyError> + Send + Sync,
>;

/// 构造函数描述
#[derive(Clone)]
pub struct Constructor {
    parameters: Vec<ContractKey>,
    factory: FactoryFn,
}

impl Constructor {
    /// 创建构造函数描述，`parameters` 为按位置排列的参数契约
    pub fn new<T, F>(parameters: Vec<ContractKey>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ConstructorArgs) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        Self {
            parameters,
            factory: Arc::new(move |args: &ConstructorArgs| {
                factory(args).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
            }),
        }
    }

    /// 参数契约
    pub fn parameters(&self) -> &[ContractKey] {
        &self.parameters
    }

    /// 参数个数
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// 调用工厂函数
    pub fn invoke(&self, args: &ConstructorArgs) -> Result<Box<dyn Any + Send + Sync>, DependencyError> {
        (self.factory)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("parameters", &self.parameters)
            .field("factory", &"<function>")
            .finish()
    }
}

type ViewFn = fn(&Instance) -> Option<ServiceRef>;

/// 实现类型声明的能力：可以作为某个契约提供
#[derive(Clone)]
pub struct Capability {
    contract: ContractDescriptor,
    view: ViewFn,
}

impl Capability {
    /// 实现类型 `I` 作为契约 `C` 的能力
    pub fn of<C, I>() -> Self
    where
        C: ServiceContract + ?Sized + Send + Sync,
        I: Provides<C>,
    {
        Self {
            contract: C::contract(),
            view: view_as::<C, I>,
        }
    }

    /// 实现类型作为自身提供的能力
    pub fn concrete<T: Send + Sync + 'static>() -> Self {
        Self {
            contract: ContractDescriptor::concrete::<T>(),
            view: view_as::<T, T>,
        }
    }

    /// 能力对应的契约
    pub fn contract(&self) -> &ContractDescriptor {
        &self.contract
    }

    /// 把实例转换为契约视图
    pub fn view(&self, instance: &Instance) -> Option<ServiceRef> {
        (self.view)(instance)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("contract", &self.contract.key())
            .finish()
    }
}

fn view_as<C, I>(instance: &Instance) -> Option<ServiceRef>
where
    C: ?Sized + Send + Sync + 'static,
    I: Provides<C>,
{
    let concrete = instance.clone().downcast::<I>().ok()?;
    Some(ServiceRef::new::<C>(<I as Provides<C>>::upcast(concrete)))
}

fn seal<T: Send + Sync + 'static>(value: Box<dyn Any + Send + Sync>) -> Option<Instance> {
    let value = value.downcast::<T>().ok()?;
    Some(Arc::<T>::from(value) as Instance)
}

/// 实现类型描述符
#[derive(Clone)]
pub struct TypeDescriptor {
    key: ContractKey,
    name: String,
    constructors: Vec<Constructor>,
    capabilities: Vec<Capability>,
    itself: Capability,
    singleton: bool,
    seal: fn(Box<dyn Any + Send + Sync>) -> Option<Instance>,
}

impl TypeDescriptor {
    /// 创建描述符构建器
    pub fn builder<T: Send + Sync + 'static>() -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder::new()
    }

    /// 实现类型键
    pub fn key(&self) -> ContractKey {
        self.key
    }

    /// 实现类型名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 实现类型作为自身时的契约
    pub fn self_contract(&self) -> &ContractDescriptor {
        self.itself.contract()
    }

    /// 追加能力，已声明的契约不会重复添加
    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.provides(&capability.contract().key()) {
            self.capabilities.push(capability);
        }
        self
    }

    /// 按声明顺序排列的构造函数
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// 按声明顺序排列的能力，不包括实现类型自身
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// 是否带有单例标记
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// 是否可以构造（至少有一个构造函数）
    pub fn is_concrete(&self) -> bool {
        !self.constructors.is_empty()
    }

    /// 是否可以作为指定契约提供
    pub fn provides(&self, contract: &ContractKey) -> bool {
        self.capability(contract).is_some()
    }

    /// 查找指定契约的能力
    pub fn capability(&self, contract: &ContractKey) -> Option<&Capability> {
        if self.itself.contract().key() == *contract {
            return Some(&self.itself);
        }
        self.capabilities
            .iter()
            .find(|capability| capability.contract().key() == *contract)
    }

    /// 是否可以赋值给指定契约（包括能力的传递扩展）
    pub fn is_assignable_to(&self, contract: &ContractKey) -> bool {
        self.key == *contract
            || self
                .capabilities
                .iter()
                .any(|capability| capability.contract().is_assignable_to(contract))
    }

    /// 以指定契约视图返回实例
    pub fn view_as(&self, contract: &ContractKey, instance: &Instance) -> Option<ServiceRef> {
        self.capability(contract)?.view(instance)
    }

    /// 第一个构造函数
    pub fn primary_constructor(&self) -> Option<&Constructor> {
        self.constructors.first()
    }

    /// 参数个数匹配的构造函数
    pub fn constructor_with_arity(&self, arity: usize) -> Option<&Constructor> {
        self.constructors
            .iter()
            .find(|constructor| constructor.arity() == arity)
    }

    /// 无参构造函数
    pub fn default_constructor(&self) -> Option<&Constructor> {
        self.constructor_with_arity(0)
    }

    /// 把构造出的值转换为共享实例
    pub fn seal(&self, value: Box<dyn Any + Send + Sync>) -> Option<Instance> {
        (self.seal)(value)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("constructors", &self.constructors)
            .field("capabilities", &self.capabilities)
            .field("singleton", &self.singleton)
            .finish()
    }
}

/// 类型描述符构建器
pub struct TypeDescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeDescriptorBuilder<T> {
    fn new() -> Self {
        let key = ContractKey::of::<T>();
        Self {
            descriptor: TypeDescriptor {
                key,
                name: key.short_name().to_string(),
                constructors: Vec::new(),
                capabilities: Vec::new(),
                itself: Capability::concrete::<T>(),
                singleton: false,
                seal: seal::<T>,
            },
            _marker: PhantomData,
        }
    }

    /// 设置显示名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = name.into();
        self
    }

    /// 添加构造函数
    pub fn constructor<F>(mut self, parameters: Vec<ContractKey>, factory: F) -> Self
    where
        F: Fn(&ConstructorArgs) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.descriptor
            .constructors
            .push(Constructor::new(parameters, factory));
        self
    }

    /// 添加使用 `Default` 的无参构造函数
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(Vec::new(), |_| Ok(T::default()))
    }

    /// 声明能力
    pub fn provides<C>(mut self) -> Self
    where
        C: ServiceContract + ?Sized + Send + Sync,
        T: Provides<C>,
    {
        self.descriptor.capabilities.push(Capability::of::<C, T>());
        self
    }

    /// 添加单例标记
    pub fn singleton(mut self) -> Self {
        self.descriptor.singleton = true;
        self
    }

    /// 构建描述符
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

/// 可注入的实现类型
pub trait Injectable: Send + Sync + Sized + 'static {
    /// 类型描述符
    fn descriptor() -> TypeDescriptor;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::AutoDiscoverable;
    use crate::instance::Argument;

    trait Greeter: AutoDiscoverable {
        fn greet(&self) -> String;
    }
    trait Farewell: Send + Sync {}

    crate::service_contract!(dyn Greeter: dyn AutoDiscoverable);
    crate::service_contract!(dyn Farewell);

    struct Polite {
        name: String,
    }

    impl AutoDiscoverable for Polite {}

    impl Greeter for Polite {
        fn greet(&self) -> String {
            format!("good day, {}", self.name)
        }
    }

    crate::provides!(Polite => dyn Greeter);

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Polite>()
            .constructor(Vec::new(), |_| {
                Ok(Polite {
                    name: "guest".to_string(),
                })
            })
            .constructor(vec![ContractKey::of::<String>()], |args| {
                Ok(Polite {
                    name: args.get::<String>(0)?,
                })
            })
            .provides::<dyn Greeter>()
            .build()
    }

    #[test]
    fn selects_constructors_by_arity() {
        let descriptor = descriptor();
        assert!(descriptor.is_concrete());
        assert_eq!(descriptor.primary_constructor().unwrap().arity(), 0);
        assert_eq!(descriptor.constructor_with_arity(1).unwrap().arity(), 1);
        assert!(descriptor.constructor_with_arity(2).is_none());
    }

    #[test]
    fn builds_and_views_instances() {
        let descriptor = descriptor();
        let constructor = descriptor.constructor_with_arity(1).unwrap();
        let args = ConstructorArgs::new("Polite", vec![Argument::value("ada".to_string())]);
        let value = constructor.invoke(&args).unwrap();
        let instance = descriptor.seal(value).unwrap();

        let greeter = descriptor
            .view_as(&ContractKey::of::<dyn Greeter>(), &instance)
            .unwrap();
        assert_eq!(
            greeter.downcast::<dyn Greeter>().unwrap().greet(),
            "good day, ada"
        );

        let itself = descriptor
            .view_as(&ContractKey::of::<Polite>(), &instance)
            .unwrap();
        assert_eq!(itself.downcast::<Polite>().unwrap().name, "ada");

        assert!(descriptor
            .view_as(&ContractKey::of::<dyn Farewell>(), &instance)
            .is_none());
    }

    #[test]
    fn capabilities_are_assignable_transitively() {
        let descriptor = descriptor();
        assert!(descriptor.provides(&ContractKey::of::<dyn Greeter>()));
        assert!(!descriptor.provides(&ContractKey::of::<dyn AutoDiscoverable>()));
        assert!(descriptor.is_assignable_to(&ContractKey::of::<dyn AutoDiscoverable>()));
        assert!(!descriptor.is_singleton());
    }
}
