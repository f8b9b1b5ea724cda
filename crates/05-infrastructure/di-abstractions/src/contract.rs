//! 服务契约抽象
//!
//! 契约通常是一个 `dyn Trait` 类型。契约描述符记录契约的种类（接口或具体类型）
//! 以及它所扩展的其他契约，结构化自动发现依赖后者判断传递性的继承关系。

use infrastructure_common::ContractKey;

/// 契约种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// 接口契约（`dyn Trait`）
    Interface,
    /// 具体类型
    Concrete,
}

/// 契约描述符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDescriptor {
    key: ContractKey,
    kind: ContractKind,
    extends: Vec<ContractDescriptor>,
}

impl ContractDescriptor {
    /// 创建接口契约描述符
    pub fn interface<C: ?Sized + 'static>() -> Self {
        Self {
            key: ContractKey::of::<C>(),
            kind: ContractKind::Interface,
            extends: Vec::new(),
        }
    }

    /// 创建具体类型契约描述符
    pub fn concrete<C: ?Sized + 'static>() -> Self {
        Self {
            key: ContractKey::of::<C>(),
            kind: ContractKind::Concrete,
            extends: Vec::new(),
        }
    }

    /// 声明扩展的父契约
    pub fn extending(mut self, parent: ContractDescriptor) -> Self {
        self.extends.push(parent);
        self
    }

    /// 契约键
    pub fn key(&self) -> ContractKey {
        self.key
    }

    /// 契约种类
    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    /// 是否为接口契约
    pub fn is_interface(&self) -> bool {
        self.kind == ContractKind::Interface
    }

    /// 直接扩展的父契约
    pub fn parents(&self) -> &[ContractDescriptor] {
        &self.extends
    }

    /// 是否（传递地）扩展了指定契约，不包括自身
    pub fn extends(&self, other: &ContractKey) -> bool {
        self.extends
            .iter()
            .any(|parent| parent.key == *other || parent.extends(other))
    }

    /// 是否可以赋值给指定契约（自身或传递扩展）
    pub fn is_assignable_to(&self, other: &ContractKey) -> bool {
        self.key == *other || self.extends(other)
    }
}

/// 服务契约 trait
///
/// 一般通过 [`service_contract!`](crate::service_contract) 为 `dyn Trait` 实现
pub trait ServiceContract: 'static {
    /// 获取契约描述符
    fn contract() -> ContractDescriptor;
}

/// 为契约类型实现 [`ServiceContract`]
///
/// ```rust
/// use di_abstractions::{service_contract, AutoDiscoverable, ServiceContract};
///
/// pub trait Clock: Send + Sync {}
/// pub trait Logger: AutoDiscoverable {}
/// pub struct Settings;
///
/// service_contract!(dyn Clock);
/// service_contract!(dyn Logger: dyn AutoDiscoverable);
/// service_contract!(concrete Settings);
///
/// assert!(<dyn Logger as ServiceContract>::contract().is_interface());
/// assert!(!<Settings as ServiceContract>::contract().is_interface());
/// ```
#[macro_export]
macro_rules! service_contract {
    (concrete $contract:ty) => {
        impl $crate::ServiceContract for $contract {
            fn contract() -> $crate::ContractDescriptor {
                $crate::ContractDescriptor::concrete::<$contract>()
            }
        }
    };
    ($contract:ty : $($parent:ty),+ $(,)?) => {
        impl $crate::ServiceContract for $contract {
            fn contract() -> $crate::ContractDescriptor {
                $crate::ContractDescriptor::interface::<$contract>()
                    $(.extending(<$parent as $crate::ServiceContract>::contract()))+
            }
        }
    };
    ($($contract:ty),+ $(,)?) => {
        $(
            impl $crate::ServiceContract for $contract {
                fn contract() -> $crate::ContractDescriptor {
                    $crate::ContractDescriptor::interface::<$contract>()
                }
            }
        )+
    };
}

/// 自动发现标记契约
///
/// 扩展此 trait 的契约会被结构化自动发现识别
pub trait AutoDiscoverable: Send + Sync {}

service_contract!(dyn AutoDiscoverable);

#[cfg(test)]
mod tests {
    use super::*;

    trait Repository: AutoDiscoverable {}
    trait UserRepository: Repository {}
    trait Standalone: Send + Sync {}

    service_contract!(dyn Repository: dyn AutoDiscoverable);
    service_contract!(dyn UserRepository: dyn Repository);
    service_contract!(dyn Standalone);

    #[test]
    fn extends_is_transitive_and_excludes_self() {
        let user = <dyn UserRepository as ServiceContract>::contract();
        let marker = ContractKey::of::<dyn AutoDiscoverable>();

        assert!(user.extends(&marker));
        assert!(user.extends(&ContractKey::of::<dyn Repository>()));
        assert!(!user.extends(&user.key()));
        assert!(user.is_assignable_to(&user.key()));
    }

    #[test]
    fn standalone_contract_has_no_parents() {
        let standalone = <dyn Standalone as ServiceContract>::contract();
        assert!(standalone.is_interface());
        assert!(standalone.parents().is_empty());
        assert!(!standalone.extends(&ContractKey::of::<dyn AutoDiscoverable>()));
    }
}
