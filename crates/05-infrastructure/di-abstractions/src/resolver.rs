//! 服务定位器抽象接口

use crate::instance::{Argument, ServiceRef};
use infrastructure_common::{ContractKey, DependencyResult};

/// 服务定位器 trait
///
/// 负责定位实现类型、递归解析构造参数并创建实例
pub trait ServiceLocator: Send + Sync {
    /// 解析契约
    ///
    /// `explicit_args` 为空或 `None` 时按第一个构造函数递归解析依赖
    fn resolve_service(
        &self,
        contract: &ContractKey,
        explicit_args: Option<Vec<Argument>>,
    ) -> DependencyResult<ServiceRef>;

    /// 解析契约，契约未注册时返回 `Ok(None)`
    fn resolve_untyped(&self, contract: &ContractKey) -> DependencyResult<Option<ServiceRef>>;

    /// 检查是否可以解析指定契约
    fn can_resolve(&self, contract: &ContractKey) -> bool;
}
