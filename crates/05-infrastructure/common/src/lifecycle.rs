//! 服务生命周期

use serde::{Deserialize, Serialize};
use std::fmt;

/// 服务生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lifetime {
    /// 瞬时模式 - 每次解析都创建新实例
    #[default]
    Transient,
    /// 单例模式 - 首次构造的实例被缓存并在进程内复用
    Singleton,
}

impl Lifetime {
    /// 是否为单例
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Singleton => f.write_str("singleton"),
        }
    }
}

/// 注册来源
///
/// 显式注册优先于通过发现得到的注册
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationOrigin {
    /// 调用方显式注册
    Explicit,
    /// 由模块扫描发现
    Discovered,
}

impl RegistrationOrigin {
    /// 当前来源是否可以被 `incoming` 覆盖
    pub fn yields_to(self, incoming: Self) -> bool {
        !(self == Self::Explicit && incoming == Self::Discovered)
    }
}
