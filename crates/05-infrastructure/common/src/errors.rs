//! 错误类型定义

use thiserror::Error;

/// 依赖解析错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("服务未注册: {contract}")]
    UnregisteredService { contract: String },

    #[error("实现类型无法构造: {implementation}, 原因: {reason}")]
    NotConstructible {
        implementation: String,
        reason: String,
    },

    #[error("构造参数缺失: {implementation}, 位置: {index}")]
    MissingArgument { implementation: String, index: usize },

    #[error("构造参数类型不匹配: {implementation}, 位置: {index}, 期望: {expected}")]
    ArgumentTypeMismatch {
        implementation: String,
        index: usize,
        expected: &'static str,
    },

    #[error("服务创建失败: {implementation}, 原因: {source}")]
    ConstructionFailed {
        implementation: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("实现类型 {implementation} 无法作为 {contract} 提供")]
    ContractMismatch {
        contract: String,
        implementation: String,
    },

    #[error("解析深度超出限制: {contract}, 最大深度: {max_depth}")]
    ResolutionDepthExceeded { contract: String, max_depth: usize },
}

impl DependencyError {
    /// 创建服务未注册错误
    pub fn unregistered(contract: impl Into<String>) -> Self {
        Self::UnregisteredService {
            contract: contract.into(),
        }
    }

    /// 创建服务创建失败错误
    pub fn construction_failed<E>(implementation: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::ConstructionFailed {
            implementation: implementation.into(),
            source: source.into(),
        }
    }

    /// 是否为服务未注册错误
    pub fn is_unregistered(&self) -> bool {
        matches!(self, Self::UnregisteredService { .. })
    }
}

/// 服务注册错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("{contract} 不是接口类型，不能作为服务契约注册")]
    InvalidContract { contract: String },

    #[error("实现类型 {implementation} 未声明契约 {contract}")]
    ContractNotProvided {
        contract: String,
        implementation: String,
    },

    #[error("实现类型 {implementation} 没有可用的构造函数")]
    NotConstructible { implementation: String },
}

/// 服务发现错误类型
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("模块元数据不可访问: {module}, 原因: {message}")]
    MetadataAccess { module: String, message: String },

    #[error("模块加载失败: {module}, 原因: {message}")]
    ModuleLoad { module: String, message: String },

    #[error("发现的服务注册失败: {source}")]
    Registration {
        #[from]
        source: RegistrationError,
    },
}

impl DiscoveryError {
    /// 创建元数据访问错误
    pub fn metadata_access(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MetadataAccess {
            module: module.into(),
            message: message.into(),
        }
    }

    /// 创建模块加载错误
    pub fn module_load(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModuleLoad {
            module: module.into(),
            message: message.into(),
        }
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置加载失败: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("配置验证失败: {message}")]
    Invalid { message: String },
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type RegistrationResult<T> = Result<T, RegistrationError>;
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
