//! # Infrastructure Common
//!
//! 服务注册表各层共享的基础类型。
//!
//! ## 核心内容
//!
//! - [`ContractKey`] - 服务契约与实现类型的身份标识
//! - [`Lifetime`] / [`RegistrationOrigin`] - 生命周期与注册来源
//! - [`RegistryConfig`] / [`DiscoveryPolicy`] - 注册表配置
//! - [`DependencyError`] / [`RegistrationError`] / [`DiscoveryError`] / [`ConfigError`] - 错误类型

pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
