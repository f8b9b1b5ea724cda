//! 注册表配置
//!
//! 配置按以下顺序叠加：默认值、可选的配置文件（TOML/JSON/YAML）、
//! `SERVICE_REGISTRY__` 前缀的环境变量

use crate::errors::{ConfigError, ConfigResult};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "SERVICE_REGISTRY";

/// 默认最大解析深度
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 64;

/// 结构化自动发现遇到多个候选契约时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryPolicy {
    /// 总是取声明顺序中的第一个候选契约
    #[default]
    FirstMatch,
    /// 仅当恰好存在一个候选契约时注册，否则跳过该类型
    StrictUnique,
}

impl fmt::Display for DiscoveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstMatch => f.write_str("first-match"),
            Self::StrictUnique => f.write_str("strict-unique"),
        }
    }
}

impl std::str::FromStr for DiscoveryPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-match" | "first_match" => Ok(Self::FirstMatch),
            "strict-unique" | "strict_unique" => Ok(Self::StrictUnique),
            _ => Err(ConfigError::Invalid {
                message: format!("未知的发现策略: {s}"),
            }),
        }
    }
}

/// 注册表配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 结构化自动发现策略
    pub discovery_policy: DiscoveryPolicy,
    /// 构造函数依赖的最大递归深度
    pub max_resolution_depth: usize,
    /// 契约未精确匹配时，是否回退扫描已知实现类型的能力列表
    pub capability_fallback: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            discovery_policy: DiscoveryPolicy::default(),
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            capability_fallback: true,
        }
    }
}

impl RegistryConfig {
    /// 加载配置：可选文件 + 环境变量
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("加载注册表配置文件: {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 从配置文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        Self::load(Some(path.as_ref()))
    }

    /// 仅从环境变量加载
    pub fn from_env() -> ConfigResult<Self> {
        Self::load(None)
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::Invalid {
                message: "max_resolution_depth 必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 设置发现策略
    pub fn with_discovery_policy(mut self, policy: DiscoveryPolicy) -> Self {
        self.discovery_policy = policy;
        self
    }

    /// 设置最大解析深度
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// 设置是否启用能力回退查找
    pub fn with_capability_fallback(mut self, enabled: bool) -> Self {
        self.capability_fallback = enabled;
        self
    }
}
