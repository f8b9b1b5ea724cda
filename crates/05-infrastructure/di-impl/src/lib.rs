//! # 服务注册表实现
//!
//! 提供注册表、解析器、模块发现以及组合三者的服务容器。
//!
//! - [`ServiceRegistry`] - 契约映射、单例缓存与构造后回调
//! - [`Resolver`] - 构造函数选择与依赖的递归解析
//! - [`ServiceDiscovery`] - 从模块元数据注册服务
//! - [`StaticModule`] / [`StaticModuleLoader`] - 代码中声明的模块元数据
//! - [`ServiceContainer`] - 组合入口与进程级全局容器

pub mod container;
pub mod discovery;
pub mod module;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use discovery::*;
pub use module::*;
pub use registry::*;
pub use resolver::*;
