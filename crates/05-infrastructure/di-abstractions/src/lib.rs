//! # Service Registry Abstractions
//!
//! 服务注册表抽象层，定义契约描述、实现类型描述以及注册、解析和发现的接口。
//!
//! ## 核心接口
//!
//! - [`ServiceStore`] - 服务注册表接口
//! - [`ServiceLocator`] - 服务定位器接口
//! - [`ServiceModule`] / [`ModuleLoader`] - 模块元数据与模块加载接口
//!
//! ## 描述模型
//!
//! - [`ContractDescriptor`] / [`ServiceContract`] - 契约及其扩展关系
//! - [`TypeDescriptor`] / [`Injectable`] - 实现类型的构造函数与能力
//! - [`PostConstruct`] - 构造后回调
//! - [`ServiceRef`] / [`Argument`] - 解析结果与显式构造参数

pub mod contract;
pub mod descriptor;
pub mod hook;
pub mod instance;
pub mod module;
pub mod registry;
pub mod resolver;

pub use contract::*;
pub use descriptor::*;
pub use hook::*;
pub use instance::*;
pub use module::*;
pub use registry::*;
pub use resolver::*;
