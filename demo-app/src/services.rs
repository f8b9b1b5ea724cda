//! 演示用的契约、实现与模块

use di_abstractions::{
    provides, service_contract, AutoDiscoverable, Injectable, ServiceModule, TypeDescriptor,
};
use di_impl::{StaticModule, StaticModuleLoader};
use infrastructure_common::ContractKey;
use std::sync::Arc;
use tracing::info;

/// 带初始化消息的服务
pub trait Announcer: Send + Sync {
    fn announce(&self) -> String;
}

/// 返回编号的服务
pub trait Numbered: AutoDiscoverable {
    fn number(&self) -> i32;
}

/// 包装另一个编号服务
pub trait Relay: Send + Sync {
    fn relayed(&self) -> i32;
}

service_contract!(dyn Announcer, dyn Relay);
service_contract!(dyn Numbered: dyn AutoDiscoverable);

#[derive(Debug, Default)]
pub struct Billboard {
    pub message: String,
}

impl Announcer for Billboard {
    fn announce(&self) -> String {
        info!("公告: {}", self.message);
        self.message.clone()
    }
}

provides!(Billboard => dyn Announcer);

impl Injectable for Billboard {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Billboard>()
            .default_constructor()
            .provides::<dyn Announcer>()
            .build()
    }
}

#[derive(Debug, Default)]
pub struct First;

impl AutoDiscoverable for First {}

impl Numbered for First {
    fn number(&self) -> i32 {
        1
    }
}

provides!(First => dyn Numbered);

impl Injectable for First {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<First>()
            .default_constructor()
            .provides::<dyn Numbered>()
            .build()
    }
}

#[derive(Debug, Default)]
pub struct Second;

impl AutoDiscoverable for Second {}

impl Numbered for Second {
    fn number(&self) -> i32 {
        2
    }
}

provides!(Second => dyn Numbered);

impl Injectable for Second {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Second>()
            .default_constructor()
            .provides::<dyn Numbered>()
            .build()
    }
}

pub struct Forwarder {
    source: Arc<dyn Numbered>,
}

impl Relay for Forwarder {
    fn relayed(&self) -> i32 {
        self.source.number()
    }
}

provides!(Forwarder => dyn Relay);

impl Injectable for Forwarder {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Forwarder>()
            .constructor(vec![ContractKey::of::<dyn Numbered>()], |args| {
                Ok(Forwarder {
                    source: args.service::<dyn Numbered>(0)?,
                })
            })
            .provides::<dyn Relay>()
            .build()
    }
}

/// 以自身类型注册的服务
#[derive(Debug, Default)]
pub struct Standalone {
    pub label: &'static str,
}

impl Injectable for Standalone {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Standalone>()
            .constructor(Vec::new(), |_| Ok(Standalone { label: "standalone" }))
            .singleton()
            .build()
    }
}

/// 应用根模块，引用实现模块
pub fn root_module() -> Arc<dyn ServiceModule> {
    StaticModule::builder("harness")
        .references(["implementations"])
        .shared()
}

/// 实现模块：导出参与结构化发现的类型，并声明可发现服务
pub fn implementations_module() -> Arc<dyn ServiceModule> {
    StaticModule::builder("implementations")
        .export::<Second>()
        .export::<First>()
        .discoverable_service::<dyn Relay, Forwarder>()
        .auto_discovery(true)
        .shared()
}

/// 按名称提供演示模块的加载器
pub fn module_loader() -> StaticModuleLoader {
    StaticModuleLoader::new().with_module(implementations_module())
}
