//! # 服务注册表演示程序
//!
//! 依次演示：带构造后回调的注册、传递性模块发现、模块级可发现服务、
//! 显式构造参数以及以自身类型注册

mod services;

use anyhow::Context;
use clap::Parser;
use di_abstractions::Argument;
use di_impl::ServiceContainer;
use infrastructure_common::{DiscoveryPolicy, RegistryConfig};
use services::{Announcer, Billboard, Numbered, Relay, Standalone};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "demo-app")]
#[command(about = "服务注册表演示程序")]
struct Args {
    /// 配置文件路径（TOML/JSON/YAML）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 结构化发现策略: first-match 或 strict-unique
    #[arg(long)]
    policy: Option<String>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).context("无效的日志级别")?)
        .init();

    let mut config = RegistryConfig::load(args.config.as_deref()).context("加载注册表配置失败")?;
    if let Some(policy) = &args.policy {
        config = config.with_discovery_policy(policy.parse::<DiscoveryPolicy>()?);
    }
    info!("启动服务注册表演示，发现策略: {}", config.discovery_policy);

    let container = ServiceContainer::with_config(config);

    // 构造后回调
    container.register_with_hook::<dyn Announcer, Billboard, _>(|board| {
        board.message = "Hello, init!".to_string();
    })?;
    let announcer = container.get::<dyn Announcer>()?;
    announcer.announce();

    // 传递性结构化发现 + 模块级声明
    let loader = services::module_loader();
    let report = container
        .register_with_auto_discovery_from(services::root_module(), &loader)
        .await?;
    info!("结构化发现: 注册 {} 个", report.registered.len());

    let modules = container
        .discovery()
        .collect_modules(services::root_module(), &loader)
        .await?;
    let report = container.register_discoverable_services(&modules);
    info!("模块声明发现: 注册 {} 个", report.registered.len());

    let numbered = container.get::<dyn Numbered>()?;
    let result = numbered.number();

    // 依赖自动注入与显式构造参数
    let relay = container.get::<dyn Relay>()?;
    info!("自动注入的转发结果: {}", relay.relayed());
    let relay = container.get_with::<dyn Relay>(vec![Argument::service(numbered)])?;
    info!("显式参数的转发结果: {}", relay.relayed());

    // 以自身类型注册
    container.register_type::<Standalone>()?;
    let standalone = container.get::<Standalone>()?;
    info!("自身类型注册: {}", standalone.label);

    println!("{result}");
    println!("{}", serde_json::to_string_pretty(&container.snapshot())?);
    Ok(())
}
