//! 服务发现
//!
//! 把模块元数据转换为注册表中的注册。支持三种来源：
//! 模块级可发现服务声明、接口模块与实现模块的交叉扫描、
//! 基于标记契约的结构化自动发现。

use di_abstractions::{
    AutoDiscoverable, ContractDescriptor, ModuleLoader, ServiceModule, ServiceStore,
    TypeDescriptor,
};
use infrastructure_common::{ContractKey, DiscoveryError, DiscoveryPolicy, DiscoveryResult};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 扫描得到的服务
#[derive(Debug, Clone)]
pub struct ScannedService {
    /// 来源模块
    pub module: String,
    /// 契约
    pub contract: ContractDescriptor,
    /// 实现类型
    pub implementation: Arc<TypeDescriptor>,
}

/// 结构化发现中被跳过的类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedType {
    /// 来源模块
    pub module: String,
    /// 实现类型名称
    pub implementation: String,
    /// 候选契约，为空表示没有扩展标记的契约
    pub candidates: Vec<String>,
}

/// 模块元数据访问失败
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleFailure {
    /// 出错的模块
    pub module: String,
    /// 错误信息
    pub message: String,
}

impl ModuleFailure {
    fn new(module: &str, error: &DiscoveryError) -> Self {
        Self {
            module: module.to_string(),
            message: error.to_string(),
        }
    }
}

/// 扫描结果
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// 扫描得到的服务
    pub services: Vec<ScannedService>,
    /// 被跳过的类型
    pub skipped: Vec<SkippedType>,
    /// 元数据访问失败的模块
    pub failures: Vec<ModuleFailure>,
}

impl ScanOutcome {
    fn merge(&mut self, other: ScanOutcome) {
        self.services.extend(other.services);
        self.skipped.extend(other.skipped);
        self.failures.extend(other.failures);
    }
}

/// 发现得到的注册条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredEntry {
    /// 来源模块
    pub module: String,
    /// 契约名称
    pub contract: String,
    /// 实现类型名称
    pub implementation: String,
}

impl DiscoveredEntry {
    fn from_scanned(service: &ScannedService) -> Self {
        Self {
            module: service.module.clone(),
            contract: service.contract.key().short_name().to_string(),
            implementation: service.implementation.name().to_string(),
        }
    }
}

/// 发现报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// 已写入注册表的条目
    pub registered: Vec<DiscoveredEntry>,
    /// 因契约已被显式注册而未写入的条目
    pub superseded: Vec<DiscoveredEntry>,
    /// 被跳过的类型
    pub skipped: Vec<SkippedType>,
    /// 失败的模块或条目
    pub failures: Vec<ModuleFailure>,
}

impl DiscoveryReport {
    /// 是否没有任何失败
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// 合并另一份报告
    pub fn merge(&mut self, other: DiscoveryReport) {
        self.registered.extend(other.registered);
        self.superseded.extend(other.superseded);
        self.skipped.extend(other.skipped);
        self.failures.extend(other.failures);
    }
}

/// 服务发现器
#[derive(Clone)]
pub struct ServiceDiscovery {
    store: Arc<dyn ServiceStore>,
    policy: DiscoveryPolicy,
    marker: ContractKey,
}

impl ServiceDiscovery {
    /// 创建新的发现器，策略取自注册表配置，标记契约为 [`AutoDiscoverable`]
    pub fn new(store: Arc<dyn ServiceStore>) -> Self {
        let policy = store.config().discovery_policy;
        Self {
            store,
            policy,
            marker: ContractKey::of::<dyn AutoDiscoverable>(),
        }
    }

    /// 设置发现策略
    pub fn with_policy(mut self, policy: DiscoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 设置标记契约
    pub fn with_marker<C: ?Sized + 'static>(mut self) -> Self {
        self.marker = ContractKey::of::<C>();
        self
    }

    /// 当前发现策略
    pub fn policy(&self) -> DiscoveryPolicy {
        self.policy
    }

    /// 收集模块级可发现服务声明
    pub fn scan_markers(&self, modules: &[Arc<dyn ServiceModule>]) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        for module in modules {
            match module.discoverable_services() {
                Ok(services) => {
                    debug!("模块 {} 声明了 {} 个可发现服务", module.name(), services.len());
                    outcome
                        .services
                        .extend(services.into_iter().map(|service| ScannedService {
                            module: module.name().to_string(),
                            contract: service.contract,
                            implementation: service.implementation,
                        }));
                }
                Err(e) => {
                    warn!("读取模块 {} 的可发现服务失败: {}", module.name(), e);
                    outcome.failures.push(ModuleFailure::new(module.name(), &e));
                }
            }
        }
        outcome
    }

    /// 结构化扫描：导出的具体类型中可赋值给标记契约的类型
    pub fn scan_structural(&self, modules: &[Arc<dyn ServiceModule>]) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        for module in modules {
            match module.types() {
                Ok(types) => {
                    for implementation in types {
                        self.classify(module.name(), implementation, &mut outcome);
                    }
                }
                Err(e) => {
                    warn!("读取模块 {} 的导出类型失败: {}", module.name(), e);
                    outcome.failures.push(ModuleFailure::new(module.name(), &e));
                }
            }
        }
        outcome
    }

    fn classify(
        &self,
        module: &str,
        implementation: Arc<TypeDescriptor>,
        outcome: &mut ScanOutcome,
    ) {
        if !implementation.is_concrete() || !implementation.is_assignable_to(&self.marker) {
            return;
        }

        let candidates: Vec<&ContractDescriptor> = implementation
            .capabilities()
            .iter()
            .map(|capability| capability.contract())
            .filter(|contract| contract.key() != self.marker && contract.extends(&self.marker))
            .collect();

        let chosen = match (self.policy, candidates.as_slice()) {
            (_, []) => None,
            (DiscoveryPolicy::FirstMatch, [first, ..]) => Some((*first).clone()),
            (DiscoveryPolicy::StrictUnique, [only]) => Some((*only).clone()),
            (DiscoveryPolicy::StrictUnique, _) => None,
        };

        match chosen {
            Some(contract) => outcome.services.push(ScannedService {
                module: module.to_string(),
                contract,
                implementation,
            }),
            None => {
                let names: Vec<String> = candidates
                    .iter()
                    .map(|contract| contract.key().short_name().to_string())
                    .collect();
                if names.is_empty() {
                    debug!("{} 没有扩展标记契约的契约，跳过", implementation.name());
                } else {
                    warn!(
                        "{} 有多个候选契约 [{}]，按 {} 策略跳过",
                        implementation.name(),
                        names.join(", "),
                        self.policy
                    );
                }
                outcome.skipped.push(SkippedType {
                    module: module.to_string(),
                    implementation: implementation.name().to_string(),
                    candidates: names,
                });
            }
        }
    }

    /// 扫描所有模块的声明，并对开启自动发现的模块做结构化扫描
    pub fn scan(&self, modules: &[Arc<dyn ServiceModule>]) -> ScanOutcome {
        let mut outcome = self.scan_markers(modules);
        let opted_in: Vec<Arc<dyn ServiceModule>> = modules
            .iter()
            .filter(|module| module.auto_discovery())
            .cloned()
            .collect();
        outcome.merge(self.scan_structural(&opted_in));
        outcome
    }

    /// 交叉扫描：为接口模块导出的每个接口，注册实现模块中第一个提供它的具体类型
    pub fn register_from_modules(
        &self,
        interfaces: &dyn ServiceModule,
        implementations: &dyn ServiceModule,
    ) -> DiscoveryResult<DiscoveryReport> {
        let contracts = interfaces.interfaces()?;
        let types = implementations.types()?;

        let mut outcome = ScanOutcome::default();
        for contract in contracts {
            let key = contract.key();
            match types
                .iter()
                .find(|implementation| implementation.is_concrete() && implementation.provides(&key))
            {
                Some(implementation) => outcome.services.push(ScannedService {
                    module: implementations.name().to_string(),
                    contract,
                    implementation: implementation.clone(),
                }),
                None => debug!(
                    "模块 {} 中没有 {} 的实现",
                    implementations.name(),
                    key.short_name()
                ),
            }
        }

        Ok(self.register_outcome(outcome))
    }

    /// 结构化自动发现并注册
    pub fn register_by_auto_discovery(
        &self,
        modules: &[Arc<dyn ServiceModule>],
    ) -> DiscoveryReport {
        self.register_outcome(self.scan_structural(modules))
    }

    /// 注册模块级可发现服务声明
    pub fn register_discoverable_services(
        &self,
        modules: &[Arc<dyn ServiceModule>],
    ) -> DiscoveryReport {
        self.register_outcome(self.scan_markers(modules))
    }

    /// 注册 [`ServiceDiscovery::scan`] 的结果
    pub fn register_scanned(&self, modules: &[Arc<dyn ServiceModule>]) -> DiscoveryReport {
        self.register_outcome(self.scan(modules))
    }

    /// 收集根模块及其直接引用的模块
    pub async fn collect_modules(
        &self,
        root: Arc<dyn ServiceModule>,
        loader: &dyn ModuleLoader,
    ) -> DiscoveryResult<Vec<Arc<dyn ServiceModule>>> {
        let references = root.references()?;

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(root.name().to_string());
        let mut modules = vec![root];

        for reference in references {
            if !seen.insert(reference.name().to_string()) {
                continue;
            }
            let module = loader.load(&reference).await?;
            modules.push(module);
        }

        debug!("收集到 {} 个模块", modules.len());
        Ok(modules)
    }

    /// 从根模块及其引用模块做结构化自动发现
    pub async fn register_with_auto_discovery_from(
        &self,
        root: Arc<dyn ServiceModule>,
        loader: &dyn ModuleLoader,
    ) -> DiscoveryResult<DiscoveryReport> {
        let modules = self.collect_modules(root, loader).await?;
        Ok(self.register_by_auto_discovery(&modules))
    }

    fn register_outcome(&self, outcome: ScanOutcome) -> DiscoveryReport {
        let mut report = DiscoveryReport {
            skipped: outcome.skipped,
            failures: outcome.failures,
            ..DiscoveryReport::default()
        };

        for service in outcome.services {
            let entry = DiscoveredEntry::from_scanned(&service);
            match self
                .store
                .register_discoverable(service.contract, service.implementation)
            {
                Ok(true) => report.registered.push(entry),
                Ok(false) => report.superseded.push(entry),
                Err(e) => {
                    warn!("注册发现的服务 {} -> {} 失败: {}", entry.contract, entry.implementation, e);
                    let error = DiscoveryError::from(e);
                    report.failures.push(ModuleFailure::new(&entry.module, &error));
                }
            }
        }

        info!(
            "服务发现完成: 注册 {} 个, 被显式注册覆盖 {} 个, 跳过 {} 个, 失败 {} 个",
            report.registered.len(),
            report.superseded.len(),
            report.skipped.len(),
            report.failures.len()
        );
        report
    }
}

impl std::fmt::Debug for ServiceDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDiscovery")
            .field("policy", &self.policy)
            .field("marker", &self.marker)
            .finish()
    }
}
