//! 构造后回调

use infrastructure_common::ContractKey;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type HookFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync)) -> bool + Send + Sync>;

/// 构造后回调
///
/// 每次构造（而非每次缓存命中）执行一次，在实例被共享、缓存或返回之前，
/// 以可变引用访问新建的实现实例
#[derive(Clone)]
pub struct PostConstruct {
    target: ContractKey,
    action: HookFn,
}

impl PostConstruct {
    /// 创建针对实现类型 `I` 的回调
    pub fn new<I, F>(action: F) -> Self
    where
        I: Send + Sync + 'static,
        F: Fn(&mut I) + Send + Sync + 'static,
    {
        Self {
            target: ContractKey::of::<I>(),
            action: Arc::new(move |instance: &mut (dyn Any + Send + Sync)| {
                match instance.downcast_mut::<I>() {
                    Some(instance) => {
                        action(instance);
                        true
                    }
                    None => false,
                }
            }),
        }
    }

    /// 回调所针对的实现类型
    pub fn target(&self) -> ContractKey {
        self.target
    }

    /// 执行回调，实例类型与目标类型不一致时返回 `false`
    pub fn apply(&self, instance: &mut (dyn Any + Send + Sync)) -> bool {
        (self.action)(instance)
    }
}

impl fmt::Debug for PostConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostConstruct")
            .field("target", &self.target)
            .field("action", &"<function>")
            .finish()
    }
}
