//! 自动装配容器
//!
//! 每个标识符对应一个槽位，状态机为 `未注册 -> Pending(配置) -> Resolved(实例)`。
//! 首次 `get` 触发解析并把槽位替换为单例，之后直接返回缓存，不再调用构造函数。
//!
//! 容器本身是廉价可克隆的句柄。一次顶层 `get` / `invoke` 在整个过程中持有可重入锁：
//! 同一线程上的递归解析可以重入，其他线程则排队等待，槽位不会被并发地部分修改。

mod entry;

pub use entry::{CallTarget, Definition, Entry, EntryConfig, MethodCall, ResolutionConfig};

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;
use tracing::{debug, warn};

use crate::config::ContainerLoader;
use crate::errors::{ContainerError, Result};
use crate::infrastructure::catalog::{ClassCatalog, FunctionDescriptor};
use crate::infrastructure::invoker::Invoker;
use crate::logging::OperationTimer;
use crate::types::{Instance, Object, Value};

/// 槽位状态
#[derive(Clone)]
enum Slot {
    Pending(Entry),
    Resolved(Instance),
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 总解析次数（含递归）
    pub total_resolutions: u64,
    /// 单例缓存命中次数
    pub cache_hits: u64,
    /// 需要实际构造的次数
    pub cache_misses: u64,
    /// 通过类型自动装配的依赖数
    pub autowired: u64,
    /// 循环依赖检测次数
    pub circular_dependency_checks: u64,
}

impl ContainerStats {
    /// 缓存命中率（小数形式）
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn performance_summary(&self) -> String {
        format!(
            "Container: {} total resolutions, {:.1}% cache hit rate, {} autowired",
            self.total_resolutions,
            self.hit_rate() * 100.0,
            self.autowired
        )
    }
}

#[derive(Default)]
struct State {
    slots: HashMap<String, Slot>,
    interfaces: HashMap<String, String>,
    autowire: bool,
    /// 正在解析的标识符栈，用于循环依赖检测
    resolving: Vec<String>,
    stats: ContainerStats,
}

struct Inner {
    catalog: Arc<ClassCatalog>,
    state: ReentrantMutex<RefCell<State>>,
    /// 注入用的自身实例，创建时构造一次；内部只持有弱引用
    self_instance: Instance,
}

/// 注入给对象的容器句柄
///
/// 只持有弱引用，被缓存的单例保存它不会让容器无法释放。
#[derive(Clone)]
pub struct ContainerHandle {
    inner: Weak<Inner>,
}

impl ContainerHandle {
    /// 容器仍然存活时返回它
    pub fn container(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }

    /// 通过句柄解析标识符
    pub fn get(&self, id: &str) -> Result<Instance> {
        self.container()
            .ok_or_else(|| ContainerError::configuration("Container has already been dropped"))?
            .get(id)
    }
}

impl fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// 正在解析的标识符标记，离开作用域时出栈（包括 panic 展开）
struct ResolvingMarker<'c> {
    container: &'c Container,
}

impl Drop for ResolvingMarker<'_> {
    fn drop(&mut self) {
        self.container.inner.state.lock().borrow_mut().resolving.pop();
    }
}

/// 依赖注入容器
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

impl Container {
    /// 容器自身的类型标识符；参数声明此类型时注入容器句柄
    pub const SELF_ID: &'static str = "Container";

    /// 创建容器，默认启用自动装配
    pub fn new(catalog: impl Into<Arc<ClassCatalog>>) -> Self {
        Self {
            inner: Arc::new_cyclic(|weak| Inner {
                catalog: catalog.into(),
                state: ReentrantMutex::new(RefCell::new(State {
                    autowire: true,
                    ..State::default()
                })),
                self_instance: Arc::new(Object::new(
                    Self::SELF_ID,
                    ContainerHandle {
                        inner: weak.clone(),
                    },
                )),
            }),
        }
    }

    pub fn with_autowiring(self, enabled: bool) -> Self {
        self.inner.state.lock().borrow_mut().autowire = enabled;
        self
    }

    /// 整体替换注册表，仅用于配置阶段
    pub fn with_entries<I, K, D>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<Definition>,
    {
        let slots = entries
            .into_iter()
            .map(|(id, definition)| {
                let id = id.into();
                let slot = match definition.into() {
                    Definition::Pending(config) => Slot::Pending(Entry::new(id.clone(), config)),
                    Definition::Instance(instance) => Slot::Resolved(instance),
                };
                (id, slot)
            })
            .collect();

        self.inner.state.lock().borrow_mut().slots = slots;
        self
    }

    /// 整体替换接口 -> 实现类绑定表
    pub fn with_interfaces<I, K, V>(self, bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let interfaces = bindings
            .into_iter()
            .map(|(interface, class)| (interface.into(), class.into()))
            .collect();

        self.inner.state.lock().borrow_mut().interfaces = interfaces;
        self
    }

    /// 从加载器读取注册项、接口绑定与自动装配开关
    pub fn configure(self, loader: &dyn ContainerLoader) -> Result<Self> {
        let timer = OperationTimer::new("container.configure");

        let entries = loader.load_entries()?;
        let interfaces = loader.load_interfaces()?;
        let entry_count = entries.len();

        let mut container = self.with_entries(entries).with_interfaces(interfaces);
        if let Some(enabled) = loader.autowire() {
            container = container.with_autowiring(enabled);
        }

        timer.with_metadata("entries", &entry_count.to_string()).finish();
        Ok(container)
    }

    /// 注册待解析项；已解析的单例不可覆盖
    pub fn register(&self, id: impl Into<String>, config: impl Into<EntryConfig>) -> Result<()> {
        let id = id.into();
        let entry = Entry::new(id.clone(), config);
        self.insert_slot(id, Slot::Pending(entry))
    }

    /// 注册已构造好的实例
    pub fn register_instance(&self, id: impl Into<String>, instance: Instance) -> Result<()> {
        self.insert_slot(id.into(), Slot::Resolved(instance))
    }

    fn insert_slot(&self, id: String, slot: Slot) -> Result<()> {
        let guard = self.inner.state.lock();
        let mut state = guard.borrow_mut();

        if let Some(Slot::Resolved(_)) = state.slots.get(&id) {
            warn!(id = %id, "rejected re-registration of resolved entry");
            return Err(ContainerError::configuration(format!(
                "Entry '{id}' is already resolved and cannot be re-registered"
            )));
        }

        state.slots.insert(id, slot);
        Ok(())
    }

    /// 是否存在该标识符的槽位（待解析或已解析）
    pub fn has(&self, id: &str) -> bool {
        self.inner.state.lock().borrow().slots.contains_key(id)
    }

    /// 解析标识符并返回单例
    pub fn get(&self, id: &str) -> Result<Instance> {
        let guard = self.inner.state.lock();

        let pending = {
            let mut state_ref = guard.borrow_mut();
            let state = &mut *state_ref;
            state.stats.total_resolutions += 1;
            match state.slots.get(id) {
                Some(Slot::Resolved(instance)) => {
                    state.stats.cache_hits += 1;
                    return Ok(instance.clone());
                }
                Some(Slot::Pending(entry)) => Some(entry.clone()),
                None => None,
            }
        };

        if pending.is_none() && id == Self::SELF_ID {
            return Ok(self.self_instance());
        }

        let marker = self.enter(id)?;
        let result = match pending {
            Some(entry) => Invoker::new(self).materialize(&entry),
            None => self.resolve_unregistered(id),
        };
        drop(marker);
        let instance = result?;

        guard
            .borrow_mut()
            .slots
            .insert(id.to_string(), Slot::Resolved(instance.clone()));
        debug!(id, class = instance.class(), "entry resolved");
        Ok(instance)
    }

    /// 压入解析栈；已在栈中则报告循环
    fn enter(&self, id: &str) -> Result<ResolvingMarker<'_>> {
        let guard = self.inner.state.lock();
        let mut state = guard.borrow_mut();
        state.stats.circular_dependency_checks += 1;

        if let Some(position) = state.resolving.iter().position(|r| r == id) {
            let mut chain = state.resolving[position..].to_vec();
            chain.push(id.to_string());
            debug!(chain = ?chain, "circular dependency detected");
            return Err(ContainerError::CircularDependency { chain });
        }

        state.resolving.push(id.to_string());
        state.stats.cache_misses += 1;
        Ok(ResolvingMarker { container: self })
    }

    /// 未注册标识符：可构造的类按空配置即时合成，已绑定的接口转到实现类
    fn resolve_unregistered(&self, id: &str) -> Result<Instance> {
        let (autowire, bound) = {
            let guard = self.inner.state.lock();
            let state = guard.borrow();
            (state.autowire, state.interfaces.get(id).cloned())
        };

        if autowire {
            if self.catalog().is_constructible(id) {
                debug!(id, "synthesizing entry for unregistered class");
                return Invoker::new(self).materialize(&Entry::new(id, EntryConfig::default()));
            }
            if let Some(concrete) = bound {
                if !self.catalog().is_assignable(&concrete, id) {
                    return Err(ContainerError::configuration(format!(
                        "Class {concrete} bound to {id} is not assignable to it"
                    )));
                }
                debug!(interface = id, class = %concrete, "following interface binding");
                return self.get(&concrete);
            }
        }

        Err(ContainerError::NotFound {
            id: id.to_string(),
            available: self.entries(),
        })
    }

    /// 自动装配路径上的 `get`，额外计数
    pub(crate) fn autowire(&self, id: &str) -> Result<Instance> {
        self.inner.state.lock().borrow_mut().stats.autowired += 1;
        self.get(id)
    }

    /// 解析调用目标及其参数并执行一次；结果不缓存
    pub fn invoke(&self, target: impl Into<CallTarget>, params: &ResolutionConfig) -> Result<Value> {
        let _guard = self.inner.state.lock();

        match target.into() {
            CallTarget::Function(name) => {
                let function = self.catalog().function(&name).ok_or_else(|| {
                    ContainerError::NotFound {
                        id: name.clone(),
                        available: Vec::new(),
                    }
                })?;
                Invoker::new(self).invoke_free_function(&function, params)
            }
            CallTarget::Method { class, method } => {
                let object = self.get(&class)?;
                self.invoke_bound(&object, &method, params)
            }
            CallTarget::BoundMethod { object, method } => {
                self.invoke_bound(&object, &method, params)
            }
        }
    }

    /// 调用一个匿名可调用对象（例如作为参数传入的 `Value::Callable`）
    pub fn call(&self, function: &FunctionDescriptor, params: &ResolutionConfig) -> Result<Value> {
        let _guard = self.inner.state.lock();
        Invoker::new(self).invoke_free_function(function, params)
    }

    fn invoke_bound(&self, object: &Instance, method: &str, params: &ResolutionConfig) -> Result<Value> {
        let descriptor = self
            .catalog()
            .find_method(object.class(), method)
            .ok_or_else(|| {
                ContainerError::configuration(format!(
                    "Method {}::{} doesn't exist!",
                    object.class(),
                    method
                ))
            })?;
        Invoker::new(self).invoke_method(object, descriptor, params, None)
    }

    pub fn catalog(&self) -> &ClassCatalog {
        &self.inner.catalog
    }

    pub fn autowiring_enabled(&self) -> bool {
        self.inner.state.lock().borrow().autowire
    }

    /// 接口绑定的实现类
    pub fn binding(&self, interface: &str) -> Option<String> {
        self.inner.state.lock().borrow().interfaces.get(interface).cloned()
    }

    /// 已注册的标识符（排序后）
    pub fn entries(&self) -> Vec<String> {
        let guard = self.inner.state.lock();
        let mut ids: Vec<String> = guard.borrow().slots.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn stats(&self) -> ContainerStats {
        self.inner.state.lock().borrow().stats.clone()
    }

    /// 字符串配置值是否按类引用处理
    pub(crate) fn is_reference(&self, value: &str) -> bool {
        self.has(value) || self.catalog().is_known(value)
    }

    /// 注入用的容器实例
    pub(crate) fn self_instance(&self) -> Instance {
        self.inner.self_instance.clone()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(ClassCatalog::new())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("entries", &self.entries())
            .field("autowire", &self.autowiring_enabled())
            .finish_non_exhaustive()
    }
}
