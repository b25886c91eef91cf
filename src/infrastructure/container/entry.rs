//! 注册项与调用目标

use std::collections::BTreeMap;

use crate::types::{Instance, Value};

/// 参数名 -> 用户给定的原始值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionConfig {
    values: BTreeMap<String, Value>,
}

impl ResolutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ResolutionConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = ResolutionConfig::new();
        for (name, value) in iter {
            config.insert(name, value);
        }
        config
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for ResolutionConfig {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}

/// 构造完成后对新对象执行的一次方法调用
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: ResolutionConfig,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: ResolutionConfig) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// 一个注册项的完整配置：构造参数 + 构造后调用
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryConfig {
    pub constructor: ResolutionConfig,
    pub calls: Vec<MethodCall>,
}

impl EntryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constructor(mut self, config: ResolutionConfig) -> Self {
        self.constructor = config;
        self
    }

    pub fn call(mut self, method: impl Into<String>, arguments: ResolutionConfig) -> Self {
        self.calls.push(MethodCall::new(method, arguments));
        self
    }
}

impl From<ResolutionConfig> for EntryConfig {
    fn from(constructor: ResolutionConfig) -> Self {
        Self {
            constructor,
            calls: Vec::new(),
        }
    }
}

/// 尚未实例化的注册项，只会被消费一次
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    id: String,
    config: EntryConfig,
}

impl Entry {
    pub fn new(id: impl Into<String>, config: impl Into<EntryConfig>) -> Self {
        Self {
            id: id.into(),
            config: config.into(),
        }
    }

    /// 标识符，同时也是要构造的类
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &EntryConfig {
        &self.config
    }
}

/// `with_entries` 接受的定义：待解析配置或已构造好的实例
#[derive(Debug, Clone)]
pub enum Definition {
    Pending(EntryConfig),
    Instance(Instance),
}

impl From<ResolutionConfig> for Definition {
    fn from(config: ResolutionConfig) -> Self {
        Definition::Pending(config.into())
    }
}

impl From<EntryConfig> for Definition {
    fn from(config: EntryConfig) -> Self {
        Definition::Pending(config)
    }
}

impl From<Entry> for Definition {
    fn from(entry: Entry) -> Self {
        Definition::Pending(entry.config)
    }
}

impl From<Instance> for Definition {
    fn from(instance: Instance) -> Self {
        Definition::Instance(instance)
    }
}

/// `invoke` 的调用目标
#[derive(Debug, Clone)]
pub enum CallTarget {
    /// 目录中注册的自由函数
    Function(String),
    /// 先通过容器解析 `class`，再调用其方法
    Method { class: String, method: String },
    /// 在已有对象上调用方法
    BoundMethod { object: Instance, method: String },
}

impl CallTarget {
    pub fn function(name: impl Into<String>) -> Self {
        CallTarget::Function(name.into())
    }

    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        CallTarget::Method {
            class: class.into(),
            method: method.into(),
        }
    }

    pub fn bound(object: Instance, method: impl Into<String>) -> Self {
        CallTarget::BoundMethod {
            object,
            method: method.into(),
        }
    }
}

/// `"Class::method"` 解析为方法目标，其余视为函数名
impl From<&str> for CallTarget {
    fn from(target: &str) -> Self {
        match target.split_once("::") {
            Some((class, method)) if !class.is_empty() && !method.is_empty() => {
                CallTarget::method(class, method)
            }
            _ => CallTarget::function(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_target_from_str() {
        assert!(matches!(
            CallTarget::from("Mailer::send"),
            CallTarget::Method { ref class, ref method } if class == "Mailer" && method == "send"
        ));
        assert!(matches!(
            CallTarget::from("strlen"),
            CallTarget::Function(ref name) if name == "strlen"
        ));
        assert!(matches!(CallTarget::from("::x"), CallTarget::Function(_)));
    }

    #[test]
    fn test_resolution_config_from_json() {
        let serde_json::Value::Object(map) = serde_json::json!({"x": 5, "name": "a"}) else {
            panic!("expected object");
        };
        let config = ResolutionConfig::from(map);

        assert_eq!(config.get("x"), Some(&Value::Int(5)));
        assert_eq!(config.names().collect::<Vec<_>>(), vec!["name", "x"]);
    }

    #[test]
    fn test_entry_config_builder() {
        let config = EntryConfig::new()
            .constructor(ResolutionConfig::new().with("power", 120))
            .call("setName", ResolutionConfig::new().with("name", "v8"));

        assert_eq!(config.calls.len(), 1);
        assert_eq!(config.calls[0].method, "setName");
        assert!(matches!(Definition::from(config), Definition::Pending(_)));
    }
}
