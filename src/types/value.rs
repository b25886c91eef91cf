//! 运行时值模型
//!
//! 配置中的字面量、已经构造好的对象实例以及可调用对象都统一表示为 [`Value`]。

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::errors::BoxError;
use crate::infrastructure::catalog::FunctionDescriptor;

/// 容器托管的对象：类标识符 + 类型擦除后的 Rust 值
pub struct Object {
    class: String,
    data: Box<dyn Any + Send + Sync>,
}

/// 共享的对象实例，单例缓存中存放的就是它
pub type Instance = Arc<Object>;

/// 可作为参数传递的函数
pub type Callable = Arc<FunctionDescriptor>;

impl Object {
    pub fn new<T: Any + Send + Sync>(class: impl Into<String>, data: T) -> Self {
        Self::from_boxed(class, Box::new(data))
    }

    pub(crate) fn from_boxed(class: impl Into<String>, data: Box<dyn Any + Send + Sync>) -> Self {
        Self {
            class: class.into(),
            data,
        }
    }

    /// 对象的运行时类标识符
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.data.is::<T>()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("class", &self.class).finish()
    }
}

/// 参数值
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Callable(Callable),
    Object(Instance),
}

impl Value {
    /// 用于错误信息的类型名；对象返回其类标识符
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Array(_) | Value::Map(_) => "array".to_string(),
            Value::Callable(_) => "callable".to_string(),
            Value::Object(object) => object.class().to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// 数值或数值字符串，整数保持为 `Int`
    pub(crate) fn to_number(&self) -> Option<Value> {
        match self {
            Value::Int(_) | Value::Float(_) => Some(self.clone()),
            Value::String(s) => parse_numeric(s),
            _ => None,
        }
    }
}

/// 与脚本语言的 `is_numeric` 一致：允许首尾空白、符号、小数点与指数
fn parse_numeric(raw: &str) -> Option<Value> {
    let s = raw.trim();
    if s.is_empty() || !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Int(i));
    }
    s.parse::<f64>().ok().map(Value::Float)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Value::Object(v)
    }
}

impl From<Callable> for Value {
    fn from(v: Callable) -> Self {
        Value::Callable(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// 参数槽位类型与访问方式不符
#[derive(Debug, Error)]
#[error("argument #{index} of {callable} should be {expected}, got {actual}")]
pub struct ArgumentError {
    pub callable: String,
    pub index: usize,
    pub expected: String,
    pub actual: String,
}

/// 已解析的位置参数，交给构造函数 / 方法 / 函数体使用
#[derive(Debug, Clone)]
pub struct Arguments {
    callable: String,
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(callable: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            callable: callable.into(),
            values,
        }
    }

    /// 所属可调用对象的限定名
    pub fn callable(&self) -> &str {
        &self.callable
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    fn mismatch(&self, index: usize, expected: &str) -> BoxError {
        let actual = self
            .values
            .get(index)
            .map_or_else(|| "nothing".to_string(), Value::type_name);
        Box::new(ArgumentError {
            callable: self.callable.clone(),
            index,
            expected: expected.to_string(),
            actual,
        })
    }

    pub fn value(&self, index: usize) -> Result<&Value, BoxError> {
        self.values
            .get(index)
            .ok_or_else(|| self.mismatch(index, "a value"))
    }

    pub fn int(&self, index: usize) -> Result<i64, BoxError> {
        self.values
            .get(index)
            .and_then(Value::as_i64)
            .ok_or_else(|| self.mismatch(index, "int"))
    }

    pub fn float(&self, index: usize) -> Result<f64, BoxError> {
        self.values
            .get(index)
            .and_then(Value::as_f64)
            .ok_or_else(|| self.mismatch(index, "float"))
    }

    pub fn bool(&self, index: usize) -> Result<bool, BoxError> {
        self.values
            .get(index)
            .and_then(Value::as_bool)
            .ok_or_else(|| self.mismatch(index, "bool"))
    }

    pub fn string(&self, index: usize) -> Result<&str, BoxError> {
        self.values
            .get(index)
            .and_then(Value::as_str)
            .ok_or_else(|| self.mismatch(index, "string"))
    }

    pub fn array(&self, index: usize) -> Result<&[Value], BoxError> {
        match self.values.get(index) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(self.mismatch(index, "array")),
        }
    }

    pub fn object(&self, index: usize) -> Result<Instance, BoxError> {
        self.values
            .get(index)
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| self.mismatch(index, "object"))
    }

    /// `null` 映射为 `None`，用于可空的对象参数
    pub fn optional_object(&self, index: usize) -> Result<Option<Instance>, BoxError> {
        match self.values.get(index) {
            Some(Value::Null) => Ok(None),
            Some(Value::Object(object)) => Ok(Some(object.clone())),
            _ => Err(self.mismatch(index, "object or null")),
        }
    }

    /// 直接借用对象内部的具体 Rust 类型
    pub fn downcast<T: Any>(&self, index: usize) -> Result<&T, BoxError> {
        self.values
            .get(index)
            .and_then(Value::as_object)
            .and_then(|object| object.downcast_ref::<T>())
            .ok_or_else(|| self.mismatch(index, std::any::type_name::<T>()))
    }
}
