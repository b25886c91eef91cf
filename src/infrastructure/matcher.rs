//! 值与类型标签的匹配
//!
//! 按标签声明顺序逐个尝试，第一个能接受该值的标签胜出。
//! 对象按可赋值性匹配；原始值按以下规则：
//!
//! - `int` / `float` 接受任意数值（包括数值字符串），并规范化为数值
//! - `bool`、`array`、`string`、`callable` 要求种类严格一致
//! - `null` 只接受空值
//! - `mixed` 接受一切

use crate::infrastructure::catalog::ClassCatalog;
use crate::types::{Instance, TypeTag, Value};

/// 检查 `value` 是否满足 `tags`，满足时返回（可能经过规范化的）值。
/// 空标签集表示未声明类型，原样接受。
pub fn check(value: &Value, tags: &[TypeTag], catalog: &ClassCatalog) -> Option<Value> {
    if tags.is_empty() {
        return Some(value.clone());
    }

    match value {
        Value::Object(object) => {
            if matches_object(object, tags, catalog) {
                Some(value.clone())
            } else {
                None
            }
        }
        primitive => tags.iter().find_map(|tag| coerce(primitive, tag)),
    }
}

/// 对象满足任一 `mixed` 标签，或其运行时类型可赋值给某个类/接口标签
pub fn matches_object(object: &Instance, tags: &[TypeTag], catalog: &ClassCatalog) -> bool {
    tags.iter().any(|tag| match tag {
        TypeTag::Mixed => true,
        TypeTag::Class(name) => catalog.is_assignable(object.class(), name),
        _ => false,
    })
}

fn coerce(value: &Value, tag: &TypeTag) -> Option<Value> {
    match (tag, value) {
        (TypeTag::Mixed, v) => Some(v.clone()),
        (TypeTag::Int, v) => v.to_number().map(|n| match n {
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Value::Int(f as i64)
            }
            other => other,
        }),
        (TypeTag::Float, v) => v.to_number().and_then(|n| n.as_f64()).map(Value::Float),
        (TypeTag::Bool, Value::Bool(_)) => Some(value.clone()),
        (TypeTag::Array, Value::Array(_) | Value::Map(_)) => Some(value.clone()),
        (TypeTag::String, Value::String(_)) => Some(value.clone()),
        (TypeTag::Null, Value::Null) => Some(Value::Null),
        (TypeTag::Callable, Value::Callable(_)) => Some(value.clone()),
        _ => None,
    }
}
