//! 参数描述符
//!
//! 代替运行时反射：每个构造函数、方法、函数在启动时声明一次自己的
//! 参数表（名称、按声明顺序排列的类型标签、默认值），解析器只消费这些描述。

use std::fmt;

use super::value::Value;

/// 参数可接受类型集合中的一个单元
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Int,
    Float,
    Bool,
    Array,
    String,
    Null,
    Callable,
    /// 通配，接受任意值
    Mixed,
    /// 类或接口标识符
    Class(String),
}

impl TypeTag {
    /// 解析单个类型名，未知的名称一律视为类/接口标识符
    pub fn parse(word: &str) -> TypeTag {
        match word.trim() {
            "int" | "integer" => TypeTag::Int,
            "float" | "double" => TypeTag::Float,
            "bool" | "boolean" => TypeTag::Bool,
            "array" | "iterable" => TypeTag::Array,
            "string" => TypeTag::String,
            "null" => TypeTag::Null,
            "callable" => TypeTag::Callable,
            "mixed" | "any" => TypeTag::Mixed,
            other => TypeTag::Class(other.to_string()),
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeTag::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Bool => "bool",
            TypeTag::Array => "array",
            TypeTag::String => "string",
            TypeTag::Null => "null",
            TypeTag::Callable => "callable",
            TypeTag::Mixed => "mixed",
            TypeTag::Class(name) => name,
        };
        f.write_str(name)
    }
}

/// 解析联合类型声明，例如 `Foo|Bar|null` 或 `?Foo`。
///
/// 结果保持声明顺序并去重（首次出现者保留），顺序即自动装配时的优先级。
pub fn parse_type_list(declaration: &str) -> Vec<TypeTag> {
    let declaration = declaration.trim();
    let (nullable, body) = match declaration.strip_prefix('?') {
        Some(rest) => (true, rest),
        None => (false, declaration),
    };

    let mut tags = Vec::new();
    let words = body.split('|').map(str::trim).filter(|w| !w.is_empty());
    for tag in words.map(TypeTag::parse) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if nullable && !tags.contains(&TypeTag::Null) {
        tags.push(TypeTag::Null);
    }
    tags
}

/// 形参描述
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    name: String,
    types: Vec<TypeTag>,
    default: Option<Value>,
}

impl ParameterDescriptor {
    /// 无类型、无默认值的参数
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            default: None,
        }
    }

    /// 以声明文本设置类型，如 `"int"`、`"Foo|Bar"`、`"?Logger"`
    pub fn typed(mut self, declaration: &str) -> Self {
        self.types = parse_type_list(declaration);
        self
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = TypeTag>) -> Self {
        self.types.clear();
        for tag in types {
            if !self.types.contains(&tag) {
                self.types.push(tag);
            }
        }
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[TypeTag] {
        &self.types
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// 类型集合中是否包含指定类/接口
    pub fn accepts_class(&self, id: &str) -> bool {
        self.types.iter().any(|t| t.class_name() == Some(id))
    }

    pub(crate) fn type_names(&self) -> Vec<String> {
        self.types.iter().map(ToString::to_string).collect()
    }
}

/// 可调用对象的签名：限定名 + 按声明顺序排列的参数
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    name: String,
    params: Vec<ParameterDescriptor>,
}

impl Signature {
    pub fn new(name: impl Into<String>, params: Vec<ParameterDescriptor>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// 限定名，如 `Car::__construct`、`Car::setName` 或函数名
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParameterDescriptor] {
        &self.params
    }
}
