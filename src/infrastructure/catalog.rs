//! 类目录
//!
//! 启动时构建的类 / 接口 / 函数注册表，取代运行时反射与 `class_exists`
//! 式的字符串探测。"某对象能否充当某类型" 变成一次查表加显式的可赋值性检查。

use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::errors::BoxError;
use crate::types::{Arguments, Instance, ParameterDescriptor, Signature, Value};

type ConstructorFn = dyn Fn(Arguments) -> Result<Box<dyn Any + Send + Sync>, BoxError> + Send + Sync;
type MethodFn = dyn Fn(&Instance, Arguments) -> Result<Value, BoxError> + Send + Sync;
type FunctionFn = dyn Fn(Arguments) -> Result<Value, BoxError> + Send + Sync;

/// 自由函数
pub struct FunctionDescriptor {
    signature: Signature,
    body: Arc<FunctionFn>,
}

impl FunctionDescriptor {
    pub fn new<F>(name: impl Into<String>, params: Vec<ParameterDescriptor>, body: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            signature: Signature::new(name, params),
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        self.signature.name()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn call(&self, args: Arguments) -> Result<Value, BoxError> {
        (self.body)(args)
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// 实例方法
#[derive(Clone)]
pub struct MethodDescriptor {
    signature: Signature,
    body: Arc<MethodFn>,
}

impl MethodDescriptor {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn call(&self, object: &Instance, args: Arguments) -> Result<Value, BoxError> {
        (self.body)(object, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub(crate) struct ConstructorDescriptor {
    signature: Signature,
    factory: Arc<ConstructorFn>,
}

impl ConstructorDescriptor {
    pub(crate) fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn construct(&self, args: Arguments) -> Result<Box<dyn Any + Send + Sync>, BoxError> {
        (self.factory)(args)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
}

/// 类或接口的描述
#[derive(Clone)]
pub struct ClassDescriptor {
    name: String,
    kind: TypeKind,
    supertypes: Vec<String>,
    constructor: Option<ConstructorDescriptor>,
    methods: HashMap<String, MethodDescriptor>,
}

impl ClassDescriptor {
    /// 可实例化的具体类。`factory` 接收按 `params` 顺序解析好的参数。
    pub fn new<T, F>(name: impl Into<String>, params: Vec<ParameterDescriptor>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let signature = Signature::new(format!("{name}::__construct"), params);
        let factory: Arc<ConstructorFn> = Arc::new(move |args: Arguments| {
            let value = factory(args)?;
            Ok(Box::new(value) as Box<dyn Any + Send + Sync>)
        });
        Self {
            name,
            kind: TypeKind::Class,
            supertypes: Vec::new(),
            constructor: Some(ConstructorDescriptor { signature, factory }),
            methods: HashMap::new(),
        }
    }

    /// 不可直接实例化的抽象类
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Class,
            supertypes: Vec::new(),
            constructor: None,
            methods: HashMap::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::Interface,
            ..Self::abstract_class(name)
        }
    }

    /// 声明实现的接口或继承的父类
    pub fn implements(mut self, supertype: impl Into<String>) -> Self {
        let supertype = supertype.into();
        if !self.supertypes.contains(&supertype) {
            self.supertypes.push(supertype);
        }
        self
    }

    /// 接口继承，与 [`implements`](Self::implements) 等价
    pub fn extends(self, supertype: impl Into<String>) -> Self {
        self.implements(supertype)
    }

    pub fn method<F>(mut self, name: impl Into<String>, params: Vec<ParameterDescriptor>, body: F) -> Self
    where
        F: Fn(&Instance, Arguments) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let signature = Signature::new(format!("{}::{}", self.name, name), params);
        self.methods.insert(
            name,
            MethodDescriptor {
                signature,
                body: Arc::new(body),
            },
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn is_constructible(&self) -> bool {
        self.kind == TypeKind::Class && self.constructor.is_some()
    }

    pub fn constructor_signature(&self) -> Option<&Signature> {
        self.constructor.as_ref().map(ConstructorDescriptor::signature)
    }

    pub(crate) fn constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructor.as_ref()
    }

    /// 仅查本类声明的方法；继承链查找见 [`ClassCatalog::find_method`]
    pub fn method_descriptor(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("supertypes", &self.supertypes)
            .field("constructor", &self.constructor_signature())
            .field("methods", &methods)
            .finish()
    }
}

/// 启动期构建、之后只读的类型目录
#[derive(Debug, Clone, Default)]
pub struct ClassCatalog {
    types: HashMap<String, ClassDescriptor>,
    functions: HashMap<String, Arc<FunctionDescriptor>>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.register_class(class);
        self
    }

    pub fn with_interface(self, name: impl Into<String>) -> Self {
        self.with_class(ClassDescriptor::interface(name))
    }

    pub fn with_function(mut self, function: FunctionDescriptor) -> Self {
        self.register_function(function);
        self
    }

    pub fn register_class(&mut self, class: ClassDescriptor) {
        self.types.insert(class.name.clone(), class);
    }

    pub fn register_function(&mut self, function: FunctionDescriptor) {
        self.functions
            .insert(function.name().to_string(), Arc::new(function));
    }

    pub fn class(&self, id: &str) -> Option<&ClassDescriptor> {
        self.types.get(id)
    }

    pub fn function(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        self.functions.get(name).cloned()
    }

    /// 目录中存在该类或接口
    pub fn is_known(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    pub fn is_constructible(&self, id: &str) -> bool {
        self.types.get(id).is_some_and(ClassDescriptor::is_constructible)
    }

    /// `class` 的实例能否充当 `target`：同一类型，或沿父类/接口链可达
    pub fn is_assignable(&self, class: &str, target: &str) -> bool {
        if class == target {
            return true;
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([class]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(descriptor) = self.types.get(current) else {
                continue;
            };
            for supertype in &descriptor.supertypes {
                if supertype == target {
                    return true;
                }
                queue.push_back(supertype.as_str());
            }
        }
        false
    }

    /// 按继承链（广度优先）查找方法
    pub fn find_method(&self, class: &str, method: &str) -> Option<&MethodDescriptor> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([class]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(descriptor) = self.types.get(current) else {
                continue;
            };
            if let Some(found) = descriptor.methods.get(method) {
                return Some(found);
            }
            queue.extend(descriptor.supertypes.iter().map(String::as_str));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FileStorage;

    fn catalog() -> ClassCatalog {
        ClassCatalog::new()
            .with_interface("IStorage")
            .with_class(ClassDescriptor::interface("IFileStorage").extends("IStorage"))
            .with_class(ClassDescriptor::abstract_class("BaseStorage").method(
                "describe",
                vec![],
                |object, _| Ok(Value::from(object.class())),
            ))
            .with_class(
                ClassDescriptor::new("FileStorage", vec![], |_| Ok(FileStorage))
                    .implements("IFileStorage")
                    .implements("BaseStorage"),
            )
    }

    #[test]
    fn test_assignability_is_transitive() {
        let catalog = catalog();

        assert!(catalog.is_assignable("FileStorage", "FileStorage"));
        assert!(catalog.is_assignable("FileStorage", "IFileStorage"));
        assert!(catalog.is_assignable("FileStorage", "IStorage"));
        assert!(catalog.is_assignable("FileStorage", "BaseStorage"));
        assert!(!catalog.is_assignable("IStorage", "FileStorage"));
        assert!(!catalog.is_assignable("Unknown", "IStorage"));
    }

    #[test]
    fn test_constructibility() {
        let catalog = catalog();

        assert!(catalog.is_constructible("FileStorage"));
        assert!(!catalog.is_constructible("IStorage"));
        assert!(!catalog.is_constructible("BaseStorage"));
        assert!(catalog.is_known("BaseStorage"));
        assert!(!catalog.is_known("Nope"));
        assert_eq!(
            catalog
                .class("FileStorage")
                .and_then(ClassDescriptor::constructor_signature)
                .map(Signature::name),
            Some("FileStorage::__construct")
        );
    }

    #[test]
    fn test_inherited_method_lookup() {
        let catalog = catalog();

        let method = catalog.find_method("FileStorage", "describe").unwrap();
        assert_eq!(method.signature().name(), "BaseStorage::describe");
        assert!(catalog.find_method("FileStorage", "missing").is_none());
    }

    #[test]
    fn test_supertypes_are_deduplicated() {
        let class = ClassDescriptor::interface("A").extends("B").extends("B");
        assert_eq!(class.supertypes(), &["B".to_string()]);
    }
}
