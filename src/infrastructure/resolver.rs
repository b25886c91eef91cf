//! 参数解析器
//!
//! 对一个可调用对象的每个形参，按声明顺序依次决定实参，第一个命中的分支胜出：
//!
//! 1. 类型包含容器自身类型 -> 注入容器
//! 2. 配置中显式给出 -> 类名字符串按引用解析，否则按类型标签校验
//! 3. 启用自动装配 -> 按标签顺序找第一个可构造类或已绑定接口，递归 `get`
//! 4. 声明了默认值 -> 使用默认值
//! 5. 否则报告缺少参数

use tracing::trace;

use crate::errors::{ContainerError, Result};
use crate::infrastructure::container::{Container, ResolutionConfig};
use crate::infrastructure::matcher;
use crate::types::{ParameterDescriptor, Signature, TypeTag, Value};

pub(crate) struct Resolver<'c> {
    container: &'c Container,
}

impl<'c> Resolver<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self { container }
    }

    /// 生成与声明顺序一致的位置参数列表
    pub(crate) fn resolve_params(
        &self,
        signature: &Signature,
        config: &ResolutionConfig,
    ) -> Result<Vec<Value>> {
        if signature.params().is_empty() && !config.is_empty() {
            return Err(ContainerError::configuration(format!(
                "{} doesn't take in any parameters!",
                signature.name()
            )));
        }

        signature
            .params()
            .iter()
            .map(|param| self.resolve_param(signature, param, config))
            .collect()
    }

    fn resolve_param(
        &self,
        signature: &Signature,
        param: &ParameterDescriptor,
        config: &ResolutionConfig,
    ) -> Result<Value> {
        if param.accepts_class(Container::SELF_ID) {
            trace!(target_fn = signature.name(), param = param.name(), "injecting container");
            return Ok(Value::Object(self.container.self_instance()));
        }

        if let Some(value) = config.get(param.name()) {
            trace!(target_fn = signature.name(), param = param.name(), "using explicit value");
            return self.resolve_explicit(signature, param, value);
        }

        if self.container.autowiring_enabled() {
            if let Some(id) = self.autowire_candidate(param) {
                trace!(
                    target_fn = signature.name(),
                    param = param.name(),
                    dependency = %id,
                    "autowiring"
                );
                let instance = self.container.autowire(&id).map_err(|source| {
                    ContainerError::Dependency {
                        parameter: param.name().to_string(),
                        target: signature.name().to_string(),
                        source: Box::new(source),
                    }
                })?;

                // 接口绑定可能指向不相容的类
                if !matcher::matches_object(&instance, param.types(), self.container.catalog()) {
                    return Err(ContainerError::TypeMismatch {
                        parameter: param.name().to_string(),
                        target: signature.name().to_string(),
                        expected: param.type_names(),
                        actual: instance.class().to_string(),
                    });
                }
                return Ok(Value::Object(instance));
            }
        }

        if let Some(default) = param.default() {
            trace!(target_fn = signature.name(), param = param.name(), "using default");
            return Ok(default.clone());
        }

        Err(ContainerError::MissingArgument {
            parameter: param.name().to_string(),
            target: signature.name().to_string(),
        })
    }

    fn resolve_explicit(
        &self,
        signature: &Signature,
        param: &ParameterDescriptor,
        value: &Value,
    ) -> Result<Value> {
        let value = match value {
            Value::String(reference) if self.container.is_reference(reference) => {
                let instance =
                    self.container
                        .get(reference)
                        .map_err(|source| ContainerError::InvalidReference {
                            parameter: param.name().to_string(),
                            target: signature.name().to_string(),
                            reference: reference.clone(),
                            source: Box::new(source),
                        })?;
                Value::Object(instance)
            }
            other => other.clone(),
        };

        matcher::check(&value, param.types(), self.container.catalog()).ok_or_else(|| {
            ContainerError::TypeMismatch {
                parameter: param.name().to_string(),
                target: signature.name().to_string(),
                expected: param.type_names(),
                actual: value.type_name(),
            }
        })
    }

    /// 第一个能落到具体标识符的类/接口标签；原始类型与 `mixed` 跳过
    fn autowire_candidate(&self, param: &ParameterDescriptor) -> Option<String> {
        let catalog = self.container.catalog();
        param.types().iter().find_map(|tag| {
            let TypeTag::Class(name) = tag else {
                return None;
            };
            if self.container.has(name) || catalog.is_constructible(name) {
                Some(name.clone())
            } else {
                self.container.binding(name)
            }
        })
    }
}
