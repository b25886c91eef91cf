//! 调用器
//!
//! 构造函数、方法、自由函数走同一条 "先解析参数、再调用" 的路径，
//! 底层失败统一包装为容器错误。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{ContainerError, Result};
use crate::infrastructure::catalog::{ClassDescriptor, FunctionDescriptor, MethodDescriptor};
use crate::infrastructure::container::{Container, Entry, ResolutionConfig};
use crate::infrastructure::resolver::Resolver;
use crate::types::{Arguments, Instance, Object, Value};

pub(crate) struct Invoker<'c> {
    container: &'c Container,
}

impl<'c> Invoker<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self { container }
    }

    /// 把一个待解析注册项变成实例：构造，然后依次执行配置的构造后调用
    pub(crate) fn materialize(&self, entry: &Entry) -> Result<Instance> {
        let class = self.container.catalog().class(entry.id()).ok_or_else(|| {
            ContainerError::configuration(format!("Class {} does not exist!", entry.id()))
        })?;

        let instance = self.instantiate_object(class, &entry.config().constructor)?;

        let mut attempts: HashMap<&str, usize> = HashMap::new();
        for call in &entry.config().calls {
            let method = self
                .container
                .catalog()
                .find_method(class.name(), &call.method)
                .ok_or_else(|| {
                    ContainerError::configuration(format!(
                        "Method {}::{} doesn't exist!",
                        class.name(),
                        call.method
                    ))
                })?;

            let attempt = attempts.entry(call.method.as_str()).or_insert(0);
            self.invoke_method(&instance, method, &call.arguments, Some(*attempt))?;
            *attempt += 1;
        }

        Ok(instance)
    }

    pub(crate) fn instantiate_object(
        &self,
        class: &ClassDescriptor,
        config: &ResolutionConfig,
    ) -> Result<Instance> {
        let constructor = class.constructor().ok_or_else(|| {
            ContainerError::configuration(format!("Class {} is not instantiable!", class.name()))
        })?;

        let signature = constructor.signature();
        let args = Resolver::new(self.container).resolve_params(signature, config)?;

        debug!(class = class.name(), args = args.len(), "instantiating");
        let data = constructor
            .construct(Arguments::new(signature.name(), args))
            .map_err(|source| ContainerError::InstantiationFailure {
                class: class.name().to_string(),
                source,
            })?;

        Ok(Arc::new(Object::from_boxed(class.name(), data)))
    }

    pub(crate) fn invoke_method(
        &self,
        object: &Instance,
        method: &MethodDescriptor,
        config: &ResolutionConfig,
        attempt: Option<usize>,
    ) -> Result<Value> {
        let signature = method.signature();
        let args = Resolver::new(self.container).resolve_params(signature, config)?;

        debug!(method = signature.name(), ?attempt, "invoking method");
        method
            .call(object, Arguments::new(signature.name(), args))
            .map_err(|source| ContainerError::InvocationFailure {
                callable: signature.name().to_string(),
                attempt,
                source,
            })
    }

    pub(crate) fn invoke_free_function(
        &self,
        function: &FunctionDescriptor,
        config: &ResolutionConfig,
    ) -> Result<Value> {
        let signature = function.signature();
        let args = Resolver::new(self.container).resolve_params(signature, config)?;

        debug!(function = signature.name(), "invoking function");
        function
            .call(Arguments::new(signature.name(), args))
            .map_err(|source| ContainerError::InvocationFailure {
                callable: signature.name().to_string(),
                attempt: None,
                source,
            })
    }
}
