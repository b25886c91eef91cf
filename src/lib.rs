//! 运行时对象图解析器
//!
//! 根据构造函数签名与少量配置自动装配对象：已注册的标识符按配置构造，
//! 未注册的依赖按声明类型递归解析，每个标识符只构造一次并缓存。

pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod logging;
pub mod types;

// Re-export commonly used items for convenience
pub use config::{loader_for_path, ContainerLoader, JsonContainerLoader, TomlContainerLoader};
pub use errors::{BoxError, ContainerError, ErrorKind, LoaderError, Result};
pub use infrastructure::{
    CallTarget, ClassCatalog, ClassDescriptor, Container, ContainerHandle, ContainerStats,
    Definition, Entry, EntryConfig, FunctionDescriptor, MethodCall, ResolutionConfig,
};
pub use types::{Arguments, Callable, Instance, Object, ParameterDescriptor, Signature, TypeTag, Value};
