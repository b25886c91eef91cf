//! 基础设施层
//!
//! - 类目录：类型、构造函数、方法的静态描述
//! - 匹配器：值与类型标签的匹配
//! - 解析器 / 调用器：按签名决定实参并执行
//! - 容器：注册表、单例缓存与自动装配入口

pub mod catalog;
pub mod container;
pub mod matcher;

pub(crate) mod invoker;
pub(crate) mod resolver;

// 重新导出API
pub use catalog::{ClassCatalog, ClassDescriptor, FunctionDescriptor, MethodDescriptor, TypeKind};
pub use container::{
    CallTarget, Container, ContainerHandle, ContainerStats, Definition, Entry, EntryConfig,
    MethodCall, ResolutionConfig,
};
