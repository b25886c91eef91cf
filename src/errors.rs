//! 容器错误类型
//!
//! 所有失败都归入 [`ContainerError`]；调用方既可以整体捕获，
//! 也可以通过 [`ContainerError::kind`] 按具体类别区分。

use thiserror::Error;

/// 用户提供的构造函数、方法、函数体返回的底层错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 容器结果类型别名
pub type Result<T> = std::result::Result<T, ContainerError>;

/// 错误类别，穿透上下文包装后的根因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Configuration,
    TypeMismatch,
    MissingArgument,
    CircularDependency,
    InstantiationFailure,
    InvocationFailure,
}

#[derive(Debug, Error)]
pub enum ContainerError {
    /// 标识符未注册，且无法自动装配
    #[error("Entry '{id}' not found{}", format_available(.available))]
    NotFound { id: String, available: Vec<String> },

    /// 注册或配置本身有问题
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 显式给出的值不满足任何声明类型
    #[error("Parameter {parameter} of {target} should be one of '{}', got {actual}", .expected.join(", "))]
    TypeMismatch {
        parameter: String,
        target: String,
        expected: Vec<String>,
        actual: String,
    },

    /// 按名称引用的类无法解析
    #[error("Provided parameter {parameter} for {target} points to '{reference}' which could not be resolved")]
    InvalidReference {
        parameter: String,
        target: String,
        reference: String,
        #[source]
        source: Box<ContainerError>,
    },

    /// 没有配置、没有可装配类型、也没有默认值
    #[error("Value not provided for parameter {parameter} in {target}")]
    MissingArgument { parameter: String, target: String },

    /// 自动装配链上出现环
    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// 构造函数返回错误
    #[error("Something went wrong during instantiation of {class}")]
    InstantiationFailure {
        class: String,
        #[source]
        source: BoxError,
    },

    /// 方法或函数调用返回错误
    #[error("Something went wrong during invoking {callable}{}", format_attempt(.attempt))]
    InvocationFailure {
        callable: String,
        attempt: Option<usize>,
        #[source]
        source: BoxError,
    },

    /// 递归解析依赖时的失败，附带参数与目标上下文
    #[error("Failed to resolve parameter {parameter} of {target}")]
    Dependency {
        parameter: String,
        target: String,
        #[source]
        source: Box<ContainerError>,
    },
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(". Available entries: {}", available.join(", "))
    }
}

fn format_attempt(attempt: &Option<usize>) -> String {
    match attempt {
        Some(n) => format!(" (call #{n})"),
        None => String::new(),
    }
}

impl ContainerError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ContainerError::Configuration(message.into())
    }

    /// 根因类别。`Dependency` 与 `InvalidReference` 只是上下文包装，
    /// 其中 `InvalidReference` 在根因为 `NotFound` 时归类为类型不匹配。
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContainerError::NotFound { .. } => ErrorKind::NotFound,
            ContainerError::Configuration(_) => ErrorKind::Configuration,
            ContainerError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            ContainerError::MissingArgument { .. } => ErrorKind::MissingArgument,
            ContainerError::CircularDependency { .. } => ErrorKind::CircularDependency,
            ContainerError::InstantiationFailure { .. } => ErrorKind::InstantiationFailure,
            ContainerError::InvocationFailure { .. } => ErrorKind::InvocationFailure,
            ContainerError::InvalidReference { source, .. } => match source.kind() {
                ErrorKind::NotFound => ErrorKind::TypeMismatch,
                other => other,
            },
            ContainerError::Dependency { source, .. } => source.kind(),
        }
    }

    /// 剥离所有上下文包装后的最内层容器错误
    pub fn root_cause(&self) -> &ContainerError {
        match self {
            ContainerError::InvalidReference { source, .. }
            | ContainerError::Dependency { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// 配置文档加载错误
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Failed to read container configuration '{0}': {1}")]
    Io(String, #[source] std::io::Error),
    #[error("Failed to parse JSON container configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse TOML container configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Container configuration corrupted: {0}")]
    Corrupted(String),
    #[error("Unsupported container configuration format: {0}")]
    UnsupportedFormat(String),
}

impl From<LoaderError> for ContainerError {
    fn from(err: LoaderError) -> Self {
        ContainerError::Configuration(err.to_string())
    }
}
