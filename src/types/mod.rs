//! 值与参数描述类型

pub mod descriptor;
pub mod value;

pub use descriptor::{parse_type_list, ParameterDescriptor, Signature, TypeTag};
pub use value::{ArgumentError, Arguments, Callable, Instance, Object, Value};
