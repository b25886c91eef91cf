pub mod loader;

// Re-export commonly used types
pub use loader::{
    loader_for_path, CallDocument, ContainerDocument, ContainerLoader, EntryDocument,
    JsonContainerLoader, StructuredEntry, TomlContainerLoader,
};
