use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::errors::LoaderError;
use crate::infrastructure::container::{EntryConfig, MethodCall, ResolutionConfig};

/// Source of container configuration.
///
/// A loader turns an external document into the shapes the container consumes:
/// identifier -> entry configuration, interface -> implementation bindings, and
/// an optional autowire toggle.
pub trait ContainerLoader {
    /// Load the entry registry
    fn load_entries(&self) -> Result<HashMap<String, EntryConfig>, LoaderError>;

    /// Load interface -> implementation bindings
    fn load_interfaces(&self) -> Result<HashMap<String, String>, LoaderError>;

    /// Autowire toggle; `None` leaves the container's current setting
    fn autowire(&self) -> Option<bool> {
        None
    }
}

/// Deserialized container document, shared by the JSON and TOML loaders
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContainerDocument {
    pub autowire: Option<bool>,
    pub interfaces: HashMap<String, String>,
    pub entries: HashMap<String, EntryDocument>,
}

/// Entry body: either `{constructor, calls}` or a bare parameter map
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntryDocument {
    Structured(StructuredEntry),
    Shorthand(Map<String, JsonValue>),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructuredEntry {
    pub constructor: Map<String, JsonValue>,
    pub calls: Vec<CallDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallDocument {
    pub method: String,
    #[serde(default)]
    pub arguments: Map<String, JsonValue>,
}

impl ContainerDocument {
    /// Parse a JSON document
    pub fn from_json(content: &str) -> Result<Self, LoaderError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a TOML document. Values go through `serde_json::Value` so both
    /// formats share one value mapping.
    pub fn from_toml(content: &str) -> Result<Self, LoaderError> {
        let raw: JsonValue = toml::from_str(content)?;
        Ok(serde_json::from_value(raw)?)
    }

    fn entries(&self) -> Result<HashMap<String, EntryConfig>, LoaderError> {
        self.entries
            .iter()
            .map(|(id, body)| Ok((id.clone(), body.to_entry_config(id)?)))
            .collect()
    }

    fn interfaces(&self) -> Result<HashMap<String, String>, LoaderError> {
        if let Some((interface, _)) = self.interfaces.iter().find(|(_, class)| class.is_empty()) {
            return Err(LoaderError::Corrupted(format!(
                "interface '{interface}' is bound to an empty class name"
            )));
        }
        Ok(self.interfaces.clone())
    }
}

impl EntryDocument {
    fn to_entry_config(&self, id: &str) -> Result<EntryConfig, LoaderError> {
        match self {
            EntryDocument::Structured(entry) => {
                let mut config = EntryConfig::new().constructor(entry.constructor.clone().into());
                for call in &entry.calls {
                    if call.method.is_empty() {
                        return Err(LoaderError::Corrupted(format!(
                            "entry '{id}' has a call without a method name"
                        )));
                    }
                    config.calls.push(MethodCall::new(
                        call.method.clone(),
                        ResolutionConfig::from(call.arguments.clone()),
                    ));
                }
                Ok(config)
            }
            // Reserved keys with the wrong shape would otherwise be taken as parameters
            EntryDocument::Shorthand(params) => {
                if params.contains_key("constructor") || params.contains_key("calls") {
                    return Err(LoaderError::Corrupted(format!(
                        "entry '{id}' has malformed 'constructor' or 'calls'"
                    )));
                }
                Ok(ResolutionConfig::from(params.clone()).into())
            }
        }
    }
}

impl ContainerLoader for ContainerDocument {
    fn load_entries(&self) -> Result<HashMap<String, EntryConfig>, LoaderError> {
        let entries = self.entries()?;
        tracing::debug!(entries = entries.len(), "loaded container entries");
        Ok(entries)
    }

    fn load_interfaces(&self) -> Result<HashMap<String, String>, LoaderError> {
        let interfaces = self.interfaces()?;
        tracing::debug!(interfaces = interfaces.len(), "loaded interface bindings");
        Ok(interfaces)
    }

    fn autowire(&self) -> Option<bool> {
        self.autowire
    }
}

/// Loader for JSON container documents
#[derive(Debug, Clone)]
pub struct JsonContainerLoader {
    document: ContainerDocument,
}

impl JsonContainerLoader {
    /// Create a loader from JSON text
    pub fn from_json(content: &str) -> Result<Self, LoaderError> {
        Ok(Self {
            document: ContainerDocument::from_json(content)?,
        })
    }

    /// Create a loader from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        Self::from_json(&read_document(path.as_ref())?)
    }

    pub fn document(&self) -> &ContainerDocument {
        &self.document
    }
}

impl ContainerLoader for JsonContainerLoader {
    fn load_entries(&self) -> Result<HashMap<String, EntryConfig>, LoaderError> {
        self.document.load_entries()
    }

    fn load_interfaces(&self) -> Result<HashMap<String, String>, LoaderError> {
        self.document.load_interfaces()
    }

    fn autowire(&self) -> Option<bool> {
        self.document.autowire()
    }
}

/// Loader for TOML container documents
#[derive(Debug, Clone)]
pub struct TomlContainerLoader {
    document: ContainerDocument,
}

impl TomlContainerLoader {
    /// Create a loader from TOML text
    pub fn from_toml(content: &str) -> Result<Self, LoaderError> {
        Ok(Self {
            document: ContainerDocument::from_toml(content)?,
        })
    }

    /// Create a loader from a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        Self::from_toml(&read_document(path.as_ref())?)
    }

    pub fn document(&self) -> &ContainerDocument {
        &self.document
    }
}

impl ContainerLoader for TomlContainerLoader {
    fn load_entries(&self) -> Result<HashMap<String, EntryConfig>, LoaderError> {
        self.document.load_entries()
    }

    fn load_interfaces(&self) -> Result<HashMap<String, String>, LoaderError> {
        self.document.load_interfaces()
    }

    fn autowire(&self) -> Option<bool> {
        self.document.autowire()
    }
}

/// Pick a loader by file extension (`.json` or `.toml`)
pub fn loader_for_path(path: impl AsRef<Path>) -> Result<Box<dyn ContainerLoader>, LoaderError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => Ok(Box::new(JsonContainerLoader::from_path(path)?)),
        Some("toml") => Ok(Box::new(TomlContainerLoader::from_path(path)?)),
        _ => Err(LoaderError::UnsupportedFormat(
            path.to_string_lossy().to_string(),
        )),
    }
}

fn read_document(path: &Path) -> Result<String, LoaderError> {
    tracing::debug!(path = %path.display(), "reading container configuration");
    fs::read_to_string(path).map_err(|e| LoaderError::Io(path.to_string_lossy().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_shorthand_and_structured_entries() {
        let document = ContainerDocument::from_json(
            r#"{
                "entries": {
                    "Engine": { "power": 120 },
                    "Car": {
                        "constructor": { "engine": "Engine" },
                        "calls": [ { "method": "setName", "arguments": { "name": "x" } } ]
                    }
                }
            }"#,
        )
        .unwrap();

        let entries = document.load_entries().unwrap();
        assert_eq!(
            entries["Engine"].constructor.get("power"),
            Some(&Value::Int(120))
        );
        assert_eq!(entries["Car"].calls.len(), 1);
        assert_eq!(entries["Car"].calls[0].method, "setName");
        assert_eq!(document.autowire(), None);
    }

    #[test]
    fn test_empty_entry_body_is_structured() {
        let document = ContainerDocument::from_json(r#"{"entries": {"Engine": {}}}"#).unwrap();
        let entries = document.load_entries().unwrap();
        assert!(entries["Engine"].constructor.is_empty());
        assert!(entries["Engine"].calls.is_empty());
    }

    #[test]
    fn test_malformed_reserved_keys_are_corrupted() {
        let document =
            ContainerDocument::from_json(r#"{"entries": {"Car": {"calls": "setName"}}}"#).unwrap();
        assert!(matches!(
            document.load_entries(),
            Err(LoaderError::Corrupted(_))
        ));
    }

    #[test]
    fn test_toml_document() {
        let document = ContainerDocument::from_toml(
            r#"
            autowire = false

            [interfaces]
            IStorage = "FileStorage"

            [entries.Engine]
            power = 120
            "#,
        )
        .unwrap();

        assert_eq!(document.autowire(), Some(false));
        assert_eq!(
            document.load_interfaces().unwrap().get("IStorage"),
            Some(&"FileStorage".to_string())
        );
        assert_eq!(
            document.load_entries().unwrap()["Engine"].constructor.get("power"),
            Some(&Value::Int(120))
        );
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            loader_for_path("container.yaml"),
            Err(LoaderError::UnsupportedFormat(_))
        ));
    }
}
