//! 配置加载器测试

use std::fs;
use std::sync::Arc;

use autowire::{
    loader_for_path, ClassCatalog, ClassDescriptor, Container, ContainerLoader, ErrorKind,
    Instance, JsonContainerLoader, LoaderError, ParameterDescriptor, TomlContainerLoader, Value,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Engine {
    power: i64,
}

struct Car {
    engine: Instance,
    name: Mutex<String>,
}

struct FileStorage;

const DOCUMENT: &str = r#"{
    "autowire": true,
    "interfaces": { "IStorage": "FileStorage" },
    "entries": {
        "Engine": { "power": 120 },
        "Car": {
            "constructor": { "engine": "Engine" },
            "calls": [ { "method": "setName", "arguments": { "name": "roadster" } } ]
        }
    }
}"#;

fn catalog() -> ClassCatalog {
    ClassCatalog::new()
        .with_class(ClassDescriptor::new(
            "Engine",
            vec![ParameterDescriptor::new("power").typed("int")],
            |args| Ok(Engine { power: args.int(0)? }),
        ))
        .with_class(
            ClassDescriptor::new(
                "Car",
                vec![ParameterDescriptor::new("engine").typed("Engine")],
                |args| {
                    Ok(Car {
                        engine: args.object(0)?,
                        name: Mutex::new(String::new()),
                    })
                },
            )
            .method(
                "setName",
                vec![ParameterDescriptor::new("name").typed("string")],
                |object, args| {
                    let car = object.downcast_ref::<Car>().ok_or("receiver is not a Car")?;
                    *car.name.lock() = args.string(0)?.to_string();
                    Ok(Value::Null)
                },
            ),
        )
        .with_interface("IStorage")
        .with_class(ClassDescriptor::new("FileStorage", vec![], |_| Ok(FileStorage)).implements("IStorage"))
}

#[test]
fn test_configure_from_json() -> anyhow::Result<()> {
    let loader = JsonContainerLoader::from_json(DOCUMENT)?;
    let container = Container::new(catalog()).configure(&loader)?;

    assert_eq!(container.entries(), vec!["Car".to_string(), "Engine".to_string()]);
    assert_eq!(container.binding("IStorage").as_deref(), Some("FileStorage"));

    let car = container.get("Car")?;
    let car = car.downcast_ref::<Car>().expect("Car instance");
    assert_eq!(car.name.lock().as_str(), "roadster");
    assert_eq!(car.engine.downcast_ref::<Engine>().map(|e| e.power), Some(120));
    assert!(Arc::ptr_eq(&car.engine, &container.get("Engine")?));

    let storage = container.get("IStorage")?;
    assert!(storage.is::<FileStorage>());
    Ok(())
}

#[test]
fn test_configure_applies_autowire_flag() -> anyhow::Result<()> {
    let loader = JsonContainerLoader::from_json(r#"{"autowire": false}"#)?;
    let container = Container::new(catalog()).configure(&loader)?;

    assert!(!container.autowiring_enabled());
    assert_eq!(container.get("FileStorage").unwrap_err().kind(), ErrorKind::NotFound);

    // 未给出开关时保持容器当前设置
    let loader = JsonContainerLoader::from_json("{}")?;
    let container = container.configure(&loader)?;
    assert!(!container.autowiring_enabled());
    Ok(())
}

#[test]
fn test_load_from_files() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    let json_path = dir.path().join("container.json");
    fs::write(&json_path, DOCUMENT)?;

    let toml_path = dir.path().join("container.TOML");
    fs::write(
        &toml_path,
        r#"
        [interfaces]
        IStorage = "FileStorage"

        [entries.Engine]
        power = "95"
        "#,
    )?;

    let json = loader_for_path(&json_path)?;
    assert_eq!(json.load_entries()?.len(), 2);
    assert_eq!(json.autowire(), Some(true));

    let toml = loader_for_path(&toml_path)?;
    let container = Container::new(catalog()).configure(&*toml)?;
    let engine = container.get("Engine")?;
    assert_eq!(engine.downcast_ref::<Engine>().map(|e| e.power), Some(95));

    let direct = TomlContainerLoader::from_path(&toml_path)?;
    assert_eq!(direct.load_interfaces()?.len(), 1);
    Ok(())
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = JsonContainerLoader::from_path(dir.path().join("absent.json"));
    assert!(matches!(result, Err(LoaderError::Io(_, _))));
}

#[test]
fn test_corrupted_documents() {
    assert!(matches!(
        JsonContainerLoader::from_json("{ not json"),
        Err(LoaderError::Json(_))
    ));
    assert!(matches!(
        JsonContainerLoader::from_json(r#"{"entries": []}"#),
        Err(LoaderError::Json(_))
    ));
    assert!(matches!(
        TomlContainerLoader::from_toml("entries = ["),
        Err(LoaderError::Toml(_))
    ));

    let loader =
        JsonContainerLoader::from_json(r#"{"entries": {"Car": {"calls": [{"method": ""}]}}}"#)
            .unwrap();
    let err = Container::new(catalog()).configure(&loader).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("Container configuration corrupted"));
}
