//! Service descriptor loading
//!
//! A service directory holds a `service.yaml` made of several YAML documents.
//! The first one describes the service itself; every following document is a
//! component override whose string values may reference environment variables
//! as `${NAME}`, `${NAME:type}` or `${NAME:type:default}`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{PropelError, Result};

/// File name of the descriptor inside a service directory
pub const SERVICE_FILE: &str = "service.yaml";

/// An environment variable referenced by a service override
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnvVarRef {
    pub name: String,
    pub default: Option<String>,
}

/// Source of the environment variables a service needs
pub trait ServiceDescriptor: Send + Sync {
    fn env_vars_for_service(&self, path: &Path) -> Result<BTreeSet<EnvVarRef>>;
}

/// Reads `service.yaml` from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlServiceDescriptor;

impl YamlServiceDescriptor {
    fn descriptor_path(path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(SERVICE_FILE)
        } else {
            path.to_path_buf()
        }
    }
}

impl ServiceDescriptor for YamlServiceDescriptor {
    fn env_vars_for_service(&self, path: &Path) -> Result<BTreeSet<EnvVarRef>> {
        let file = Self::descriptor_path(path);
        let content = fs::read_to_string(&file).map_err(|e| {
            PropelError::Descriptor(format!("cannot read {}: {}", file.display(), e))
        })?;
        env_vars_in_yaml(&content)
            .map_err(|e| PropelError::Descriptor(format!("{}: {}", file.display(), e)))
    }
}

/// Environment variables referenced by the override documents of `content`
pub fn env_vars_in_yaml(content: &str) -> std::result::Result<BTreeSet<EnvVarRef>, serde_yaml::Error> {
    let mut found = BTreeSet::new();
    for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value = Value::deserialize(document)?;
        if index == 0 {
            continue;
        }
        collect(&value, &mut found);
    }
    Ok(found)
}

fn collect(value: &Value, found: &mut BTreeSet<EnvVarRef>) {
    let Value::Mapping(mapping) = value else {
        return;
    };
    for item in mapping.values() {
        match item {
            Value::String(s) => {
                if let Some(var) = parse_env_reference(s) {
                    found.insert(var);
                }
            }
            Value::Mapping(_) => collect(item, found),
            _ => {}
        }
    }
}

/// Parse `${NAME:type:default}`
///
/// References without a name (`${int:5}`) and strings that are not a whole
/// reference yield `None`.
pub fn parse_env_reference(raw: &str) -> Option<EnvVarRef> {
    let inner = raw.strip_prefix("${")?.strip_suffix('}')?;
    let mut parts = inner.splitn(3, ':');

    let name = parts.next()?;
    let valid_name = name
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if name.is_empty() || !valid_name {
        return None;
    }

    let var_type = parts.next();
    if let Some(t) = var_type {
        if !t.is_empty() && !t.chars().all(|c| c.is_ascii_lowercase()) {
            return None;
        }
    }
    let default = parts.next().filter(|d| !d.is_empty()).map(String::from);

    Some(EnvVarRef {
        name: name.to_string(),
        default,
    })
}
