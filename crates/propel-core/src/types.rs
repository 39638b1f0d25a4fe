//! Core domain types
//!
//! Server entities keep unknown fields in `extra` so the CLI can print
//! exactly what the service returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// State an agent reports once its deployment finished
pub const STATE_DEPLOYED: &str = "DEPLOYED";

/// State an agent reports once it is running
pub const STATE_STARTED: &str = "STARTED";

/// Agent as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form lifecycle state, `null` while the service has none
    #[serde(default)]
    pub agent_state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Agent {
    /// Reported state, if any
    pub fn state(&self) -> Option<&str> {
        self.agent_state.as_deref()
    }

    /// Name if known, otherwise the id, otherwise "-"
    pub fn display_name(&self) -> String {
        match (&self.name, self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "-".to_string(),
        }
    }
}

/// Seat allocation of the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seats {
    pub n_available: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Type tag of a variable value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    #[default]
    Str,
    Int,
    Bool,
    Float,
    Dict,
    List,
    None,
}

impl VarType {
    /// Every type, in wire order
    pub const ALL: [VarType; 7] = [
        VarType::Str,
        VarType::Int,
        VarType::Bool,
        VarType::Float,
        VarType::Dict,
        VarType::List,
        VarType::None,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            VarType::Str => "str",
            VarType::Int => "int",
            VarType::Bool => "bool",
            VarType::Float => "float",
            VarType::Dict => "dict",
            VarType::List => "list",
            VarType::None => "none",
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VarType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VarType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown variable type: {}", s))
    }
}

/// Variable as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub key: String,
    pub var_type: VarType,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of a variable creation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVariable {
    pub name: String,
    /// Agent configuration key the value is bound to
    pub key: String,
    #[serde(rename = "masked_value")]
    pub value: String,
    pub var_type: VarType,
}

impl NewVariable {
    /// A `str` variable
    pub fn new(name: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            value: value.into(),
            var_type: VarType::Str,
        }
    }

    pub fn with_type(mut self, var_type: VarType) -> Self {
        self.var_type = var_type;
        self
    }
}

/// Body of an agent creation request
///
/// Unset options, `false` flags and an empty variable list are left out of
/// the payload; `key` is always sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewAgent {
    pub key: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_ipfs_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<u64>,
    #[serde(skip_serializing_if = "is_false")]
    pub ingress_enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub tendermint_ingress_enabled: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Split a comma separated list, dropping empty items
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}
