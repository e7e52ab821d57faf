// ── Schemaless record ──
//
// Most admin screens don't need a typed struct: the CLI and ad-hoc
// tooling work with `Record`, an id plus whatever fields the backend
// returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shopdesk_api::ResourceId;

use crate::resource::Resource;

/// Field names tried, in order, when a record needs a human label.
const LABEL_FIELDS: [&str; 4] = ["name", "title", "label", "fullName"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<ResourceId>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Resolve a dotted path such as `brand.name`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let (head, rest) = path.split_once('.').unwrap_or((path, ""));
        let first = self.fields.get(head)?;
        if rest.is_empty() {
            return Some(first);
        }
        first.pointer(&format!("/{}", rest.replace('.', "/")))
    }

    /// `isActive` flag, when the resource carries one.
    pub fn is_active(&self) -> Option<bool> {
        self.fields.get("isActive").and_then(Value::as_bool)
    }

    /// Display label: first non-empty name-like field, else the id.
    pub fn label(&self) -> String {
        LABEL_FIELDS
            .iter()
            .filter_map(|f| self.fields.get(*f).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .map(str::to_owned)
            .or_else(|| self.id.as_ref().map(ToString::to_string))
            .unwrap_or_default()
    }
}

impl Resource for Record {
    fn id(&self) -> Option<&str> {
        self.id.as_ref().map(ResourceId::as_str).filter(|s| !s.is_empty())
    }
}
