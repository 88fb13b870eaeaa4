// Resource graph data model
//
// The template shape is owned by the deployment platform. Only the fields the
// wiring reads or writes are typed; everything else rides along in `extra` and
// is written back exactly as it was read.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single resource declaration: `{ "Type": .., "Properties": .., "UpdatePolicy": .. }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,

    #[serde(
        rename = "Properties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub properties: Option<Map<String, Value>>,

    #[serde(
        rename = "UpdatePolicy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub update_policy: Option<Map<String, Value>>,

    /// DependsOn, Condition, Metadata, DeletionPolicy, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: None,
            update_policy: None,
            extra: Map::new(),
        }
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_update_policy(mut self, update_policy: Map<String, Value>) -> Self {
        self.update_policy = Some(update_policy);
        self
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.as_ref()?.get(name)
    }
}

/// A generated declaration together with the logical id it must be stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    logical_id: String,
    resource: Resource,
}

impl Fragment {
    pub fn new(logical_id: impl Into<String>, resource: Resource) -> Self {
        Self {
            logical_id: logical_id.into(),
            resource,
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn into_parts(self) -> (String, Resource) {
        (self.logical_id, self.resource)
    }

    /// Render as the single-entry `{ logicalId: declaration }` mapping.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        let mut entry = Map::new();
        entry.insert(self.logical_id.clone(), serde_json::to_value(&self.resource)?);
        Ok(Value::Object(entry))
    }
}

/// Logical id -> declaration, in template order.
///
/// Writes go through [`ResourceGraph::merge`] and
/// [`ResourceGraph::redirect_integration`] (see `splice.rs`), which never
/// silently replace a different declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceGraph {
    pub(crate) resources: IndexMap<String, Resource>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn get(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn contains(&self, logical_id: &str) -> bool {
        self.resources.contains_key(logical_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(id, r)| (id.as_str(), r))
    }

    pub fn logical_ids(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Resource)> for ResourceGraph {
    fn from_iter<I: IntoIterator<Item = (String, Resource)>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}

const RESOURCES: &str = "Resources";

/// A whole compiled template. Only `Resources` is interpreted; every other
/// section (`AWSTemplateFormatVersion`, `Outputs`, ...) is carried through.
///
/// Sections are written back in document order, with `Resources` in the slot
/// it was read from (appended when the input had none).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub resources: ResourceGraph,

    /// Every top-level key except `Resources`, in document order
    pub sections: Map<String, Value>,

    resources_position: Option<usize>,
}

impl Template {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let at = self
            .resources_position
            .unwrap_or(self.sections.len())
            .min(self.sections.len());

        let mut map = serializer.serialize_map(Some(self.sections.len() + 1))?;
        for (index, (key, value)) in self.sections.iter().enumerate() {
            if index == at {
                map.serialize_entry(RESOURCES, &self.resources)?;
            }
            map.serialize_entry(key, value)?;
        }
        if at == self.sections.len() {
            map.serialize_entry(RESOURCES, &self.resources)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = Map::<String, Value>::deserialize(deserializer)?;

        let mut template = Template::default();
        for (key, value) in document {
            if key == RESOURCES {
                template.resources_position = Some(template.sections.len());
                template.resources = serde_json::from_value(value).map_err(de::Error::custom)?;
            } else {
                template.sections.insert(key, value);
            }
        }
        Ok(template)
    }
}
