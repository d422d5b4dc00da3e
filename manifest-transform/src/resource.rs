mod scope;
mod view;

use std::fmt;

use compact_str::format_compact;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use self::scope::is_cluster_scoped;
pub use self::view::{AnnotationsView, MetadataView, MetadataViewMut};

use crate::{
    manifest::Str,
    nested::{self, FieldError},
};

pub type Object = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Gvk {
    pub group: Str,
    pub version: Str,
    pub kind: Str,
}

impl Gvk {
    pub fn api_version(&self) -> Str {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format_compact!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}.{}", self.kind, self.version)
        } else {
            write!(f, "{}.{}.{}", self.kind, self.version, self.group)
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResId {
    pub gvk: Gvk,
    pub name: Str,
    pub namespace: Option<Str>,
}

impl fmt::Debug for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{}/{}.{namespace}", self.gvk, self.name)
        } else {
            write!(f, "{}/{}", self.gvk, self.name)
        }
    }
}

/// A single document of a manifest.
///
/// The whole document is kept as an untyped object so that fields no transformer knows about
/// survive untouched. Identity (`kind`, `apiVersion`, name and namespace) is read from the object
/// on demand as transformers are free to rewrite the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Resource {
    root: Object,
}

impl Resource {
    pub fn kind(&self) -> &str {
        self.root.get("kind").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn api_version(&self) -> &str {
        self.root
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.metadata()
            .and_then(|metadata| metadata.name())
            .unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata()?.namespace()
    }

    pub fn gvk(&self) -> Gvk {
        let (group, version) = self
            .api_version()
            .split_once('/')
            .unwrap_or(("", self.api_version()));

        Gvk {
            group: group.into(),
            version: version.into(),
            kind: self.kind().into(),
        }
    }

    pub fn id(&self) -> ResId {
        ResId {
            gvk: self.gvk(),
            name: self.name().into(),
            namespace: self.namespace().map(Into::into),
        }
    }

    pub fn is_cluster_scoped(&self) -> bool {
        is_cluster_scoped(self.kind())
    }

    /// Look up a nested field, see [`nested::get`].
    pub fn get<T: nested::JsonValue>(&self, path: &[&str]) -> Result<Option<&T>, FieldError> {
        nested::get(&self.root, path)
    }

    /// Look up a nested field for mutation, see [`nested::get_mut`].
    pub fn get_mut<T: nested::JsonValue>(
        &mut self,
        path: &[&str],
    ) -> Result<Option<&mut T>, FieldError> {
        nested::get_mut(&mut self.root, path)
    }

    pub fn set(&mut self, path: &[&str], value: impl Into<Value>) -> Result<(), FieldError> {
        nested::set(&mut self.root, path, value.into())
    }
}

impl TryFrom<Value> for Resource {
    type Error = FieldError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(root) => Ok(Resource { root }),
            other => Err(FieldError::wrong_type("<document>", "mapping", &other)),
        }
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        Value::Object(resource.root)
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Resource::try_from(value)
            .map_err(|err| serde::de::Error::custom(format!("parsing resource: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Resource;

    fn resource(value: serde_json::Value) -> Resource {
        Resource::try_from(value).unwrap()
    }

    #[test]
    fn identity_is_read_from_the_document() {
        let resource = resource(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": "controller", "namespace": "default" },
        }));

        let id = resource.id();
        assert_eq!(id.gvk.group, "apps");
        assert_eq!(id.gvk.version, "v1");
        assert_eq!(id.gvk.api_version(), "apps/v1");
        assert_eq!(id.to_string(), "Deployment.v1.apps/controller.default");
    }

    #[test]
    fn core_group_has_no_prefix() {
        let resource = resource(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "config" },
        }));

        assert_eq!(resource.gvk().group, "");
        assert_eq!(resource.id().to_string(), "ConfigMap.v1/config");
        assert!(!resource.is_cluster_scoped());
    }

    #[test]
    fn documents_must_be_mappings() {
        let err = Resource::try_from(json!(["not", "a", "mapping"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "`<document>` is of type sequence, expected mapping"
        );
    }

    #[test]
    fn missing_identity_fields_are_empty() {
        let resource = resource(json!({}));
        assert_eq!(resource.kind(), "");
        assert_eq!(resource.name(), "");
        assert_eq!(resource.namespace(), None);
    }
}
