use serde_json::Value;

use crate::nested::FieldError;

use super::{Object, Resource};

impl Resource {
    pub fn metadata(&self) -> Option<MetadataView<'_>> {
        self.root
            .get("metadata")
            .and_then(|v| v.as_object())
            .map(MetadataView)
    }

    pub fn annotations(&self) -> Option<AnnotationsView<'_>> {
        self.metadata()?.annotations()
    }

    /// Returns whether the annotation `key` is present with the exact value `"true"`.
    pub fn has_annotation_enabled(&self, key: &str) -> bool {
        self.annotations()
            .is_some_and(|annotations| annotations.get(key) == Some("true"))
    }

    pub fn metadata_mut(&mut self) -> Option<MetadataViewMut<'_>> {
        self.root
            .get_mut("metadata")
            .and_then(|v| v.as_object_mut())
            .map(MetadataViewMut)
    }

    /// Mutable metadata view, inserting an empty `metadata` mapping if there is none.
    pub fn make_metadata_mut(&mut self) -> Result<MetadataViewMut<'_>, FieldError> {
        let metadata = self
            .root
            .entry("metadata")
            .or_insert_with(|| Value::Object(Object::new()));
        if metadata.is_null() {
            *metadata = Value::Object(Object::new());
        }

        match metadata {
            Value::Object(metadata) => Ok(MetadataViewMut(metadata)),
            other => Err(FieldError::wrong_type("metadata", "mapping", other)),
        }
    }
}

#[derive(Debug)]
pub struct MetadataView<'a>(&'a Object);

impl<'a> MetadataView<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.0.get("name").and_then(|v| v.as_str())
    }

    pub fn namespace(&self) -> Option<&'a str> {
        self.0.get("namespace").and_then(|v| v.as_str())
    }

    pub fn annotations(&self) -> Option<AnnotationsView<'a>> {
        self.0
            .get("annotations")
            .and_then(|v| v.as_object())
            .map(AnnotationsView)
    }

    pub fn owner_references(&self) -> Option<&'a [Value]> {
        self.0
            .get("ownerReferences")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
    }
}

#[derive(Debug)]
pub struct AnnotationsView<'a>(&'a Object);

impl<'a> AnnotationsView<'a> {
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.0
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|value| (k.as_str(), value)))
    }
}

#[derive(Debug)]
pub struct MetadataViewMut<'a>(&'a mut Object);

impl MetadataViewMut<'_> {
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.0
            .insert("name".to_string(), Value::String(name.into()));
    }

    pub fn set_namespace(&mut self, namespace: Option<impl Into<String>>) {
        match namespace {
            None => self.0.remove("namespace"),
            Some(namespace) => self
                .0
                .insert("namespace".to_string(), Value::String(namespace.into())),
        };
    }
}
