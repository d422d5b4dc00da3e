use serde_json::Value;

use crate::{
    diagnostic::Diagnostics,
    manifest::Str,
    nested::{self, FieldError},
    resource::{Object, Resource},
};

use super::Transformer;

/// Resources annotated with this key set to `"true"` keep their namespace.
pub const PRESERVE_NAMESPACE_ANNOTATION: &str = "operator.tekton.dev/preserve-namespace";

/// Moves resources into a target namespace.
///
/// Namespaced resources get `metadata.namespace` rewritten. A `Namespace` resource is renamed to
/// the target. Namespace references that already exist in role binding subjects, webhook
/// configuration services and API service specs are rewritten as well; missing references are
/// never created.
pub struct NamespaceTransformer {
    namespace: Str,
    preserve_annotation: Option<Str>,
}

impl NamespaceTransformer {
    pub fn new(namespace: impl Into<Str>) -> Self {
        Self {
            namespace: namespace.into(),
            preserve_annotation: None,
        }
    }

    /// Skip resources carrying `annotation` with the exact value `"true"`.
    pub fn preserving(mut self, annotation: impl Into<Str>) -> Self {
        self.preserve_annotation = Some(annotation.into());
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn overwrite_namespace(&self, obj: &mut Object) {
        if let Some(namespace) = obj.get_mut("namespace") {
            *namespace = Value::String(self.namespace.to_string());
        }
    }

    fn rewrite_subjects(&self, resource: &mut Resource) -> Result<(), FieldError> {
        let Some(subjects) = resource.get_mut::<Vec<Value>>(&["subjects"])? else {
            return Ok(());
        };

        for (i, subject) in subjects.iter_mut().enumerate() {
            let subject = nested::cast_mut::<Object>(subject, || format!("subjects[{i}]"))?;
            self.overwrite_namespace(subject);
        }

        Ok(())
    }

    fn rewrite_webhooks(&self, resource: &mut Resource) -> Result<(), FieldError> {
        let Some(webhooks) = resource.get_mut::<Vec<Value>>(&["webhooks"])? else {
            return Ok(());
        };

        for (i, webhook) in webhooks.iter_mut().enumerate() {
            let webhook = nested::cast_mut::<Object>(webhook, || format!("webhooks[{i}]"))?;
            let service = nested::get_mut::<Object>(webhook, &["clientConfig", "service"])
                .map_err(|err| in_entry(err, "webhooks", i))?;
            if let Some(service) = service {
                self.overwrite_namespace(service);
            }
        }

        Ok(())
    }
}

fn in_entry(err: FieldError, field: &str, index: usize) -> FieldError {
    match err {
        FieldError::WrongType {
            path,
            expected,
            found,
        } => FieldError::WrongType {
            path: format!("{field}[{index}].{path}"),
            expected,
            found,
        },
    }
}

impl Transformer for NamespaceTransformer {
    #[tracing::instrument(
        skip_all,
        level = "trace",
        name = "namespace_transform",
        fields(namespace = %self.namespace)
    )]
    fn transform(
        &self,
        resource: &mut Resource,
        _diagnostics: &mut Diagnostics,
    ) -> anyhow::Result<()> {
        if let Some(annotation) = &self.preserve_annotation
            && resource.has_annotation_enabled(annotation)
        {
            tracing::trace!(resource = %resource.id(), "preserving namespace");
            return Ok(());
        }

        if !resource.is_cluster_scoped() {
            resource
                .make_metadata_mut()?
                .set_namespace(Some(self.namespace.as_str()));
        }

        match resource.kind().to_ascii_lowercase().as_str() {
            "namespace" => resource.make_metadata_mut()?.set_name(self.namespace.as_str()),
            "clusterrolebinding" | "rolebinding" => self.rewrite_subjects(resource)?,
            "validatingwebhookconfiguration" | "mutatingwebhookconfiguration" => {
                self.rewrite_webhooks(resource)?
            }
            "apiservice" => {
                if let Some(service) = resource.get_mut::<Object>(&["spec", "service"])? {
                    self.overwrite_namespace(service);
                }
            }
            _ => {}
        }

        Ok(())
    }
}
