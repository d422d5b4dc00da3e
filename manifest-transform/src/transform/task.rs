use std::sync::Arc;

use serde_json::Value;

use crate::{
    diagnostic::{DiagnosticKind, Diagnostics},
    images::{self, ImageOverrides, PARAM_PREFIX},
    resource::{ResId, Resource},
};

use super::Transformer;

const TASK_KIND: &str = "ClusterTask";

/// Replaces step images and image-valued param defaults of cluster tasks.
///
/// Steps are matched by their normalized name, params by their normalized name with the
/// [`PARAM_PREFIX`]. Entries without a usable name or without an override are left alone and
/// reported as diagnostics.
pub struct TaskImageTransformer {
    images: Arc<ImageOverrides>,
}

#[derive(Debug, Clone, Copy)]
enum Section {
    Steps,
    Params,
}

impl Section {
    fn path(self) -> &'static [&'static str] {
        match self {
            Section::Steps => &["spec", "steps"],
            Section::Params => &["spec", "params"],
        }
    }

    fn field(self) -> &'static str {
        match self {
            Section::Steps => "spec.steps",
            Section::Params => "spec.params",
        }
    }

    /// The field of an entry that receives the override.
    fn target(self) -> &'static str {
        match self {
            Section::Steps => "image",
            Section::Params => "default",
        }
    }
}

impl TaskImageTransformer {
    pub fn new(images: impl Into<Arc<ImageOverrides>>) -> Self {
        Self {
            images: images.into(),
        }
    }

    fn lookup(&self, section: Section, name: &str) -> Option<&str> {
        match section {
            Section::Steps => self.images.for_step(name),
            Section::Params => self.images.for_param(name),
        }
    }

    fn key(section: Section, name: &str) -> String {
        match section {
            Section::Steps => images::normalize("", name),
            Section::Params => images::normalize(PARAM_PREFIX, name),
        }
    }

    fn replace_images(
        &self,
        id: &ResId,
        section: Section,
        entries: &mut [Value],
        diagnostics: &mut Diagnostics,
    ) {
        for (index, entry) in entries.iter_mut().enumerate() {
            let Some(entry) = entry.as_object_mut() else {
                diagnostics.push(
                    id.clone(),
                    DiagnosticKind::Unnamed {
                        field: section.field(),
                        index,
                    },
                );
                continue;
            };

            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                diagnostics.push(
                    id.clone(),
                    DiagnosticKind::Unnamed {
                        field: section.field(),
                        index,
                    },
                );
                continue;
            };

            match self.lookup(section, name) {
                Some(image) => {
                    entry.insert(
                        section.target().to_string(),
                        Value::String(image.to_string()),
                    );
                }
                None => diagnostics.push(
                    id.clone(),
                    DiagnosticKind::ImageNotFound {
                        field: section.field(),
                        key: Self::key(section, name),
                    },
                ),
            }
        }
    }
}

impl Transformer for TaskImageTransformer {
    #[tracing::instrument(
        skip_all,
        level = "trace",
        name = "task_image_transform",
        fields(overrides = self.images.len())
    )]
    fn transform(
        &self,
        resource: &mut Resource,
        diagnostics: &mut Diagnostics,
    ) -> anyhow::Result<()> {
        if resource.kind() != TASK_KIND {
            return Ok(());
        }

        let id = resource.id();
        for section in [Section::Steps, Section::Params] {
            if let Some(entries) = resource.get_mut::<Vec<Value>>(section.path())? {
                self.replace_images(&id, section, entries, diagnostics);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transform::test_util::apply;

    fn cluster_task(spec: serde_json::Value) -> serde_json::Value {
        json!({
            "apiVersion": "tekton.dev/v1beta1",
            "kind": "ClusterTask",
            "metadata": { "name": "buildah" },
            "spec": spec,
        })
    }

    fn transformer(images: &[(&str, &str)]) -> TaskImageTransformer {
        TaskImageTransformer::new(images.iter().copied().collect::<ImageOverrides>())
    }

    #[test]
    fn step_image_is_replaced() {
        let (out, diagnostics) = apply(
            &transformer(&[("build", "new")]),
            cluster_task(json!({ "steps": [{ "name": "build", "image": "old" }] })),
        )
        .unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(out["spec"]["steps"], json!([{ "name": "build", "image": "new" }]));
    }

    #[test]
    fn missing_override_is_reported() {
        let input = cluster_task(json!({ "steps": [{ "name": "build", "image": "old" }] }));
        let (out, diagnostics) = apply(&transformer(&[("push", "new")]), input.clone()).unwrap();

        assert_eq!(out, input);
        assert_eq!(
            diagnostics.kinds().collect::<Vec<_>>(),
            [&DiagnosticKind::ImageNotFound {
                field: "spec.steps",
                key: "build".into(),
            }]
        );
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(
            diagnostic.to_string(),
            "ClusterTask.v1beta1.tekton.dev/buildah: image not found for `spec.steps` entry `build`, skipping"
        );
    }

    #[test]
    fn empty_override_counts_as_missing() {
        let input = cluster_task(json!({ "steps": [{ "name": "build", "image": "old" }] }));
        let (out, diagnostics) = apply(&transformer(&[("build", "")]), input.clone()).unwrap();
        assert_eq!(out, input);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn unnamed_steps_are_skipped() {
        let (out, diagnostics) = apply(
            &transformer(&[("build", "new")]),
            cluster_task(json!({
                "steps": [
                    { "image": "anonymous" },
                    { "name": 7, "image": "numbered" },
                    "not-a-step",
                    { "name": "Build", "image": "old" },
                ],
            })),
        )
        .unwrap();

        assert_eq!(
            out["spec"]["steps"],
            json!([
                { "image": "anonymous" },
                { "name": 7, "image": "numbered" },
                "not-a-step",
                { "name": "Build", "image": "new" },
            ])
        );
        assert_eq!(
            diagnostics.kinds().collect::<Vec<_>>(),
            [
                &DiagnosticKind::Unnamed { field: "spec.steps", index: 0 },
                &DiagnosticKind::Unnamed { field: "spec.steps", index: 1 },
                &DiagnosticKind::Unnamed { field: "spec.steps", index: 2 },
            ]
        );
    }

    #[test]
    fn param_default_is_replaced() {
        let (out, _) = apply(
            &transformer(&[("param_builder_image", "registry/buildah:v2")]),
            cluster_task(json!({
                "params": [
                    { "name": "BUILDER_IMAGE", "default": "quay.io/buildah:v1" },
                    { "name": "DOCKERFILE", "default": "./Dockerfile" },
                ],
            })),
        )
        .unwrap();

        assert_eq!(
            out["spec"]["params"],
            json!([
                { "name": "BUILDER_IMAGE", "default": "registry/buildah:v2" },
                { "name": "DOCKERFILE", "default": "./Dockerfile" },
            ])
        );
    }

    #[test]
    fn params_are_handled_without_steps() {
        let (out, diagnostics) = apply(
            &transformer(&[("param_builder_image", "new")]),
            cluster_task(json!({ "params": [{ "name": "builder-image" }] })),
        )
        .unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(out["spec"]["params"][0]["default"], "new");
        assert_eq!(out["spec"].get("steps"), None);
    }

    #[test]
    fn only_cluster_tasks_are_transformed() {
        let input = json!({
            "apiVersion": "tekton.dev/v1beta1",
            "kind": "Task",
            "metadata": { "name": "buildah" },
            "spec": { "steps": [{ "name": "build", "image": "old" }] },
        });
        let (out, diagnostics) = apply(&transformer(&[("build", "new")]), input.clone()).unwrap();
        assert_eq!(out, input);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn malformed_steps_are_errors() {
        let err = apply(
            &transformer(&[]),
            cluster_task(json!({ "steps": { "name": "build" } })),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "`spec.steps` is of type mapping, expected sequence"
        );
    }
}
