use std::sync::Arc;

use manifest_transform::{
    ImageOverrides, Manifest, Pipeline, Resource,
    images::PIPELINES_IMAGE_PREFIX,
    transform::{
        CrdWebhookTransformer, DeploymentImageTransformer, NamespaceTransformer,
        PRESERVE_NAMESPACE_ANNOTATION, TaskImageTransformer,
    },
};
use serde_json::json;

fn main() {
    divan::main();
}

fn manifest(deployments: usize) -> Manifest {
    (0..deployments)
        .flat_map(|i| {
            [
                json!({
                    "apiVersion": "apps/v1",
                    "kind": "Deployment",
                    "metadata": { "name": format!("controller-{i}"), "namespace": "tekton" },
                    "spec": { "template": { "spec": { "containers": [{
                        "name": format!("controller-{i}"),
                        "image": "gcr.io/controller:v1",
                        "args": ["-git-image", "gcr.io/git-init:v1", "-nop-image=gcr.io/nop:v1"],
                    }] } } },
                }),
                json!({
                    "apiVersion": "tekton.dev/v1beta1",
                    "kind": "ClusterTask",
                    "metadata": { "name": format!("task-{i}") },
                    "spec": {
                        "params": [{ "name": "BUILDER_IMAGE", "default": "quay.io/buildah:v1" }],
                        "steps": [{ "name": "build", "image": "quay.io/buildah:v1" }],
                    },
                }),
            ]
        })
        .map(|value| Resource::try_from(value).unwrap())
        .collect()
}

fn pipeline() -> Pipeline {
    let images = Arc::new(
        ImageOverrides::from_entries(
            [
                "IMAGE_PIPELINES_CONTROLLER_0=registry/controller:v2",
                "IMAGE_PIPELINES_ARG__GIT_IMAGE=registry/git-init:v2",
                "IMAGE_PIPELINES_ARG__NOP_IMAGE=registry/nop:v2",
                "IMAGE_PIPELINES_BUILD=registry/buildah:v2",
                "IMAGE_PIPELINES_PARAM_BUILDER_IMAGE=registry/buildah:v2",
            ],
            PIPELINES_IMAGE_PREFIX,
        )
        .lowercase_keys(),
    );

    Pipeline::new()
        .with(
            NamespaceTransformer::new("tekton-pipelines").preserving(PRESERVE_NAMESPACE_ANNOTATION),
        )
        .with(CrdWebhookTransformer::new("tekton-pipelines"))
        .with(DeploymentImageTransformer::new(images.clone()))
        .with(TaskImageTransformer::new(images))
}

#[divan::bench(args = [10, 100, 1000])]
fn run(bencher: divan::Bencher, deployments: usize) {
    let pipeline = pipeline();
    let manifest = manifest(deployments);
    bencher.bench_local(|| {
        let mut manifest = manifest.clone();
        pipeline.run(&mut manifest).unwrap();
        manifest
    });
}

#[divan::bench]
fn parse_and_print() -> String {
    let yaml = manifest(100).to_string();
    Manifest::from_yaml_str(&yaml).unwrap().to_string()
}
