use std::{path::Path, sync::Arc};

use anyhow::Context;
use manifest_transform::{
    ImageOverrides, Manifest, Pipeline,
    images::PIPELINES_IMAGE_PREFIX,
    transform::{
        CrdWebhookTransformer, DeploymentImageTransformer, NamespaceTransformer, OwnerReference,
        OwnerTransformer, PRESERVE_NAMESPACE_ANNOTATION, TaskImageTransformer,
    },
};
use serde::Deserialize;

datatest_stable::harness! {
    { test = test, root = "tests/transform/testdata", pattern = r"input\.yaml$" },
}

/// Per case settings, read from `options.yaml` next to the input.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Options {
    namespace: String,
    #[serde(default)]
    image_prefix: Option<String>,
    /// `KEY=VALUE` entries standing in for the process environment.
    #[serde(default)]
    env: Vec<String>,
    #[serde(default)]
    owner: Option<OwnerReference>,
}

fn pipeline(options: &Options) -> Pipeline {
    let prefix = options.image_prefix.as_deref().unwrap_or(PIPELINES_IMAGE_PREFIX);
    let images = Arc::new(ImageOverrides::from_entries(&options.env, prefix).lowercase_keys());

    let mut pipeline = Pipeline::new();
    if let Some(owner) = &options.owner {
        pipeline.push(OwnerTransformer::new(owner.clone()));
    }
    pipeline
        .with(
            NamespaceTransformer::new(options.namespace.as_str())
                .preserving(PRESERVE_NAMESPACE_ANNOTATION),
        )
        .with(CrdWebhookTransformer::new(options.namespace.as_str()))
        .with(DeploymentImageTransformer::new(images.clone()))
        .with(TaskImageTransformer::new(images))
}

fn test(path: &Path) -> datatest_stable::Result<()> {
    let dir = path.parent().unwrap();
    let options = std::fs::read_to_string(dir.join("options.yaml")).context("reading options")?;
    let options = serde_yaml::from_str::<Options>(&options).context("parsing options")?;

    let mut manifest = manifest_transform::load_manifest(path)?;
    match pipeline(&options).run(&mut manifest) {
        Ok(diagnostics) => {
            for diagnostic in &diagnostics {
                eprintln!("{diagnostic}");
            }
            snapshot(&dir.join("expected.yaml"), &manifest)?;
        }
        Err(err) => {
            eprintln!("Error transforming manifest at {}: {err:#}", path.display());
            snapshot_error(&dir.join("expected.stderr"), &format!("{err:#}\n"))?;
        }
    }

    Ok(())
}

/// Compares resources rather than text, so the snapshot may be formatted freely.
fn snapshot(path: &Path, actual: &Manifest) -> datatest_stable::Result<()> {
    if !path.exists() || std::env::var("UPDATE_SNAPSHOTS").is_ok() {
        std::fs::write(path, actual.to_string()).context("writing snapshot")?;
        return Ok(());
    }

    let expected = manifest_transform::load_manifest(path).context("reading snapshot")?;
    if &expected == actual {
        return Ok(());
    }

    let (expected, actual) = (expected.to_string(), actual.to_string());
    let chunks = dissimilar::diff(&expected, &actual);
    eprintln!(
        "Snapshot mismatch for {}:\n{}",
        path.display(),
        format_chunks(chunks)
    );

    Err(format!("Snapshot mismatch for {}", path.display()).into())
}

fn snapshot_error(path: &Path, actual: &str) -> datatest_stable::Result<()> {
    if !path.exists() || std::env::var("UPDATE_SNAPSHOTS").is_ok() {
        std::fs::write(path, actual).context("writing snapshot")?;
        return Ok(());
    }

    let expected = std::fs::read_to_string(path).context("reading snapshot")?;
    let chunks = dissimilar::diff(&expected, actual);
    if chunks
        .iter()
        .all(|chunk| matches!(chunk, dissimilar::Chunk::Equal(_)))
    {
        return Ok(());
    }

    eprintln!(
        "Snapshot mismatch for {}:\n{}",
        path.display(),
        format_chunks(chunks)
    );

    Err(format!("Snapshot mismatch for {}", path.display()).into())
}

fn format_chunks(chunks: Vec<dissimilar::Chunk>) -> String {
    let mut buf = String::new();
    for chunk in chunks {
        let formatted = match chunk {
            dissimilar::Chunk::Equal(text) => text.into(),
            dissimilar::Chunk::Delete(text) => format!("\x1b[4m\x1b[31m{text}\x1b[0m"),
            dissimilar::Chunk::Insert(text) => format!("\x1b[4m\x1b[32m{text}\x1b[0m"),
        };
        buf.push_str(&formatted);
    }
    buf
}
