//! Rewrites the resources of a component manifest before they are applied to a cluster.
//!
//! A [`Pipeline`] runs an ordered list of [`Transformer`]s over every resource of a [`Manifest`].
//! The builtin transformers move resources into a target namespace, make them dependents of the
//! installing component, and replace container, argument, step and param images with overrides
//! taken from the environment (see [`images`]).

use std::path::Path;

use anyhow::Context as _;

pub mod diagnostic;
pub mod images;
pub mod manifest;
pub mod nested;
pub mod pipeline;
pub mod resource;
pub mod transform;

pub use self::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
pub use self::images::{ImageOverrides, normalize};
pub use self::manifest::Manifest;
pub use self::pipeline::{Component, Pipeline};
pub use self::resource::{ResId, Resource};
pub use self::transform::Transformer;

/// Load a manifest from a file of `---` separated YAML documents.
pub fn load_manifest(path: impl AsRef<Path>) -> anyhow::Result<Manifest> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "load manifest: path does not exist: {}",
            path.display()
        ));
    }

    let file = std::fs::File::open(path)
        .with_context(|| format!("opening manifest {}", path.display()))?;
    Manifest::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("loading manifest {}", path.display()))
}
