mod deployment;
mod namespace;
mod owner;
mod task;
mod webhook;

pub use self::deployment::DeploymentImageTransformer;
pub use self::namespace::{NamespaceTransformer, PRESERVE_NAMESPACE_ANNOTATION};
pub use self::owner::{OwnerReference, OwnerTransformer};
pub use self::task::TaskImageTransformer;
pub use self::webhook::CrdWebhookTransformer;

use crate::{diagnostic::Diagnostics, resource::Resource};

/// A mutation pass over a single resource.
///
/// Resources of a kind the transformer does not handle must be left alone and reported as
/// success. Errors are reserved for malformed content in a resource the transformer does handle.
/// Conditions that only warrant a warning are pushed to `diagnostics`.
pub trait Transformer: Send + Sync {
    fn transform(
        &self,
        resource: &mut Resource,
        diagnostics: &mut Diagnostics,
    ) -> anyhow::Result<()>;
}

impl<F> Transformer for F
where
    F: Fn(&mut Resource, &mut Diagnostics) -> anyhow::Result<()> + Send + Sync,
{
    fn transform(
        &self,
        resource: &mut Resource,
        diagnostics: &mut Diagnostics,
    ) -> anyhow::Result<()> {
        self(resource, diagnostics)
    }
}
