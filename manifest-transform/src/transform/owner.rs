use serde::{Deserialize, Serialize};

use crate::{diagnostic::Diagnostics, manifest::Str, resource::Resource};

use super::Transformer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: Str,
    pub kind: Str,
    pub name: Str,
    pub uid: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_owner_deletion: Option<bool>,
}

impl OwnerReference {
    /// A reference marking the owner as the managing controller of its dependents.
    pub fn controller(
        api_version: impl Into<Str>,
        kind: impl Into<Str>,
        name: impl Into<Str>,
        uid: impl Into<Str>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            name: name.into(),
            uid: uid.into(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }
}

/// Makes every namespaced resource a dependent of the owner.
///
/// Cluster scoped resources are skipped, garbage collection across scopes is not reliable.
pub struct OwnerTransformer(pub OwnerReference);

impl OwnerTransformer {
    pub fn new(owner: OwnerReference) -> Self {
        Self(owner)
    }
}

impl Transformer for OwnerTransformer {
    #[tracing::instrument(
        skip_all,
        level = "trace",
        name = "owner_transform",
        fields(owner = %self.0.name)
    )]
    fn transform(
        &self,
        resource: &mut Resource,
        _diagnostics: &mut Diagnostics,
    ) -> anyhow::Result<()> {
        if resource.is_cluster_scoped() {
            return Ok(());
        }

        let reference = serde_json::to_value(&self.0)?;
        resource.set(&["metadata", "ownerReferences"], vec![reference])?;
        Ok(())
    }
}
