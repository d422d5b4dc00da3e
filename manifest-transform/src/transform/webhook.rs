use serde_json::Value;

use crate::{
    diagnostic::Diagnostics,
    manifest::Str,
    resource::{Object, Resource},
};

use super::Transformer;

const SERVICE_PATH: &[&str] = &["spec", "conversion", "webhookClientConfig", "service"];

/// Points the conversion webhook of custom resource definitions at the target namespace.
///
/// Only an existing `namespace` of the webhook service is rewritten.
pub struct CrdWebhookTransformer(pub Str);

impl CrdWebhookTransformer {
    pub fn new(namespace: impl Into<Str>) -> Self {
        Self(namespace.into())
    }
}

impl Transformer for CrdWebhookTransformer {
    #[tracing::instrument(
        skip_all,
        level = "trace",
        name = "crd_webhook_transform",
        fields(namespace = %self.0)
    )]
    fn transform(
        &self,
        resource: &mut Resource,
        _diagnostics: &mut Diagnostics,
    ) -> anyhow::Result<()> {
        if !resource
            .kind()
            .eq_ignore_ascii_case("customresourcedefinition")
        {
            return Ok(());
        }

        let Some(service) = resource.get_mut::<Object>(SERVICE_PATH)? else {
            return Ok(());
        };

        if let Some(namespace) = service.get_mut("namespace") {
            *namespace = Value::String(self.0.to_string());
        }

        Ok(())
    }
}
