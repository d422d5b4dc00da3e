use anyhow::Context as _;

use crate::{
    diagnostic::Diagnostics,
    manifest::Manifest,
    resource::Resource,
    transform::{
        CrdWebhookTransformer, NamespaceTransformer, OwnerReference, OwnerTransformer,
        PRESERVE_NAMESPACE_ANNOTATION, Transformer,
    },
};

/// An ordered list of transformers applied to every resource of a manifest.
#[derive(Default)]
pub struct Pipeline {
    transformers: Vec<Box<dyn Transformer>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, transformer: impl Transformer + 'static) -> Self {
        self.push(transformer);
        self
    }

    pub fn push(&mut self, transformer: impl Transformer + 'static) {
        self.transformers.push(Box::new(transformer));
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Run every transformer over every resource of `manifest`.
    ///
    /// Each resource passes through the whole chain before the next one is started. The run
    /// happens on a copy: `manifest` is only replaced once all resources were transformed, so on
    /// error it is left exactly as it was.
    #[tracing::instrument(
        skip_all,
        fields(resources = manifest.len(), transformers = self.transformers.len())
    )]
    pub fn run(&self, manifest: &mut Manifest) -> anyhow::Result<Diagnostics> {
        let mut diagnostics = Diagnostics::default();
        let mut out = manifest.clone();
        for resource in out.iter_mut() {
            self.apply(resource, &mut diagnostics)?;
        }

        tracing::debug!(diagnostics = diagnostics.len(), "transformed manifest");
        *manifest = out;
        Ok(diagnostics)
    }

    /// Run the chain over a single resource, mutating it in place.
    pub fn apply(
        &self,
        resource: &mut Resource,
        diagnostics: &mut Diagnostics,
    ) -> anyhow::Result<()> {
        // named as the caller sees it, before any transformer rewrites it
        let id = resource.id();
        for transformer in &self.transformers {
            transformer
                .transform(resource, diagnostics)
                .with_context(|| format!("transforming resource `{id}`"))?;
        }

        Ok(())
    }
}

impl Extend<Box<dyn Transformer>> for Pipeline {
    fn extend<T: IntoIterator<Item = Box<dyn Transformer>>>(&mut self, iter: T) {
        self.transformers.extend(iter);
    }
}

/// A component whose manifest is being installed.
pub trait Component {
    /// Namespace the component is installed into.
    fn target_namespace(&self) -> &str;

    /// Reference to the component, set as owner of its namespaced resources.
    fn owner_reference(&self) -> OwnerReference;

    /// Record that installing the component failed.
    fn mark_install_failed(&mut self, message: &str);
}

/// The transformers every component gets: owner injection, namespace injection (honouring
/// [`PRESERVE_NAMESPACE_ANNOTATION`]) and conversion webhook namespace injection.
pub fn common_transformers<C: Component + ?Sized>(component: &C) -> Pipeline {
    let namespace = component.target_namespace();
    Pipeline::new()
        .with(OwnerTransformer::new(component.owner_reference()))
        .with(NamespaceTransformer::new(namespace).preserving(PRESERVE_NAMESPACE_ANNOTATION))
        .with(CrdWebhookTransformer::new(namespace))
}

/// Transform `manifest` for `component` with the common transformers followed by `extra`.
///
/// On success `manifest` is replaced by the transformed manifest and diagnostics are logged. On
/// failure `manifest` is untouched and the component is marked as failed to install.
#[tracing::instrument(skip_all, fields(namespace = component.target_namespace()))]
pub fn transform<C: Component + ?Sized>(
    manifest: &mut Manifest,
    component: &mut C,
    extra: impl IntoIterator<Item = Box<dyn Transformer>>,
) -> anyhow::Result<()> {
    tracing::debug!("transforming manifest");

    let mut pipeline = common_transformers(component);
    pipeline.extend(extra);

    match pipeline.run(manifest) {
        Ok(diagnostics) => {
            diagnostics.log();
            Ok(())
        }
        Err(err) => {
            component.mark_install_failed(&format!("{err:#}"));
            Err(err)
        }
    }
}
