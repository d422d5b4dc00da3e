use std::sync::Arc;

use serde_json::Value;

use crate::{
    diagnostic::{DiagnosticKind, Diagnostics},
    images::ImageOverrides,
    nested::{self, FieldError},
    resource::{Object, ResId, Resource},
};

use super::Transformer;

const CONTAINERS_PATH: &[&str] = &["spec", "template", "spec", "containers"];

/// Replaces container images of deployments, and image references passed to containers as
/// command line flags.
///
/// A container image is replaced when the override table has an entry for the container name. An
/// argument is either `flag=value`, where only the value is replaced, or a bare `flag` whose value
/// is the following argument.
pub struct DeploymentImageTransformer {
    images: Arc<ImageOverrides>,
}

impl DeploymentImageTransformer {
    pub fn new(images: impl Into<Arc<ImageOverrides>>) -> Self {
        Self {
            images: images.into(),
        }
    }

    fn replace_container_image(&self, container: &mut Object, i: usize) -> Result<(), FieldError> {
        let image = match nested::get::<String>(container, &["name"])
            .map_err(|err| in_container(err, i))?
        {
            Some(name) => self.images.for_container(name),
            None => None,
        };

        if let Some(image) = image {
            container.insert("image".to_string(), Value::String(image.to_string()));
        }

        Ok(())
    }

    fn replace_args_images(
        &self,
        id: &ResId,
        container: &mut Object,
        i: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), FieldError> {
        let name = container
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let Some(args) =
            nested::get_mut::<Vec<Value>>(container, &["args"]).map_err(|err| in_container(err, i))?
        else {
            return Ok(());
        };

        for index in 0..args.len() {
            let arg = nested::cast::<String>(&args[index], || {
                format!("{}[{i}].args[{index}]", CONTAINERS_PATH.join("."))
            })?;

            let update = match split_flag(arg) {
                Some((flag, _)) => self
                    .images
                    .for_arg(flag)
                    .map(|image| (index, format!("{flag}={image}"))),
                None => match self.images.for_arg(arg) {
                    Some(_) if index + 1 == args.len() => {
                        diagnostics.push(
                            id.clone(),
                            DiagnosticKind::TrailingFlag {
                                container: name.clone(),
                                flag: arg.clone(),
                            },
                        );
                        None
                    }
                    Some(image) => Some((index + 1, image.to_string())),
                    None => None,
                },
            };

            if let Some((target, value)) = update {
                args[target] = Value::String(value);
            }
        }

        Ok(())
    }
}

/// Splits `flag=value`, arguments with no or several `=` are bare flags.
fn split_flag(arg: &str) -> Option<(&str, &str)> {
    let mut parts = arg.split('=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(flag), Some(value), None) => Some((flag, value)),
        _ => None,
    }
}

fn in_container(err: FieldError, i: usize) -> FieldError {
    match err {
        FieldError::WrongType {
            path,
            expected,
            found,
        } => FieldError::WrongType {
            path: format!("{}[{i}].{path}", CONTAINERS_PATH.join(".")),
            expected,
            found,
        },
    }
}

impl Transformer for DeploymentImageTransformer {
    #[tracing::instrument(
        skip_all,
        level = "trace",
        name = "deployment_image_transform",
        fields(overrides = self.images.len())
    )]
    fn transform(
        &self,
        resource: &mut Resource,
        diagnostics: &mut Diagnostics,
    ) -> anyhow::Result<()> {
        if resource.kind() != "Deployment" {
            return Ok(());
        }

        let id = resource.id();
        let Some(containers) = resource.get_mut::<Vec<Value>>(CONTAINERS_PATH)? else {
            return Ok(());
        };

        for (i, container) in containers.iter_mut().enumerate() {
            let container = nested::cast_mut::<Object>(container, || {
                format!("{}[{i}]", CONTAINERS_PATH.join("."))
            })?;
            self.replace_container_image(container, i)?;
            self.replace_args_images(&id, container, i, diagnostics)?;
        }

        Ok(())
    }
}
