use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use manifest_transform::{
    ImageOverrides, Pipeline,
    images::PIPELINES_IMAGE_PREFIX,
    transform::{
        CrdWebhookTransformer, DeploymentImageTransformer, NamespaceTransformer,
        PRESERVE_NAMESPACE_ANNOTATION, TaskImageTransformer,
    },
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Emit logs as JSON.
    #[arg(long, global = true, env = "LOG_JSON")]
    log_json: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Transform a manifest and print the result to stdout.
    Transform {
        /// File of `---` separated YAML documents.
        path: PathBuf,
        /// Namespace to move the resources into.
        #[arg(long, short, env = "TARGET_NAMESPACE")]
        namespace: String,
        /// Prefix of the environment variables holding image overrides, may be repeated.
        #[arg(long = "image-prefix", default_value = PIPELINES_IMAGE_PREFIX)]
        image_prefixes: Vec<String>,
        /// Resources with this annotation set to `true` keep their namespace.
        #[arg(long, default_value = PRESERVE_NAMESPACE_ANNOTATION)]
        preserve_annotation: String,
    },
    /// Print the image overrides found in the environment.
    Images {
        #[arg(long = "image-prefix", default_value = PIPELINES_IMAGE_PREFIX)]
        image_prefixes: Vec<String>,
    },
}

fn init_logging(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let res = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    res.map_err(|err| anyhow::anyhow!("installing tracing subscriber: {err}"))
}

fn image_overrides(env: &[(String, String)], prefixes: &[String]) -> ImageOverrides {
    let mut images = ImageOverrides::default();
    for prefix in prefixes {
        images.merge(ImageOverrides::from_vars(env.iter().map(|(k, v)| (k, v)), prefix));
    }
    images.lowercase_keys()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json)?;

    // The environment is read once, everything below works on this snapshot.
    let env = std::env::vars().collect::<Vec<_>>();

    match args.command {
        Command::Transform {
            path,
            namespace,
            image_prefixes,
            preserve_annotation,
        } => {
            let mut manifest = manifest_transform::load_manifest(&path)?;
            let images = std::sync::Arc::new(image_overrides(&env, &image_prefixes));
            tracing::info!(
                path = %path.display(),
                resources = manifest.len(),
                overrides = images.len(),
                "transforming manifest"
            );

            let pipeline = Pipeline::new()
                .with(NamespaceTransformer::new(namespace.as_str()).preserving(preserve_annotation))
                .with(CrdWebhookTransformer::new(namespace.as_str()))
                .with(DeploymentImageTransformer::new(images.clone()))
                .with(TaskImageTransformer::new(images));

            let diagnostics = pipeline
                .run(&mut manifest)
                .with_context(|| format!("transforming manifest {}", path.display()))?;
            diagnostics.log();

            print!("{manifest}");
        }
        Command::Images { image_prefixes } => {
            let images = image_overrides(&env, &image_prefixes);
            for (key, image) in images.iter() {
                println!("{key}={image}");
            }
        }
    }

    Ok(())
}
