use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pingmatch_core::{
    build_reference_set, Embedding, EuclideanMatcher, ReferenceCollection, SharedReferences,
};
use std::path::{Path, PathBuf};

mod config;
mod descriptor_store;
mod image_source;
mod manifest;
mod session;

use config::Config;
use descriptor_store::DescriptorStore;
use manifest::Manifest;
use session::Session;

#[derive(Parser)]
#[command(name = "pingmatch", about = "Find the reference character most similar to a photo")]
struct Cli {
    /// Reference manifest (overrides PINGMATCH_MANIFEST)
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,
    /// Descriptor store (overrides PINGMATCH_DESCRIPTORS)
    #[arg(long, global = true)]
    descriptors: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a descriptor produced by the face model for an image
    Import {
        /// Image the descriptor was computed from
        image: PathBuf,
        /// JSON file holding the descriptor as an array of numbers
        descriptor: PathBuf,
    },
    /// Build the reference set and print or save it as JSON
    Build {
        /// Write the reference vectors here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Find the most similar reference for a photo
    Match {
        /// Photo to compare
        image: PathBuf,
        /// Maximum distance for a match (overrides PINGMATCH_THRESHOLD)
        #[arg(short, long)]
        threshold: Option<f32>,
    },
    /// List the references that have a descriptor
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(path) = cli.manifest {
        config.manifest_path = path;
    }
    if let Some(path) = cli.descriptors {
        config.descriptors_path = path;
    }

    match cli.command {
        Commands::Import { image, descriptor } => import(&config, &image, &descriptor),
        Commands::Build { out } => {
            let references = load_references(&config)?;
            let json = serde_json::to_string_pretty(&references)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing reference vectors {}", path.display()))?;
                    println!("Wrote {} reference(s) to {}", references.len(), path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Commands::Match { image, threshold } => {
            let threshold = threshold.unwrap_or(config.threshold);
            run_match(&config, &image, threshold)
        }
        Commands::List => {
            let references = load_references(&config)?;
            if references.is_empty() {
                println!("No references available");
            }
            for record in &references {
                println!(
                    "{}\t{}\t{} dims",
                    record.name,
                    record.image,
                    record.embedding.len()
                );
            }
            Ok(())
        }
    }
}

fn import(config: &Config, image: &Path, descriptor: &Path) -> Result<()> {
    let handle = image_source::load(image)?;
    let raw = std::fs::read_to_string(descriptor)
        .with_context(|| format!("reading descriptor {}", descriptor.display()))?;
    let embedding: Embedding = serde_json::from_str(&raw)
        .with_context(|| format!("parsing descriptor {}", descriptor.display()))?;
    if embedding.is_empty() || !embedding.is_finite() {
        bail!("descriptor {} must be a non-empty array of finite numbers", descriptor.display());
    }

    let mut store = DescriptorStore::load(&config.descriptors_path)?;
    let dims = embedding.len();
    if store.insert(handle.fingerprint.clone(), embedding).is_some() {
        tracing::info!(image = %image.display(), "replacing existing descriptor");
    }
    store.save(&config.descriptors_path)?;

    tracing::info!(
        image = %image.display(),
        fingerprint = %handle.fingerprint,
        dims,
        "descriptor imported"
    );
    println!(
        "Imported {dims}-dim descriptor for {} ({} stored)",
        image.display(),
        store.len()
    );
    Ok(())
}

fn load_references(config: &Config) -> Result<ReferenceCollection> {
    let manifest = Manifest::load(&config.manifest_path)?;
    let store = DescriptorStore::load(&config.descriptors_path)?;
    if store.is_empty() {
        tracing::warn!(
            path = %config.descriptors_path.display(),
            "descriptor store is empty; import descriptors first"
        );
    }
    Ok(build_reference_set(&store, &manifest.sources()))
}

fn run_match(config: &Config, image: &Path, threshold: f32) -> Result<()> {
    let mut session = Session::new();
    println!("{}", session.status_message());

    let references = SharedReferences::new(load_references(config)?);
    session.references_loaded(references);
    let store = DescriptorStore::load(&config.descriptors_path)?;

    session.select_image(image_source::load(image)?)?;
    println!("{}", session.status_message());

    session.compare(&store, &EuclideanMatcher, threshold)?;
    tracing::debug!(state = ?session.state(), "session finished");
    println!("{}", session.status_message());
    Ok(())
}
