use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use moatdb::{Config, NamespaceLoader, PackageManifest};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "moatdb")]
#[command(about = "Inspect and exercise the models declared by a package manifest")]
struct Cli {
    #[arg(long, default_value = "moatdb")]
    engine: String,
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    engine_version: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every model of the manifest with its layout and binding
    Inspect { manifest: PathBuf },
    /// Add default entities to one model's store and report the result
    Smoke {
        manifest: PathBuf,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let closed = Config::new()
        .engine(&cli.engine)
        .version(&cli.engine_version)
        .close();
    if !closed {
        return Err(anyhow!("runtime was already configured"));
    }
    let loader = NamespaceLoader::from_global()?;

    match cli.command {
        Command::Inspect { manifest } => inspect(&loader, &manifest),
        Command::Smoke {
            manifest,
            model,
            count,
        } => smoke(&loader, &manifest, model.as_deref(), count).await,
    }
}

fn load_manifest(path: &Path) -> Result<PackageManifest> {
    PackageManifest::from_path(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))
}

fn inspect(loader: &NamespaceLoader, path: &Path) -> Result<()> {
    let manifest = load_manifest(path)?;
    let namespace = loader.load(&manifest)?;

    println!("package {}", namespace.package_id());
    for (name, class) in namespace.models() {
        let layout = class.layout()?;
        println!(
            "  {} [{}] provider={}",
            name,
            class.state()?,
            class.provider()?.unwrap_or_else(|| "-".to_string())
        );
        for slot in layout.attributes() {
            println!("    {}: {} = {}", slot.name, slot.attr_type, slot.default);
        }
        for command in layout.commands() {
            println!("    {}()", command);
        }
    }
    for (name, reason) in namespace.failures() {
        println!("  {} FAILED: {}", name, reason);
    }
    Ok(())
}

async fn smoke(
    loader: &NamespaceLoader,
    path: &Path,
    model: Option<&str>,
    count: usize,
) -> Result<()> {
    let manifest = load_manifest(path)?;
    let namespace = loader.load(&manifest)?;

    let class = match model {
        Some(name) => namespace.require_model(name)?,
        None => namespace
            .models()
            .next()
            .map(|(_, class)| class)
            .ok_or_else(|| anyhow!("package {} declares no models", namespace.package_id()))?,
    };

    for _ in 0..count {
        let mut entity = class.new_instance()?;
        match class.add(&mut entity)?.await {
            Ok(stored) => println!("added {}", stored.to_json()),
            Err(err) => println!("rejected: {}", err),
        }
    }

    let stored = class.count()?.await?;
    let uids = class.find_all_uids()?.await?;
    println!("{} holds {} record(s)", class.name(), stored);
    for uid in uids {
        println!("  {}", uid);
    }
    Ok(())
}
