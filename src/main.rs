use std::path::PathBuf;

use clap::Parser;
use drivelist::{DeviceDescriptor, Enumerator};
use tracing_subscriber::EnvFilter;

/// List the block devices attached to this machine
#[derive(Parser)]
#[command(version)]
struct Opt {
    /// Directory containing the platform scripts
    #[arg(long, env = drivelist::SCRIPTS_ROOT_ENV)]
    scripts_root: Option<PathBuf>,
    /// Print json instead of a table
    #[arg(long)]
    json: bool,
    /// Only show removable drives
    #[arg(long)]
    removable: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opt = Opt::parse();

    let mut enumerator = Enumerator::new();
    if let Some(root) = opt.scripts_root {
        enumerator = enumerator.scripts_root(root);
    }

    let drives: Vec<DeviceDescriptor> = enumerator
        .list()
        .await?
        .into_iter()
        .filter(|d| !opt.removable || d.is_removable)
        .collect();

    if opt.json {
        println!("{}", serde_json::to_string_pretty(&drives)?);
        return Ok(());
    }

    for d in &drives {
        let mounts = d
            .mountpoints
            .iter()
            .map(|m| m.path.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        println!(
            "{:<24} {:>16} {:<9} {:<32} {}",
            d.device,
            d.size,
            if d.is_removable { "removable" } else { "fixed" },
            d.description,
            mounts
        );
    }

    Ok(())
}
