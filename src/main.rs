use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use node_requests::cli::{Args, OutputFormat};
use node_requests::{collect_report, render, KubeCluster};

async fn client(args: &Args) -> Result<Client> {
    if args.kubeconfig.is_none() && args.context.is_none() {
        return Client::try_default()
            .await
            .context("building default Kubernetes client");
    }

    let options = KubeConfigOptions {
        context: args.context.clone(),
        ..Default::default()
    };
    let config = match &args.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("reading kubeconfig {}", path.display()))?;
            Config::from_custom_kubeconfig(kubeconfig, &options).await?
        }
        None => Config::from_kubeconfig(&options).await?,
    };

    Ok(Client::try_from(config)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cluster = KubeCluster::new(client(&args).await?);
    let report = collect_report(&cluster).await?;

    for diagnostic in &report.diagnostics {
        warn!(%diagnostic, "skipped");
    }

    let mut out = io::stdout().lock();
    match args.output {
        OutputFormat::Text => render::write_text(&mut out, &report, args.pods)?,
        OutputFormat::Json => render::write_json(&mut out, &report)?,
    }
    out.flush()?;

    Ok(())
}
