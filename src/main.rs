//! vpc-consul: one-shot Consul VPC template generator
//!
//! Fetches the two region → AMI mappings, assembles the resource graph,
//! validates it against CloudFormation and writes the artifact. Any failure
//! aborts before anything is written.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use vpc_consul::aws::{self, AwsContext};
use vpc_consul::config::{DEFAULT_OUTPUT_PATH, DEFAULT_UBUNTU_SUITE, EC2_REGIONS};
use vpc_consul::{catalog, stack};

#[derive(Parser, Debug)]
#[command(name = "vpc-consul")]
#[command(about = "Generates the Consul VPC CloudFormation template")]
#[command(version)]
struct Args {
    /// Ubuntu release suite used for the bastion and Consul host images
    #[arg(long, env = "UBUNTU_SUITE", default_value = DEFAULT_UBUNTU_SUITE)]
    suite: String,

    /// AWS region the ValidateTemplate call is issued against
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// Path the generated template is written to
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    output: std::path::PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // The two fetchers are independent; each fills its own mapping.
    let http = reqwest::Client::new();
    info!(suite = %args.suite, "Fetching image mappings");
    let (nat_images, ubuntu_images) = tokio::try_join!(
        aws::fetch_nat_images(&EC2_REGIONS),
        catalog::fetch_ubuntu_images(&http, &args.suite, &EC2_REGIONS),
    )?;

    let template = stack::build_template(&nat_images, &ubuntu_images);
    let body = template.to_json().context("Failed to serialize template")?;

    let ctx = AwsContext::new(&args.region).await;
    aws::cloudformation::validate_template(&ctx, &body).await?;
    println!("Template validated!");

    std::fs::write(&args.output, &body)
        .with_context(|| format!("Failed to write template to {}", args.output.display()))?;
    println!("Template written to {}", args.output.display());

    Ok(())
}

/// Print the error and its cause chain to stderr.
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "Error: {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  Caused by: {cause}");
        source = cause.source();
    }
}
