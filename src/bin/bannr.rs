//! CLI for Bannr - promotional banners from product photos.

use bannr::{build_banner_prompt, Config, ImageRef, SessionState};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bannr")]
#[command(about = "Describe product photos with Gemini and turn them into a promo banner")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the products visible in the given images
    Describe(DescribeArgs),

    /// Print the banner prompt for a description (no network access)
    Prompt(BannerArgs),

    /// Generate a banner from a product description
    Banner(BannerArgs),

    /// Describe images and generate a banner in one go
    Run(RunArgs),

    /// Check that both endpoints are reachable
    Check,
}

#[derive(Args)]
struct DescribeArgs {
    /// Image files or http(s) URLs
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Args)]
struct BannerArgs {
    /// Product description, e.g. "Coca-Cola, Pepsi"
    #[arg(short, long)]
    description: String,

    /// Extra instructions for the banner
    #[arg(short, long)]
    customize: Option<String>,
}

#[derive(Args)]
struct RunArgs {
    /// Image files or http(s) URLs
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Extra instructions for the banner
    #[arg(short, long)]
    customize: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Describe(args) => describe(args, cli.json).await?,
        Commands::Prompt(args) => print_prompt(args, cli.json)?,
        Commands::Banner(args) => banner(args, cli.json).await?,
        Commands::Run(args) => run(args, cli.json).await?,
        Commands::Check => check(cli.json).await?,
    }

    Ok(())
}

fn image_refs(paths: Vec<PathBuf>) -> Vec<ImageRef> {
    paths.into_iter().map(ImageRef::from).collect()
}

async fn describe(args: DescribeArgs, json_output: bool) -> anyhow::Result<()> {
    let requester = Config::from_env()?.description_requester()?;
    let images = image_refs(args.images);
    let description = requester.describe(&images).await?;

    if json_output {
        let result = serde_json::json!({
            "type": "description",
            "success": true,
            "images": images.len(),
            "provider": requester.provider().name(),
            "description": description,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{description}");
    }

    Ok(())
}

fn print_prompt(args: BannerArgs, json_output: bool) -> anyhow::Result<()> {
    let prompt = build_banner_prompt(&args.description, args.customize.as_deref());

    if json_output {
        println!("{}", serde_json::to_string_pretty(&bannr::BannerRequest::new(prompt))?);
    } else {
        println!("{prompt}");
    }

    Ok(())
}

async fn banner(args: BannerArgs, json_output: bool) -> anyhow::Result<()> {
    let requester = Config::from_env()?.banner_requester()?;
    let banner = requester
        .request(&args.description, args.customize.as_deref())
        .await?;

    if json_output {
        let result = serde_json::json!({
            "type": "banner",
            "success": true,
            "image_url": banner.image_url,
            "provider": requester.provider().name(),
            "duration_ms": banner.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Banner: {}", banner.image_url);
        if let Some(duration) = banner.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}

async fn run(args: RunArgs, json_output: bool) -> anyhow::Result<()> {
    let session = Config::from_env()?.controller()?;
    if !json_output {
        session.observe(|state| eprintln!("[bannr] {}", state.name()));
    }

    let outcome = session.run(image_refs(args.images), args.customize).await;
    let state = outcome.unwrap_or_else(|| session.state());

    if json_output {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    match state {
        SessionState::ImageReady { url } => {
            if !json_output {
                println!("Banner: {url}");
            }
            Ok(())
        }
        SessionState::Failed { message } => anyhow::bail!(message),
        other => anyhow::bail!("session ended in unexpected state: {other}"),
    }
}

async fn check(json_output: bool) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let describe = match config.description_requester() {
        Ok(requester) => requester.provider().health_check().await,
        Err(e) => Err(e),
    };
    let banner = match config.banner_requester() {
        Ok(requester) => requester.provider().health_check().await,
        Err(e) => Err(e),
    };

    let report = |result: &bannr::Result<()>| match result {
        Ok(()) => "ok".to_string(),
        Err(e) => e.to_string(),
    };

    if json_output {
        let result = serde_json::json!({
            "describe": report(&describe),
            "banner": report(&banner),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let status = |r: &bannr::Result<()>| if r.is_ok() { "✓" } else { "✗" };
        println!("{} describe: {}", status(&describe), report(&describe));
        println!("{} banner:   {}", status(&banner), report(&banner));
    }

    if describe.is_err() || banner.is_err() {
        anyhow::bail!("health check failed");
    }
    Ok(())
}
