mod chart;
mod error;
mod extract;
mod fetch;
mod profile;
mod search;
mod settings;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;

use fetch::HttpSource;
use profile::{Profile, Stage};
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "gh_profile",
    about = "Scrape public GitHub profiles into a JSON summary and language chart"
)]
struct Cli {
    /// Account handles to scrape
    #[arg(required = true)]
    handles: Vec<String>,

    /// Directory for the JSON record and SVG chart
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Skip rendering the language pie chart
    #[arg(long)]
    no_chart: bool,

    /// Attempt a best-effort LinkedIn profile lookup
    #[arg(long)]
    linkedin: bool,

    /// Print records to stdout instead of writing files
    #[arg(long)]
    stdout: bool,
}

enum Outcome {
    Done,
    RateLimited { retry_after: Option<u64> },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();
    let source = HttpSource::new(&settings)?;

    if !cli.stdout {
        fs::create_dir_all(&cli.out)
            .with_context(|| format!("creating output directory {}", cli.out.display()))?;
    }

    // Profiles are independent, so handles can run in parallel; each
    // construction stays strictly sequential internally.
    let results: Vec<(String, Result<Outcome>)> = cli
        .handles
        .par_iter()
        .map(|handle| (handle.clone(), run_one(&source, &settings, &cli, handle)))
        .collect();

    let mut failures = 0;
    for (handle, result) in results {
        match result {
            Ok(Outcome::Done) => {}
            Ok(Outcome::RateLimited { retry_after }) => {
                failures += 1;
                match retry_after {
                    Some(secs) => eprintln!("{handle}: rate limited, retry in {secs}s"),
                    None => eprintln!("{handle}: rate limited"),
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("{handle}: {e:#}");
            }
        }
    }
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn run_one(source: &HttpSource, settings: &Settings, cli: &Cli, handle: &str) -> Result<Outcome> {
    let mut profile = Profile::construct(source, settings, handle, cli.linkedin)?;
    if profile.stage() == Stage::RateLimited {
        return Ok(Outcome::RateLimited {
            retry_after: profile.retry_after(),
        });
    }

    let svg = (!cli.no_chart).then(|| chart::render_pie(profile.languages()));
    let record = profile.serialize()?;
    let json = serde_json::to_string_pretty(&record)?;

    if cli.stdout {
        println!("{json}");
        return Ok(Outcome::Done);
    }

    let json_path = cli.out.join(format!("{handle}.json"));
    fs::write(&json_path, &json).with_context(|| format!("writing {}", json_path.display()))?;
    if let Some(svg) = &svg {
        let svg_path = cli.out.join(format!("{handle}.svg"));
        fs::write(&svg_path, svg).with_context(|| format!("writing {}", svg_path.display()))?;
    }
    println!(
        "{handle}: {} repos, {} languages -> {}",
        record.repos.len(),
        record.language_distribution.len(),
        json_path.display()
    );
    Ok(Outcome::Done)
}
