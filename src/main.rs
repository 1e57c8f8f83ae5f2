use clap::{Parser, ValueEnum};
use dialoguer::Select;
use humansize::{DECIMAL, format_size};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;
use subscout::{
    DEFAULT_SERVER_URL, ProgressEvent, ProviderConfig, ProviderKind, RankedSubtitle, SearchOptions,
    SubsceneLanguages, SubscoutError, build_provider, download_subtitle_with,
    search_subtitles_with, subtitle_path,
};
use tracing_subscriber::EnvFilter;

/// Subtitle catalog to search
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProviderArg {
    /// Search by release name, then by title
    Subscene,
    /// Language and season aware search
    LanguageAware,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Subscene => ProviderKind::Subscene,
            ProviderArg::LanguageAware => ProviderKind::LanguageAware,
        }
    }
}

/// Find subtitles for a video file
#[derive(Debug, Parser)]
#[command(name = "subscout", version, about)]
struct Cli {
    /// The video file to find subtitles for
    video: PathBuf,

    /// Subtitle languages, as ISO 639-3 codes ("eng") or names ("English")
    #[arg(short, long = "language", required = true, num_args = 1..)]
    languages: Vec<String>,

    /// Catalog provider to use
    #[arg(long, value_enum, default_value = "subscene")]
    provider: ProviderArg,

    /// Also search by title with filters disabled (language aware provider)
    #[arg(long)]
    extended: bool,

    /// Download the best match next to the video
    #[arg(long)]
    download: bool,

    /// Pick the subtitle to download from the results
    #[arg(long)]
    interactive: bool,

    /// Do not use cached search results
    #[arg(long)]
    no_cache: bool,

    /// Base URL of the catalog server
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Started { video_path } => {
            println!("subscout: looking for subtitles of {}", video_path.display());
        }
        ProgressEvent::MediaDescribed { descriptor } => match (descriptor.season(), descriptor.episode_number()) {
            (Some(season), Some(episode)) => {
                println!(
                    "Identified episode S{:02}E{:02} of '{}'",
                    season,
                    episode,
                    descriptor.search_title()
                );
            }
            _ => println!("Identified movie '{}'", descriptor.search_title()),
        },
        ProgressEvent::Searching { provider } => {
            println!("Searching {}...", provider);
        }
        ProgressEvent::SubtitlesFound { count } => {
            println!("Found {} subtitle(s)\n", count);
        }
        ProgressEvent::Complete { .. } => {}
        ProgressEvent::Downloading { subtitle_id } => {
            println!("\nDownloading subtitle {}...", subtitle_id);
        }
        ProgressEvent::Downloaded { size } => {
            println!("Downloaded {}", format_size(size, DECIMAL));
        }
    }
}

/// One line describing a ranked subtitle
fn describe(entry: &RankedSubtitle) -> String {
    let matches: Vec<&str> = entry.matches.iter().copied().collect();
    format!(
        "[{}] {}{} ({})",
        entry.subtitle.language(),
        entry.subtitle.release_name(),
        if entry.subtitle.hearing_impaired() { " [HI]" } else { "" },
        matches.join(", ")
    )
}

fn select_subtitle(ranked: &[RankedSubtitle]) -> Result<Option<usize>, SubscoutError> {
    let items: Vec<String> = ranked.iter().map(describe).collect();

    Select::new()
        .with_prompt("Subtitle to download")
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(|e| SubscoutError::Io(io::Error::other(e.to_string())))
}

fn run(cli: Cli) -> Result<(), SubscoutError> {
    let resolver = SubsceneLanguages;
    let languages = cli
        .languages
        .iter()
        .map(|l| resolver.lookup(l))
        .collect::<Result<BTreeSet<_>, _>>()?;

    let options = SearchOptions {
        provider: cli.provider.into(),
        config: ProviderConfig {
            server_url: cli.server_url.clone(),
            extended_search: cli.extended,
            ..ProviderConfig::default()
        },
        cache_ttl: if cli.no_cache {
            None
        } else {
            SearchOptions::default().cache_ttl
        },
    };

    let mut provider = build_provider(&options)?;
    let mut ranked =
        search_subtitles_with(&mut provider, &cli.video, &languages, handle_progress_event)?;

    if ranked.is_empty() {
        println!("No subtitles found.");
        return Ok(());
    }

    println!("=== Results ===\n");
    for (index, entry) in ranked.iter().enumerate() {
        println!("{:>3}. {:>2} {}", index + 1, entry.score(), describe(entry));
    }

    if !cli.download && !cli.interactive {
        return Ok(());
    }

    let index = if cli.interactive {
        match select_subtitle(&ranked)? {
            Some(index) => index,
            None => return Ok(()),
        }
    } else {
        0
    };

    let entry = &mut ranked[index];
    download_subtitle_with(&mut provider, &mut entry.subtitle, handle_progress_event)?;

    let path = subtitle_path(&cli.video, entry.subtitle.language());
    let content = entry.subtitle.content().unwrap_or_default();
    fs::write(&path, content)?;
    println!("Saved {} ({})", path.display(), format_size(content.len(), DECIMAL));

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // RUST_LOG overrides the level picked by --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    if !cli.video.is_file() {
        eprintln!("Error: Video file does not exist: {}", cli.video.display());
        process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
}
