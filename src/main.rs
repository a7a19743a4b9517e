use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sitebind::capture::write_error_log;
use sitebind::record::load_records;
use sitebind::{CaptureConfig, Preview, RequestPolicy, SiteLayout, TemplateSources};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sitebind")]
#[command(version, about = "Bind data records into HTML templates and capture previews")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind records into a template and print the resulting markup
    Build {
        /// Template markup
        html: PathBuf,
        /// Stylesheet embedded into <head>
        css: PathBuf,
        /// Module script embedded at the end of <body>
        js: PathBuf,
        /// JSON array of {selector, value, link} records
        data: PathBuf,
    },

    /// Build a site directory (index.html, styles/styles.css, js/script.js)
    BuildSite {
        dir: PathBuf,

        /// Binding records; without them only style and script are embedded
        #[arg(long)]
        data: Option<PathBuf>,

        /// Write markup here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Capture mobile and desktop screenshots of a markup file
    Capture {
        markup: PathBuf,
        mobile: PathBuf,
        desktop: PathBuf,

        #[command(flatten)]
        opts: CaptureArgs,
    },

    /// Build a site directory and write its previews into <DIR>/previews
    Preview {
        dir: PathBuf,

        #[arg(long)]
        data: Option<PathBuf>,

        #[command(flatten)]
        opts: CaptureArgs,
    },
}

#[derive(Args)]
struct CaptureArgs {
    /// Chrome/Chromium executable
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Host whose requests are aborted (repeatable, replaces the default)
    #[arg(long = "block-host")]
    block_hosts: Vec<String>,

    /// Diagnostic file written when capture fails
    #[arg(long, default_value = "capture-error.log")]
    error_log: PathBuf,
}

impl CaptureArgs {
    fn config(&self) -> CaptureConfig {
        let defaults = CaptureConfig::default();
        CaptureConfig {
            chrome_path: self.chrome.clone(),
            navigation_timeout_ms: self.timeout_ms,
            capture_timeout_ms: self.timeout_ms.saturating_mul(2),
            policy: if self.block_hosts.is_empty() {
                RequestPolicy::default()
            } else {
                RequestPolicy::blocking(self.block_hosts.iter().cloned())
            },
            ..defaults
        }
    }
}

#[cfg(feature = "cdp")]
async fn capture_markup(config: CaptureConfig, markup: &Path, preview: &Preview) -> sitebind::Result<()> {
    sitebind::capture_preview::<sitebind::cdp::CdpRenderer>(config, markup, preview).await
}

#[cfg(feature = "cdp")]
async fn capture_site(layout: &SiteLayout, data: Option<&Path>, config: CaptureConfig) -> sitebind::Result<Preview> {
    sitebind::preview_site::<sitebind::cdp::CdpRenderer>(layout, data, config).await
}

#[cfg(not(feature = "cdp"))]
async fn capture_markup(_config: CaptureConfig, _markup: &Path, _preview: &Preview) -> sitebind::Result<()> {
    Err(sitebind::Error::ConfigError(
        "screenshot capture requires building with the `cdp` feature".into(),
    ))
}

#[cfg(not(feature = "cdp"))]
async fn capture_site(_layout: &SiteLayout, _data: Option<&Path>, _config: CaptureConfig) -> sitebind::Result<Preview> {
    Err(sitebind::Error::ConfigError(
        "screenshot capture requires building with the `cdp` feature".into(),
    ))
}

// Capture failures leave a diagnostic file behind before being reported.
fn logged<T>(res: sitebind::Result<T>, error_log: &Path) -> Result<T> {
    res.map_err(|e| {
        if let Err(log_err) = write_error_log(error_log, &e) {
            log::error!("Could not write {}: {}", error_log.display(), log_err);
        }
        anyhow::Error::new(e)
    })
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Build { html, css, js, data } => {
            let sources = TemplateSources::load(&html, &css, &js)?;
            let records = load_records(&data)?;
            let markup = sources.bind(&records)?;
            println!("{}", markup);
        }

        Commands::BuildSite { dir, data, output } => {
            let markup = SiteLayout::new(&dir).build(data.as_deref())?;
            match output {
                Some(path) => std::fs::write(&path, markup)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", markup),
            }
        }

        Commands::Capture {
            markup,
            mobile,
            desktop,
            opts,
        } => {
            let preview = Preview { mobile, desktop };
            logged(capture_markup(opts.config(), &markup, &preview).await, &opts.error_log)?;
        }

        Commands::Preview { dir, data, opts } => {
            let layout = SiteLayout::new(&dir);
            let preview = logged(
                capture_site(&layout, data.as_deref(), opts.config()).await,
                &opts.error_log,
            )?;
            println!("{}", preview.mobile.display());
            println!("{}", preview.desktop.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_module("headless_chrome", log::LevelFilter::Warn)
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sitebind: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
