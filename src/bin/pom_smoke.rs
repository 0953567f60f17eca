//! Smoke runner
//!
//! Launches (or connects to) Chrome and runs the sample page flow against a base URL,
//! writing a JSON run report.

use anyhow::{Context, Result, bail};
use browser_pom::pages::SamplePage;
use browser_pom::{ChromeDriver, ConnectionOptions, LaunchOptions, RunMode, TestConfig, TestRunner, Utils};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pom-smoke")]
#[command(version)]
#[command(about = "Run the sample page flow against a web app", long_about = None)]
struct Cli {
    /// TOML test configuration (defaults apply when omitted)
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the application under test, overrides the configuration
    #[arg(long, value_name = "URL", env = "POM_BASE_URL")]
    base_url: Option<String>,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Use the interactive retry count instead of the run-mode one
    #[arg(long)]
    open_mode: bool,

    /// Report directory, overrides the configured one
    #[arg(long, value_name = "DIR")]
    report: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<TestConfig> {
    let mut config = match &cli.config {
        Some(path) => TestConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => TestConfig::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(dir) = &cli.report {
        config.reporter.report_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = Arc::new(load_config(&cli)?);

    eprintln!("pom-smoke v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Base URL: {}", if config.env.base_url.is_empty() { "(none)" } else { &config.env.base_url });

    let driver = match &cli.ws_endpoint {
        Some(endpoint) => {
            eprintln!("WebSocket endpoint: {}", endpoint);
            ChromeDriver::connect(ConnectionOptions::new(endpoint.clone()), &config)?
        }
        None => {
            let mut options = LaunchOptions::from_config(&config).headless(!cli.headed);
            if let Some(path) = &cli.chrome_path {
                eprintln!("Browser executable: {}", path.display());
                options = options.chrome_path(path.clone());
            }
            eprintln!("Browser mode: {}", if options.headless { "headless" } else { "headed" });
            ChromeDriver::launch(options, &config)?
        }
    };

    let mode = if cli.open_mode { RunMode::Open } else { RunMode::Run };
    let mut runner = TestRunner::new(Utils::new(driver, config.clone()), mode);

    runner.run("sample page navigates to the sample route", |utils| {
        let page = SamplePage::new(utils);
        utils.visit_page("/")?;
        page.click()?;
        page.verify_url()
    });

    let path = runner.report().write(&config.reporter.report_dir)?;
    let report = runner.into_report();
    eprintln!("{} passed, {} failed ({})", report.passed, report.failed, path.display());

    if !report.all_passed() {
        bail!("{} test(s) failed", report.failed);
    }
    Ok(())
}
