use catalog_scraper::auth::Credentials;
use catalog_scraper::config::Settings;
use catalog_scraper::logging::FacadeLogger;
use catalog_scraper::runner::{self, RunOptions};
use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sign in to the product dashboard, walk the menu to the catalog table and
/// harvest every row into a JSON export.
#[derive(Parser, Debug)]
#[command(name = "catalog_scraper", version)]
struct Cli {
    /// Application base URL
    #[arg(long, default_value = "https://hiring.idenhq.com/")]
    base_url: String,

    /// Login email
    #[arg(long, env = "EMAIL")]
    email: String,

    /// Login password
    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    password: String,

    /// Session storage file
    #[arg(long, default_value = "session.json")]
    session_file: PathBuf,

    /// Output JSON file
    #[arg(long, default_value = "products.json")]
    output_file: PathBuf,

    /// Run the browser headed (visible window)
    #[arg(long)]
    headed: bool,

    /// Per-operation timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn init_logging() {
    if Path::new("log4rs.yml").exists()
        && log4rs::init_file("log4rs.yml", Default::default()).is_ok()
    {
        return;
    }

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "[{d(%Y-%m-%d %H:%M:%S)}] [{h({l})}] [{t}] {m}{n}",
        )))
        .build();
    let config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .expect("console logging config");
    let _ = log4rs::init_config(config);
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let settings = Settings::load();
    let logger = FacadeLogger;

    let options = RunOptions {
        base_url: cli.base_url.trim_end_matches('/').to_string(),
        credentials: Credentials {
            email: cli.email,
            password: cli.password,
        },
        session_file: cli.session_file,
        output_file: cli.output_file,
        headless: !cli.headed,
        timeout: Duration::from_secs(cli.timeout_secs),
    };

    match runner::run(&options, &settings, &logger) {
        Ok(summary) => {
            log::info!(
                "run complete: {} rows collected{}{}",
                summary.rows_collected,
                if summary.reused_session {
                    " (session reused)"
                } else {
                    ""
                },
                if summary.exported {
                    ""
                } else {
                    ", export failed"
                }
            );
        }
        Err(e) => {
            log::error!("run aborted: {e}");
            std::process::exit(1);
        }
    }
}
