use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use neokat::apt::AptBackend;
use neokat::config::Config;
use neokat::console::Console;
use neokat::interrupt::install_handler;
use neokat::privilege::{ensure_root, is_root};
use neokat::scripts::refresh_permissions;
use neokat::shell::Shell;
use neokat::types::{ColorChoice, Mode, Palette};

/// Neo-Katoolin - install Kali Linux tools on Debian-derived systems
#[derive(Parser)]
#[command(name = "neokat")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tool list to read categories from
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Skip mode selection and open this mode's menu
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Do not re-run under sudo when not root
    #[arg(long)]
    no_sudo: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(manifest) = cli.manifest {
        config.manifest = manifest;
    }
    if cli.no_color {
        config.color = ColorChoice::Never;
    }
    debug!(?config, "configuration");

    if cli.no_sudo {
        if !is_root() {
            warn!("not running as root; package operations will fail");
        }
    } else {
        ensure_root()?;
    }
    install_handler()?;

    refresh_permissions(&config.script_dirs());

    let palette = Palette::detect(config.color);
    let backend = AptBackend::system(config.fallback, config.quiet_installs);
    let console = Console::stdio(palette);

    Shell::new(console, &config, backend).run(cli.mode)
}
