// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pakr::catalog::{CatalogClient, DEFAULT_CATALOG_URL};
use pakr::installer::Progress;
use pakr::layout::Layout;
use std::path::PathBuf;
use std::process::Command;
use tracing::info;

#[derive(Parser)]
#[command(name = "pakr")]
#[command(author, version, about = "Small per-user package manager driven by a remote JSON catalog", long_about = None)]
struct Cli {
    /// Root directory (default: ~/.pakr)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Catalog URL
    #[arg(long, global = true, default_value = DEFAULT_CATALOG_URL)]
    catalog_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the pakr directory tree and registry
    Init,
    /// Install a package from the catalog
    Install {
        /// Package name as listed in the catalog
        package_name: String,
    },
    /// Uninstall an installed package
    Uninstall {
        /// Package name to uninstall
        package_name: String,
    },
    /// Run an installed package
    Run {
        /// Package name to run
        package_name: String,
    },
    /// List installed packages
    List,
    /// Search the catalog by name substring
    Search {
        /// Substring to match against package names
        query: String,
    },
    /// Open the pakr root directory in the file manager
    Open,
}

/// Download progress rendered as an indicatif bar, created lazily on the
/// first progress event (only then is the content length known)
#[derive(Default)]
struct DownloadBar {
    bar: Option<ProgressBar>,
}

impl Progress for DownloadBar {
    fn update(&mut self, transferred: u64, total: Option<u64>) {
        let bar = self.bar.get_or_insert_with(|| match total {
            Some(len) => {
                let pb = ProgressBar::new(len);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("Downloading [{bar:30}] {bytes}/{total_bytes}")
                        .unwrap()
                        .progress_chars("=> "),
                );
                pb
            }
            None => ProgressBar::new_spinner().with_message("Downloading"),
        });
        bar.set_position(transferred);
    }
}

impl DownloadBar {
    fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

fn resolve_layout(root: Option<PathBuf>) -> Result<Layout> {
    Ok(match root {
        Some(root) => Layout::new(root),
        None => Layout::from_home()?,
    })
}

/// Open `path` with the platform's file manager
fn open_in_file_manager(path: &std::path::Path) -> Result<()> {
    #[cfg(target_os = "windows")]
    let program = "explorer";
    #[cfg(target_os = "macos")]
    let program = "open";
    #[cfg(all(unix, not(target_os = "macos")))]
    let program = "xdg-open";

    let status = Command::new(program).arg(path).status()?;
    if !status.success() {
        anyhow::bail!("{} exited with {}", program, status);
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let layout = resolve_layout(cli.root)?;

    match cli.command {
        Some(Commands::Init) => {
            info!("Initializing pakr at {}", layout.root().display());
            layout.init()?;
            println!("Initialized pakr at {}", layout.root().display());
            Ok(())
        }
        Some(Commands::Install { package_name }) => {
            let client = CatalogClient::new(&cli.catalog_url)?;
            let mut bar = DownloadBar::default();

            let record = pakr::ops::install(&client, &layout, &package_name, &mut bar)?;
            bar.finish();

            let kind = record
                .install
                .map(|k| format!("{:?}", k).to_lowercase())
                .unwrap_or_default();
            println!("Package '{}' installed successfully ({})", package_name, kind);
            Ok(())
        }
        Some(Commands::Uninstall { package_name }) => {
            pakr::ops::uninstall(&layout, &package_name)?;
            println!("Package '{}' uninstalled successfully", package_name);
            Ok(())
        }
        Some(Commands::Run { package_name }) => {
            let status = pakr::ops::run(&layout, &package_name)?;
            if !status.success() {
                anyhow::bail!("'{}' exited with {}", package_name, status);
            }
            Ok(())
        }
        Some(Commands::List) => {
            let records = pakr::ops::list_installed(&layout)?;
            if records.is_empty() {
                println!("No packages installed.");
            } else {
                for record in &records {
                    println!("{}", record.name);
                }
                println!("\nTotal: {} package(s)", records.len());
            }
            Ok(())
        }
        Some(Commands::Search { query }) => {
            let client = CatalogClient::new(&cli.catalog_url)?;
            let catalog = client.fetch_catalog()?;
            let hits = catalog.search(&query);

            if hits.is_empty() {
                println!("No packages matching '{}'.", query);
            } else {
                println!(
                    "{:<16} {:<20} {:<10} {:<16} {}",
                    "Name", "Title", "Version", "Author", "Description"
                );
                for pkg in hits {
                    println!(
                        "{:<16} {:<20} {:<10} {:<16} {}",
                        pkg.name,
                        pkg.title.as_deref().unwrap_or("-"),
                        pkg.version.as_deref().unwrap_or("-"),
                        pkg.author.as_deref().unwrap_or("-"),
                        pkg.description.as_deref().unwrap_or("-"),
                    );
                }
            }
            Ok(())
        }
        Some(Commands::Open) => {
            open_in_file_manager(layout.root())?;
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("pakr v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'pakr --help' for usage information");
            Ok(())
        }
    }
}
