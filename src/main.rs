use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use nodedev::{
    init_tracing, list_installed, remove, ConfigOverrides, DevResult, InstallConfig,
    InstallRequest, Installer, RemoveOutcome, TargetPlatform,
};

#[derive(Parser, Debug)]
#[command(name = "nodedev")]
#[command(about = "Install node development files for a node version", long_about = None)]
struct Cli {
    /// Cache root for installed dev files
    #[arg(long, global = true, env = "NODEDEV_DEVDIR")]
    devdir: Option<PathBuf>,
    /// Mirror serving v<version>/node-v<version>.tar.gz
    #[arg(long, global = true, env = "NODEDEV_DIST_URL")]
    dist_url: Option<String>,
    /// Default version when none is given
    #[arg(long, global = true, env = "NODEDEV_TARGET")]
    target: Option<String>,
    /// win32 or unix; defaults to the host
    #[arg(long, global = true, value_parser = parse_platform)]
    platform: Option<TargetPlatform>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install the dev files for VERSION (or the target / running node)
    Install {
        version: Option<String>,
        /// Only install when missing or outdated
        #[arg(long)]
        ensure: bool,
        #[arg(long)]
        proxy: Option<String>,
    },
    /// Remove the dev files for VERSION
    Remove { version: String },
    /// List installed versions
    List,
}

fn parse_platform(value: &str) -> Result<TargetPlatform, String> {
    TargetPlatform::parse(value).ok_or_else(|| format!("unknown platform: {value}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("nodedev: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> DevResult<()> {
    let config = InstallConfig::load(ConfigOverrides {
        dev_dir: cli.devdir,
        dist_url: cli.dist_url,
        target: cli.target,
        platform: cli.platform,
    })?;

    match cli.command {
        Commands::Install {
            version,
            ensure,
            proxy,
        } => {
            let outcome = Installer::new(config)
                .install(&InstallRequest {
                    version,
                    ensure,
                    proxy,
                })
                .await?;
            println!("{}", outcome.version);
        }
        Commands::Remove { version } => match remove(&config, &version).await? {
            RemoveOutcome::Removed => println!("removed {version}"),
            RemoveOutcome::NotInstalled => println!("{version} is not installed"),
        },
        Commands::List => {
            let installed = list_installed(&config).await?;
            if installed.is_empty() {
                println!("No node development files installed in {}", config.dev_dir.display());
            }
            for entry in installed {
                println!("{} (installVersion {})", entry.version, entry.install_format_version);
            }
        }
    }

    Ok(())
}
