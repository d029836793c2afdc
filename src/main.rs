use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use warta::config::{self, Site};
use warta::gallery::{self, BuildMode};
use warta::pipeline::{self, Pipeline, RecordsReport};
use warta::{check, output};

/// Shared flag for batch commands.
#[derive(clap::Args, Clone)]
struct ModeArgs {
    /// Abort at the first invalid record or gallery category
    #[arg(long)]
    fail_fast: bool,
}

impl ModeArgs {
    fn mode(&self) -> BuildMode {
        if self.fail_fast {
            BuildMode::FailFast
        } else {
            BuildMode::Report
        }
    }
}

#[derive(Parser)]
#[command(name = "warta")]
#[command(about = "Content compiler for a static organization website")]
#[command(long_about = "\
Content compiler for a static organization website

News records are JSON files; gallery photos live in one folder per category.
warta renders them into pages, share banners, and the JSON indices the site's
scripts read.

Site structure (stock paths, all configurable in warta.toml):

  site/
  ├── warta.toml                         # Site config (optional)
  ├── berita/
  │   ├── data/contoh-acara.json         # News record → berita/contoh-acara/index.html
  │   └── news-index.json                # Generated, newest first
  ├── assets/
  │   ├── img/berita/contoh-acara.png    # Generated share banner
  │   ├── img/galeri/kegiatan/
  │   │   ├── kegiatan-01.jpg            # <category>-NN.<jpg|jpeg|png|webp>
  │   │   └── kegiatan-02.jpg
  │   └── data/pages-index.json          # Generated page and document index
  └── galeri/                            # Generated gallery pages

Logging goes to stderr; set RUST_LOG=info for per-file detail.

Run 'warta gen-config' to generate a documented warta.toml.")]
#[command(version)]
struct Cli {
    /// Site root (where warta.toml lives)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every phase: records → galleries → indices
    Build(ModeArgs),
    /// Render the given record files, then refresh the indices
    News {
        /// Record JSON files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Skip the index rebuild after rendering
        #[arg(long)]
        no_index: bool,
    },
    /// Render gallery pages and the gallery manifest
    Gallery(ModeArgs),
    /// Rebuild the news and pages indices
    Index,
    /// Validate the generated site
    Check,
    /// Print a stock warta.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let site = Site::load(&cli.root)?;
    let root = site.output_root();

    match cli.command {
        Command::Build(args) => {
            let pipeline = Pipeline::new(site)?;
            let report = pipeline.build_all(args.mode())?;
            output::print_build(&report, &root);
            Ok(exit_code(report.failures()))
        }
        Command::News { files, no_index } => {
            let pipeline = Pipeline::new(site)?;
            let mut report = RecordsReport::default();
            for file in &files {
                report.rendered.push(pipeline.render_record(file)?);
            }
            output::print_records(&report, &root);
            if !no_index {
                if let Some(indices) = pipeline.refresh_indices() {
                    output::print_indices(&indices);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Gallery(args) => {
            let report = gallery::build_galleries(&site, args.mode())?;
            output::print_galleries(&report);
            Ok(exit_code(report.blocked.len()))
        }
        Command::Index => {
            output::print_indices(&pipeline::rebuild_indices(&site)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => match check::run_checks(&site) {
            Ok(report) => {
                output::print_check_report(&report);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                output::print_check_failure(&e);
                Ok(ExitCode::FAILURE)
            }
        },
        Command::GenConfig => Ok(ExitCode::SUCCESS),
    }
}

fn exit_code(failures: usize) -> ExitCode {
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
