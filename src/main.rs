use clap::{Parser, Subcommand};
use media_library::contract::{FULL_SIZE, Image};
use media_library::external::ExternalImage;
use media_library::generate::{self, GenerateConfig};
use media_library::imaging::RustBackend;
use media_library::library::Library;
use media_library::uploads::Uploads;
use media_library::{config, output, render};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "media-library")]
#[command(about = "Uploads-directory media library with WordPress-style image sizes")]
#[command(long_about = "\
Uploads-directory media library with WordPress-style image sizes

The uploads directory is the data source. Every image in it is an attachment;
files named like `dawn-300x225.jpg` next to `dawn.jpg` are its size variants.

Library layout:

  ./
  ├── config.toml                  # Library config (optional)
  ├── library.json                 # Manifest written by `scan`/`generate`
  └── uploads/
      └── 2024/05/
          ├── dawn.jpg             # Attachment
          ├── dawn.txt             # Caption sidecar
          ├── dawn.alt.txt         # Alt text sidecar
          ├── dawn-150x150.jpg     # thumbnail
          └── dawn-300x225.jpg     # medium

Run 'media-library gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Library root (holds config.toml and the uploads directory)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Manifest path [default: <root>/library.json]
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the uploads directory into a manifest
    Scan,
    /// Generate missing image sizes for every attachment
    Generate,
    /// Show everything known about one attachment
    Show {
        /// Uploads-relative file (2024/05/dawn.jpg) or site path (/uploads/...)
        file: String,
        /// Size to resolve
        #[arg(long, default_value = FULL_SIZE)]
        size: String,
        /// Also print the <img> markup
        #[arg(long)]
        html: bool,
    },
    /// Print the source URL of an attachment or external image
    Src {
        /// Uploads-relative file, site path, or absolute URL
        target: String,
        /// Size to resolve
        #[arg(long, default_value = FULL_SIZE)]
        size: String,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let manifest = cli
        .manifest
        .clone()
        .unwrap_or_else(|| cli.root.join("library.json"));

    match cli.command {
        Command::Scan => {
            let config = config::load_config(&cli.root)?;
            let uploads = Uploads::from_config(&cli.root, &config.uploads);
            let library = Library::scan(uploads, &config.size_registry()?, &RustBackend::new())?;
            library.save(&manifest)?;
            output::print_scan_output(&library);
        }
        Command::Generate => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            let registry = config.size_registry()?;
            let mut library = open_library(&cli.root, &manifest, &config)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_generate_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = generate::generate(
                &mut library,
                &registry,
                &RustBackend::new(),
                &GenerateConfig::from_library_config(&config),
                Some(tx),
            );
            printer.join().ok();
            let stats = result?;

            library.save(&manifest)?;
            println!("{}", output::format_generate_summary(&stats));
        }
        Command::Show { file, size, html } => {
            let config = config::load_config(&cli.root)?;
            let library = open_library(&cli.root, &manifest, &config)?;
            let attachment = library
                .get(&file)
                .ok_or_else(|| format!("No attachment for {file}"))?;
            output::print_image_details(&attachment, &size);
            if html {
                println!("{}", render::attachment_img_tag(&attachment, &size).into_string());
            }
        }
        Command::Src { target, size } => {
            let src = if target.contains("://") {
                ExternalImage::from_url(target).src(&size)
            } else {
                let config = config::load_config(&cli.root)?;
                let library = open_library(&cli.root, &manifest, &config)?;
                library
                    .get(&target)
                    .ok_or_else(|| format!("No attachment for {target}"))?
                    .src(&size)
            };
            match src {
                Some(src) => println!("{}", src),
                None => tracing::warn!(size = %size, "size not available"),
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the manifest if there is one, otherwise scan the uploads directory.
fn open_library(
    root: &Path,
    manifest: &Path,
    config: &config::LibraryConfig,
) -> Result<Library, Box<dyn std::error::Error>> {
    let uploads = Uploads::from_config(root, &config.uploads);
    if manifest.exists() {
        Ok(Library::load(manifest, uploads)?)
    } else {
        tracing::debug!(manifest = %manifest.display(), "no manifest, scanning");
        Ok(Library::scan(
            uploads,
            &config.size_registry()?,
            &RustBackend::new(),
        )?)
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
