use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use image_vault::config::VaultConfig;
use image_vault::model::{self, ImageFormat, QualityTier};
use image_vault::store::FileBlobStore;
use image_vault::ImageVault;

/// Quota-aware image vault:
/// - uploads are transcoded to a quality tier before storage
/// - conversions re-encode between JPEG/PNG/WebP/GIF
/// - the JSON library never grows past the storage ceiling
#[derive(Parser, Debug)]
#[command(name = "vault")]
#[command(about = "🖼  Store, transcode and convert images under a storage quota")]
#[command(long_about = "Store, transcode and convert images under a storage quota.
Uploads are re-encoded to the requested quality tier and every admission is
measured against the storage ceiling before anything is written.")]
struct Args {
    /// Path of the JSON library file
    #[arg(
        short,
        long,
        default_value = "vault.json",
        help = "Library file to read and write"
    )]
    library: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload an image at a quality tier
    Upload {
        /// Image file to upload
        path: PathBuf,

        /// Quality tier
        #[arg(short, long, default_value = "optimized",
              help = "Quality tier: optimized (85%), medium (60%), low (30%), original (as-is)")]
        quality: String,
    },

    /// Convert a stored image to another format
    Convert {
        /// Record id to convert
        id: String,

        /// Target format
        #[arg(short, long, help = "Target format: jpeg, png, webp, gif")]
        format: String,
    },

    /// List all stored images
    List,

    /// Show one record, optionally writing its pixels to a file
    Show {
        /// Record id to show
        id: String,

        /// Write the decoded image bytes to this path
        #[arg(short, long, help = "Write the decoded image to a file")]
        output: Option<PathBuf>,
    },

    /// Delete a stored image
    Delete {
        /// Record id to delete
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = VaultConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    let vault = ImageVault::new(config, FileBlobStore::new(&args.library));
    if let Err(e) = vault.init().await {
        eprintln!("Warning: could not load {}: {e}", args.library.display());
        eprintln!("Starting with an empty library.");
    }

    match args.command {
        Command::Upload { path, quality } => {
            let tier = parse_quality(&quality)?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let mime = guess_mime(&path);

            let record = vault.upload(&bytes, &name, mime, tier).await?;
            println!(
                "Stored {} as {} ({} → {}, ratio {:.2})",
                record.name,
                record.id,
                model::format_file_size(record.original_size),
                model::format_file_size(record.stored_size),
                record.compression_ratio,
            );
        }
        Command::Convert { id, format } => {
            let target = parse_format(&format)?;
            let record = vault.convert_record(&id, target).await?;
            println!(
                "Converted to {} as {} ({})",
                record.name,
                record.id,
                model::format_file_size(record.stored_size),
            );
        }
        Command::List => {
            let records = vault.list().await;
            if records.is_empty() {
                println!("Library is empty.");
            } else {
                for r in &records {
                    println!(
                        "{}  {}  {:<9}  {:>10}  {}",
                        r.id,
                        r.created_at.format("%Y-%m-%d %H:%M:%S"),
                        r.quality_tier.to_string(),
                        model::format_file_size(r.stored_size),
                        r.name,
                    );
                }
                println!("{} image(s)", records.len());
            }
        }
        Command::Show { id, output } => {
            let record = vault
                .get_by_id(&id)
                .await
                .with_context(|| format!("no record with id {id}"))?;
            println!("id:       {}", record.id);
            println!("name:     {}", record.name);
            println!("type:     {}", record.mime_type);
            println!("created:  {}", record.created_at);
            println!("tier:     {}", record.quality_tier);
            println!(
                "size:     {} (from {}, ratio {:.2})",
                model::format_file_size(record.stored_size),
                model::format_file_size(record.original_size),
                record.compression_ratio,
            );
            if let Some(path) = output {
                let bytes = model::decode_data_uri(&record.encoded_data)
                    .context("stored payload is not valid base64")?;
                tokio::fs::write(&path, &bytes)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("wrote {} bytes to {}", bytes.len(), path.display());
            }
        }
        Command::Delete { id } => {
            vault.delete(&id).await?;
            println!("Deleted {id} (no-op if the id was absent).");
        }
    }

    Ok(())
}

/// Parse a quality tier name
fn parse_quality(quality: &str) -> Result<QualityTier> {
    match quality.to_lowercase().as_str() {
        "optimized" => Ok(QualityTier::Optimized),
        "medium" => Ok(QualityTier::Medium),
        "low" => Ok(QualityTier::Low),
        "original" => Ok(QualityTier::Original),
        _ => Err(anyhow::anyhow!(
            "Invalid quality tier: {}. Use: optimized, medium, low, original",
            quality
        )),
    }
}

/// Parse a target format name
fn parse_format(format: &str) -> Result<ImageFormat> {
    match format.to_lowercase().as_str() {
        "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        "webp" => Ok(ImageFormat::Webp),
        "gif" => Ok(ImageFormat::Gif),
        _ => Err(anyhow::anyhow!(
            "Invalid format: {}. Use: jpeg, png, webp, gif",
            format
        )),
    }
}

/// Guess a MIME type from the file extension, defaulting to JPEG.
fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}
