use clap::{Parser, Subcommand};
use img_compress::imaging::{FitMode, RustBackend};
use img_compress::{CompressRequest, CompressResult, compress, config, data_url};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "img-compress")]
#[command(about = "Resize and re-encode an image into a data URL")]
#[command(long_about = "\
Resize and re-encode an image into a data URL

The source can be a data URL, an http(s):// or file:// URL, or a path. EXIF
rotations (orientations 3, 6 and 8) are corrected; mirrored orientations are
drawn as stored.

Fit modes:
  scale   Keep the aspect ratio, fit inside --width/--height, never upscale.
          A size of 0 (the default) leaves that axis unconstrained.
  fill    Stretch to exactly --width x --height.

Without --output the result is printed as JSON: {\"width\", \"height\", \"img\"}.

Use --log-level debug to trace each step.")]
#[command(version)]
struct Cli {
    /// Config file with defaults for quality, type, fit and the resize filter
    #[arg(long, default_value = "img-compress.toml", global = true)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct CompressArgs {
    /// Image source: data URL, http(s):// or file:// URL, or path
    source: String,

    /// Target width in pixels (0 = unconstrained)
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    width: i64,

    /// Target height in pixels (0 = unconstrained)
    #[arg(short = 'H', long, default_value_t = 0, allow_negative_numbers = true)]
    height: i64,

    /// Encoding quality, 0.0–1.0 (jpg/jpeg only)
    #[arg(short, long)]
    quality: Option<f32>,

    /// scale or fill
    #[arg(long)]
    fit: Option<FitMode>,

    /// Output type: jpg, jpeg or png
    #[arg(short = 't', long = "type")]
    format: Option<String>,

    /// Write the encoded image here instead of printing JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Compress one image
    Compress(CompressArgs),
    /// Print a stock config file with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Command::Compress(args) => {
            let config = config::load_config(&cli.config)?;
            let backend = RustBackend::with_filter(config.render.filter.into());
            let request = build_request(&args, &config.defaults);

            let result = compress(&backend, &request).await?;
            match &args.output {
                Some(path) => {
                    write_output(&result, path)?;
                    println!(
                        "{}x{} → {}",
                        result.width,
                        result.height,
                        path.display()
                    );
                }
                None => println!("{}", serde_json::to_string(&result)?),
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays parseable.
fn init_tracing(log_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Fill options left off the command line from the config file.
fn build_request(args: &CompressArgs, defaults: &config::DefaultsConfig) -> CompressRequest {
    CompressRequest {
        img: args.source.clone(),
        width: args.width,
        height: args.height,
        quality: Some(args.quality.unwrap_or(defaults.quality)),
        fit: Some(args.fit.unwrap_or(defaults.fit)),
        format: Some(
            args.format
                .clone()
                .unwrap_or_else(|| defaults.format.to_string()),
        ),
    }
}

/// Decode the result's data URL and write the raw image bytes.
fn write_output(result: &CompressResult, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let url = data_url::parse(&result.img)?;
    std::fs::write(path, url.bytes)?;
    Ok(())
}
