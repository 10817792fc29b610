use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use eat::config::{IndefiniteLength, TimeTag, UriDetection};
use eat::{Codec, Config, Eat};
use eyre::WrapErr;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Converts and checks Entity Attestation Token claims-sets.
#[derive(Debug, Parser)]
#[command(name = "eat", version, about)]
struct Cli {
    /// How text claims are told apart from URIs
    #[arg(long, global = true, env = "EAT_URI_DETECTION", default_value = "explicit")]
    uri_detection: UriMode,

    /// Accept indefinite length CBOR items
    #[arg(long, global = true, env = "EAT_ALLOW_INDEFINITE")]
    allow_indefinite: bool,

    /// Accept untagged CBOR integers as dates
    #[arg(long, global = true, env = "EAT_LENIENT_TIME")]
    lenient_time: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a claims-set and encode it in another format
    Convert {
        #[arg(long)]
        from: Format,

        #[arg(long)]
        to: Format,

        /// Read and write CBOR as hex
        #[arg(long)]
        hex: bool,

        /// Input file, stdin when missing
        input: Option<PathBuf>,
    },
    /// Decode and validate a claims-set
    Check {
        #[arg(long)]
        format: Format,

        /// Read CBOR as hex
        #[arg(long)]
        hex: bool,

        /// Input file, stdin when missing
        input: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Cbor,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UriMode {
    Colon,
    Explicit,
}

impl Cli {
    fn config(&self) -> Config {
        let uri_detection = match self.uri_detection {
            UriMode::Colon => UriDetection::ColonHeuristic,
            UriMode::Explicit => UriDetection::Explicit,
        };

        let indefinite_length = if self.allow_indefinite {
            IndefiniteLength::Allow
        } else {
            IndefiniteLength::Reject
        };

        let time_tag = if self.lenient_time {
            TimeTag::Optional
        } else {
            TimeTag::Required
        };

        Config::new()
            .with_uri_detection(uri_detection)
            .with_indefinite_length(indefinite_length)
            .with_time_tag(time_tag)
    }
}

fn read_input(input: Option<&Path>) -> eyre::Result<Vec<u8>> {
    let mut buf = Vec::new();

    match input {
        Some(path) => {
            std::fs::File::open(path)
                .and_then(|mut file| file.read_to_end(&mut buf))
                .wrap_err_with(|| format!("couldn't read {}", path.display()))?;
        }
        None => {
            std::io::stdin()
                .read_to_end(&mut buf)
                .wrap_err("couldn't read stdin")?;
        }
    }

    debug!(len = buf.len(), "input read");

    Ok(buf)
}

fn decode(data: &[u8], format: Format, hex: bool, config: &Config) -> eyre::Result<Eat> {
    let eat = match format {
        Format::Cbor if hex => {
            let text = std::str::from_utf8(data).wrap_err("hex input is not UTF-8")?;
            let bytes = hex::decode(text.trim()).wrap_err("couldn't decode hex input")?;

            Eat::from_cbor(&bytes, config)?
        }
        Format::Cbor => Eat::from_cbor(data, config)?,
        Format::Json => {
            let text = std::str::from_utf8(data).wrap_err("JSON input is not UTF-8")?;

            Eat::from_json(text, config)?
        }
    };

    Ok(eat)
}

fn convert(eat: &Eat, format: Format, hex: bool, config: &Config) -> eyre::Result<()> {
    let mut stdout = std::io::stdout().lock();

    match format {
        Format::Cbor if hex => {
            let data = eat.to_cbor(config)?;

            writeln!(stdout, "{}", hex::encode(data))?;
        }
        Format::Cbor => {
            let data = eat.to_cbor(config)?;

            stdout.write_all(&data)?;
        }
        Format::Json => {
            let json = eat.to_json(config)?;

            writeln!(stdout, "{json}")?;
        }
    }

    stdout.flush()?;

    Ok(())
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive("info".parse()?)
                .from_env_lossy(),
        )
        .try_init()?;

    color_eyre::install()?;

    let cli = Cli::parse();
    let config = cli.config();

    debug!(?config, "codec configuration");

    match &cli.command {
        Command::Convert {
            from,
            to,
            hex,
            input,
        } => {
            let data = read_input(input.as_deref())?;
            let eat = decode(&data, *from, *hex, &config).wrap_err("couldn't decode the claims")?;

            convert(&eat, *to, *hex, &config).wrap_err("couldn't encode the claims")?;
        }
        Command::Check { format, hex, input } => {
            let data = read_input(input.as_deref())?;
            let eat =
                decode(&data, *format, *hex, &config).wrap_err("couldn't decode the claims")?;

            eat.validate().wrap_err("invalid claims")?;

            info!(claims = ?eat.present_claims(), "claims are valid");
        }
    }

    Ok(())
}
