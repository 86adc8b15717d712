use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use synthsyx::sysex::hex;
use synthsyx::{
    read_sysex_file, AnyPatch, Channel, CodecConfig, Family, Packet, ParseOutcome, PatchLocation,
    Registry, Target,
};

/// Inspect, request and extract synthesizer sysex dumps
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// MIDI channel used in outgoing headers (1-16)
    #[arg(long, global = true, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=16))]
    channel: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every message in a sysex file
    List {
        /// Path to the sysex file
        sysex_file: PathBuf,
    },
    /// Print one parsed patch as JSON
    Show {
        /// Path to the sysex file
        sysex_file: PathBuf,

        /// Message number (0-indexed)
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
    /// Print the bytes that request a dump from a device
    Request {
        /// Device family, e.g. dx7 or matrix-1000
        family: Family,

        /// Bank (0-indexed)
        #[arg(long, default_value_t = 0)]
        bank: u8,

        /// Patch number (0-indexed); the edit buffer when left out
        #[arg(long)]
        number: Option<u8>,
    },
    /// Re-emit one recognized patch into its own sysex file
    Extract {
        /// Path to the sysex file
        sysex_file: PathBuf,

        /// Message number (0-indexed)
        #[arg(long)]
        index: usize,

        /// Output sysex file
        #[arg(long)]
        out: PathBuf,
    },
}

fn parse_message(registry: &Registry, messages: &[Vec<u8>], index: usize) -> Result<AnyPatch> {
    let message = messages.get(index).ok_or_else(|| {
        anyhow!(
            "index {} is out of range (file has {} messages)",
            index,
            messages.len()
        )
    })?;

    match registry.parse(message) {
        ParseOutcome::Succeeded(patch) => Ok(patch),
        ParseOutcome::Failed(err) => Err(err).context(format!("message {} did not parse", index)),
        ParseOutcome::Cancelled => bail!("message {} is not a patch dump", index),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = CodecConfig {
        channel: Channel::new(args.channel - 1)?,
    };
    let registry = Registry::new(config);

    match args.command {
        Commands::List { sysex_file } => {
            let messages = read_sysex_file(&sysex_file)?;
            for (i, message) in messages.iter().enumerate() {
                match registry.parse(message) {
                    ParseOutcome::Succeeded(patch) => {
                        let location = match (registry.codec(patch.family()), patch.location()) {
                            (Some(codec), Some(loc)) => codec.location_name(loc),
                            _ => "edit".to_string(),
                        };
                        println!("{}: {} [{}] {}", i, patch.family(), location, patch.name());
                    }
                    ParseOutcome::Failed(err) => println!("{}: error: {}", i, err),
                    ParseOutcome::Cancelled => {
                        println!("{}: unrecognized ({} bytes)", i, message.len())
                    }
                }
            }
        }
        Commands::Show { sysex_file, index } => {
            let messages = read_sysex_file(&sysex_file)?;
            let patch = parse_message(&registry, &messages, index)?;
            println!("{}", serde_json::to_string_pretty(&patch)?);
        }
        Commands::Request {
            family,
            bank,
            number,
        } => {
            let location = number.map(|n| PatchLocation::new(bank, n));
            let emission = registry.request_dump(family, location);
            if emission.packets().is_empty() {
                bail!("{} cannot be asked for that dump", family);
            }
            for packet in emission.packets() {
                match packet {
                    Packet::Sysex(bytes) => println!("{}", hex(bytes)),
                    Packet::Short(bytes) => println!("{}", hex(bytes)),
                    Packet::Program(bytes) => println!("{}", hex(bytes)),
                    Packet::Pause(d) => println!("pause {} ms", d.as_millis()),
                }
            }
        }
        Commands::Extract {
            sysex_file,
            index,
            out,
        } => {
            let messages = read_sysex_file(&sysex_file)?;
            let patch = parse_message(&registry, &messages, index)?;
            let target = Target::File(patch.location().unwrap_or_default());
            let bytes = registry.emit(&patch, target)?.to_bytes();
            std::fs::write(&out, &bytes)
                .with_context(|| format!("Failed to write '{}'", out.display()))?;
            log::info!(
                "wrote {} '{}' ({} bytes) to {}",
                patch.family(),
                patch.name(),
                bytes.len(),
                out.display()
            );
        }
    }

    Ok(())
}
