//! nether-rig - Nethercore rig interchange tool
//!
//! Inspects rig descriptions and converts bone layer strings to and from
//! layer bitfields.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use nether_rig::config::{self, Settings};
use nether_rig::{
    ImportSession, armature, decode_layers, encode_layers, layers::LayerLabels, manifest,
};

#[derive(Parser)]
#[command(name = "nether-rig")]
#[command(about = "Nethercore rig interchange tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert between layer strings and bitfields
    Layers {
        #[command(subcommand)]
        action: LayerAction,
    },

    /// Print the bone hierarchy of a rig file
    Inspect {
        /// Path to the rig description (TOML)
        rig: PathBuf,

        /// Settings file with an [import] section
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Only deforming bones can be roots (overrides settings)
        #[arg(long)]
        deform_only: bool,
    },

    /// Validate a rig file without printing it
    Check {
        /// Path to the rig description (TOML)
        rig: PathBuf,
    },
}

#[derive(Subcommand)]
enum LayerAction {
    /// Print the layer indices set in a bitfield
    Encode {
        /// Bitfield, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_bitfield)]
        bitfield: u32,
    },

    /// Turn layer numbers and labels into a bitfield
    Decode {
        /// Layer numbers and/or labels
        #[arg(required = true)]
        tokens: Vec<String>,
    },
}

fn parse_bitfield(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid bitfield '{}': {}", value, e))
}

fn main() -> Result<()> {
    // Initialize logging (stderr, so command output stays clean)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Layers { action } => match action {
            LayerAction::Encode { bitfield } => {
                println!("{}", encode_layers(bitfield));
            }
            LayerAction::Decode { tokens } => {
                let mut labels = LayerLabels::new();
                let bitfield = decode_layers(&tokens.join(" "), &mut labels);
                println!("{} ({:#010x}): {}", bitfield, bitfield, encode_layers(bitfield));
                for (index, label) in labels.labels().iter().enumerate() {
                    println!("  {} = {}", label, index.min(31));
                }
            }
        },

        Commands::Inspect {
            rig,
            settings,
            deform_only,
        } => {
            let mut settings = match settings {
                Some(path) => config::load_settings(&path)?,
                None => Settings::default(),
            };
            settings.import.deform_bones_only |= deform_only;

            let manifest = manifest::load_manifest(&rig)?;
            let mut session = ImportSession::new(settings.import);
            let arm = manifest.build(&mut session)?;
            let extensions = session.extensions.get_extension_map(arm.name());

            println!("Armature '{}': {} bones", arm.name(), arm.len());
            for (id, bone) in arm.bones() {
                let chain = extensions
                    .and_then(|map| map.get(bone.name.as_str()))
                    .map(|ext| ext.chain_length())
                    .unwrap_or(0);
                println!(
                    "  {:<24} {:<4} {:<4} chain={} layers={}",
                    bone.name,
                    if session.is_root_bone(&arm, id) { "root" } else { "-" },
                    if armature::is_leaf_bone(&arm, id) { "leaf" } else { "-" },
                    chain,
                    encode_layers(bone.layers)
                );
            }
        }

        Commands::Check { rig } => {
            tracing::info!("Checking rig {:?}", rig);
            let manifest = manifest::load_manifest(&rig)?;
            manifest::validate(&manifest)?;
            tracing::info!("Rig is valid!");
        }
    }

    Ok(())
}
