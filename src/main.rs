use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use rootcause::prelude::*;

use modelimport::data::container::{self, Container};
use modelimport::data::model_header::parse_model_header;
use modelimport::import::options::ImportMetadata;

/// Inspect imported model artifacts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print the material slots and LOD table of model artifacts
    #[clap(short = 'H', long)]
    header: bool,

    /// Print the stored import metadata
    #[clap(short, long)]
    metadata: bool,

    /// Artifact file(s)
    files: Vec<PathBuf>,
}

fn print_container(path: &Path, container: &Container, args: &Args) -> Result<(), Report> {
    println!("{}", path.display());
    println!(
        "  type: {} (version {})",
        container.header.type_name, container.header.serialized_version
    );
    for (index, bytes) in &container.chunks {
        println!("  chunk {index:>2}: {} bytes", bytes.len());
    }

    if args.metadata {
        match serde_json::from_slice::<ImportMetadata>(&container.header.metadata) {
            Ok(metadata) => println!(
                "{}",
                serde_json::to_string_pretty(&metadata).context("Failed to format metadata")?
            ),
            Err(e) => println!("  metadata: unreadable ({e})"),
        }
    }

    let has_slots = container
        .header
        .type_name
        .known()
        .is_some_and(|ty| ty.has_material_slots());
    if args.header && has_slots {
        let chunk = container
            .chunks
            .iter()
            .find(|(index, _)| *index == 0)
            .map(|(_, bytes)| bytes.as_slice())
            .ok_or_else(|| rootcause::report!("Model artifact has no header chunk"))?;
        let header = parse_model_header(chunk).context("Failed to parse model header")?;
        println!("  min screen size: {}", header.min_screen_size);
        for (index, slot) in header.materials.iter().enumerate() {
            println!(
                "  material {index}: '{}' -> {} ({:?})",
                slot.name, slot.material.0, slot.shadows_mode
            );
        }
        for (index, lod) in header.lods.iter().enumerate() {
            println!("  LOD {index} (screen size {}):", lod.screen_size);
            for mesh in &lod.meshes {
                println!(
                    "    '{}' slot {} verts {} tris {}",
                    mesh.name, mesh.material_slot_index, mesh.vertex_count, mesh.triangle_count
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Report> {
    let args = Args::parse();

    for path in &args.files {
        let bytes =
            fs::read(path).context_with(|| format!("Could not read {}", path.display()))?;
        let container = container::parse(&bytes)
            .context_with(|| format!("Failed to parse artifact {}", path.display()))?;
        print_container(path, &container, &args)?;
    }

    Ok(())
}
