use clap::{Args, Parser, Subcommand};
use shadowed::assets::{AssetsError, AssetsOptions, AssetsReader};
use shadowed::codec::hex_dump;
use shadowed::music::{self, MAIN_DATA};
use shadowed::payload::{ResourceManager, RESOURCE_MANAGER_TYPE_ID};
use shadowed::rebuild::{rebuild_file, CustomObject, Replacement};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "shadowed", version, about = "Inspect and patch serialized game asset containers")]
struct Cli {
    #[command(flatten)]
    versions: VersionArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct VersionArgs {
    /// Lowest accepted container version
    #[arg(long, global = true, default_value = "9")]
    min_version: u32,
    /// Highest accepted container version
    #[arg(long, global = true, default_value = "13")]
    max_version: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the container header
    Header {
        file: PathBuf,
    },
    /// Print the metadata table as JSON
    Meta {
        file: PathBuf,
        /// Only list objects of this type
        #[arg(short, long)]
        type_id: Option<u32>,
    },
    /// Hex dump object payloads
    Hex {
        file: PathBuf,
        #[arg(short, long)]
        type_id: Option<u32>,
    },
    /// Find objects whose payload contains a byte string
    Grep {
        file:   PathBuf,
        needle: String,
    },
    /// Write every payload to <out_dir>/<type id>/<object id>
    Unpack {
        file:    PathBuf,
        out_dir: PathBuf,
    },
    /// Replace one object's payload
    Replace {
        file:   PathBuf,
        output: PathBuf,
        #[arg(long)]
        id: u32,
        /// File holding the new payload
        #[arg(long)]
        data: PathBuf,
        /// Defaults to the replaced object's type id
        #[arg(long)]
        type_id: Option<u32>,
        /// Defaults to the replaced object's class id
        #[arg(long)]
        class_id: Option<u16>,
    },
    /// Append a new object
    Add {
        file:   PathBuf,
        output: PathBuf,
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        type_id: u32,
        #[arg(long)]
        class_id: u16,
    },
    /// List music tracks of a game data directory
    MusicList {
        data_root: PathBuf,
    },
    /// Extract music tracks as .ogg files
    MusicUnpack {
        data_root: PathBuf,
        out_dir:   PathBuf,
    },
    /// Replace the game's music with the .ogg files in a directory
    MusicPack {
        data_root:  PathBuf,
        music_dir:  PathBuf,
        output_dir: PathBuf,
    },
    /// Print a music library file as JSON
    MusicLib {
        file: PathBuf,
    },
    /// Print the resource name table from mainData
    Resources {
        data_root: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli  = Cli::parse();
    let opts = AssetsOptions { versions: cli.versions.min_version..=cli.versions.max_version };

    match cli.command {

        // ── Header ───────────────────────────────────────────────────────────
        Commands::Header { file } => {
            let assets = AssetsReader::open_with(&file, &opts)?;
            let h = assets.header();
            println!("── Assets container ─────────────────────────────────────");
            println!("  Path           {}", file.display());
            println!("  Version        {}", h.version);
            println!("  Byte order     {:?}", h.endian());
            println!("  Metadata size  {} B", h.meta_size);
            println!("  Data offset    {} B", h.data_offset);
            println!("  File size      {} B", h.file_size);
            println!("  Signature      {}", assets.signature());
            println!("  Objects        {}", assets.objects().len());
            println!("  Max id         {}", assets.max_id());
            println!("  Externals      {}", assets.meta().externals.len());
            for w in assets.warnings() {
                println!("  Warning        {w:?}");
            }
            assets.close()?;
        }

        // ── Meta ─────────────────────────────────────────────────────────────
        Commands::Meta { file, type_id } => {
            let assets = AssetsReader::open_with(&file, &opts)?;
            let json = match type_id {
                Some(t) => {
                    let objects: Vec<_> = assets.objects().iter().filter(|o| o.type_id == t).collect();
                    serde_json::to_string_pretty(&objects)?
                }
                None => serde_json::to_string_pretty(assets.meta())?,
            };
            println!("{json}");
            assets.close()?;
        }

        // ── Hex ──────────────────────────────────────────────────────────────
        Commands::Hex { file, type_id } => {
            let mut assets = AssetsReader::open_with(&file, &opts)?;
            assets.for_each_object(|obj, body| -> Result<(), AssetsError> {
                if type_id.is_some_and(|t| t != obj.type_id) {
                    return Ok(());
                }
                println!("── object {} type={} class={} size={}", obj.id, obj.type_id, obj.class_id, obj.size);
                print!("{}", hex_dump(&body.read_remaining()?));
                Ok(())
            })?;
            assets.close()?;
        }

        // ── Grep ─────────────────────────────────────────────────────────────
        Commands::Grep { file, needle } => {
            let mut assets = AssetsReader::open_with(&file, &opts)?;
            let needle = needle.into_bytes();
            let mut hits = 0usize;
            assets.for_each_object(|obj, body| -> Result<(), AssetsError> {
                let data = body.read_remaining()?;
                for (pos, _) in data.windows(needle.len().max(1)).enumerate().filter(|(_, w)| *w == needle) {
                    println!("  id={:<8} type={:<6} offset={pos}", obj.id, obj.type_id);
                    hits += 1;
                }
                Ok(())
            })?;
            println!("{hits} match(es)");
            assets.close()?;
        }

        // ── Unpack ───────────────────────────────────────────────────────────
        Commands::Unpack { file, out_dir } => {
            let mut assets = AssetsReader::open_with(&file, &opts)?;
            let mut count = 0usize;
            assets.for_each_object(|obj, body| -> Result<(), AssetsError> {
                let dir = out_dir.join(obj.type_id.to_string());
                fs::create_dir_all(&dir)?;
                fs::write(dir.join(obj.id.to_string()), body.read_remaining()?)?;
                count += 1;
                Ok(())
            })?;
            assets.close()?;
            println!("Unpacked {count} object(s) to: {}", out_dir.display());
        }

        // ── Replace ──────────────────────────────────────────────────────────
        Commands::Replace { file, output, id, data, type_id, class_id } => {
            ensure_distinct(&file, &output)?;
            let mut assets = AssetsReader::open_with(&file, &opts)?;
            let record = *assets.meta().find(id).ok_or(AssetsError::ObjectNotFound(id))?;
            let object = CustomObject {
                type_id:  type_id.unwrap_or(record.type_id),
                class_id: class_id.unwrap_or(record.class_id),
                data:     fs::read(&data)?,
            };
            rebuild_file(&output, &mut assets, &[], &[Replacement { target_id: id, object }], &[])?;
            assets.close()?;
            println!("Created: {}", output.display());
        }

        // ── Add ──────────────────────────────────────────────────────────────
        Commands::Add { file, output, data, type_id, class_id } => {
            ensure_distinct(&file, &output)?;
            let mut assets = AssetsReader::open_with(&file, &opts)?;
            let object = CustomObject { type_id, class_id, data: fs::read(&data)? };
            let max_id = rebuild_file(&output, &mut assets, &[object], &[], &[])?;
            assets.close()?;
            println!("Created: {} (new object id {max_id})", output.display());
        }

        // ── Music ────────────────────────────────────────────────────────────
        Commands::MusicList { data_root } => {
            let tracks = music::list_tracks(&data_root, &opts)?;
            println!("{:<8} {:<32} {:>12} {:>12}", "Id", "Name", "Size", "Offset");
            for (obj, clip) in &tracks {
                println!("{:<8} {:<32} {:>12} {:>12}", obj.id, clip.name, clip.size, clip.shift);
            }
        }

        Commands::MusicUnpack { data_root, out_dir } => {
            let count = music::unpack_tracks(&data_root, &out_dir, &opts)?;
            println!("Unpacked {count} track(s) to: {}", out_dir.display());
        }

        Commands::MusicPack { data_root, music_dir, output_dir } => {
            let report = music::pack_music(&data_root, &music_dir, &output_dir, &opts)?;
            println!(
                "Packed music into {}: {} replaced, {} added, max id {}, {} new playlist group(s)",
                output_dir.display(),
                report.replaced,
                report.added,
                report.max_id,
                report.lib_added
            );
        }

        Commands::MusicLib { file } => {
            let lib = music::parse_music_lib(&file)?;
            println!("{}", serde_json::to_string_pretty(&lib)?);
        }

        // ── Resources ────────────────────────────────────────────────────────
        Commands::Resources { data_root } => {
            let mut assets = AssetsReader::open_with(data_root.join(MAIN_DATA), &opts)?;
            let manager = assets
                .objects()
                .iter()
                .find(|o| o.type_id == RESOURCE_MANAGER_TYPE_ID)
                .map(|o| o.id)
                .ok_or_else(|| AssetsError::Missing("resources manager data not found".into()))?;
            let resources: ResourceManager = assets.decode_object(manager)?;
            println!("{:<48} {:>8} {:>8}", "Name", "File", "Path id");
            for (name, r) in &resources.resources {
                println!("{:<48} {:>8} {:>8}", name, r.file_id, r.path_id);
            }
            println!("{} dependency entries", resources.dependent.len());
            assets.close()?;
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

/// Outputs are written while the input is still being read.
fn ensure_distinct(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let same = match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        return Err(format!("output {} must differ from input", output.display()).into());
    }
    Ok(())
}
