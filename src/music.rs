//! Music track workflows for a game data directory.
//!
//! Audio clip descriptors live in `resources.assets`; the audio itself lives
//! in the companion stream file `resources.assets.resS`.  Tracks are found
//! at runtime through the `ResourceManager` object in `mainData`, keyed by
//! `music/<lowercase name>`, and reach the in-game playlists through the
//! protobuf music library shipped with the core content pack.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use prost::Message;
use serde::Serialize;

use crate::assets::{AssetsError, AssetsOptions, AssetsReader};
use crate::codec::{self, Shaped};
use crate::meta::ObjectRecord;
use crate::payload::{AudioClip, ObjectReference, ResourceManager, AUDIO_CLIP_TYPE_ID, RESOURCE_MANAGER_TYPE_ID};
use crate::rebuild::{rebuild_file, CustomObject, Replacement};

pub const MAIN_DATA:        &str = "mainData";
pub const ASSETS_FILE:      &str = "resources.assets";
pub const ASSETS_DATA_FILE: &str = "resources.assets.resS";
pub const MUSIC_LIB_PATH:   &str = "StreamingAssets/ContentPacks/shadowrun_core/data/misc";
pub const MUSIC_LIB_FILE:   &str = "music.mlib.bytes";

/// Externals index of `resources.assets` as seen from `mainData`.
const RESOURCES_FILE_ID: u32 = 1;

/// Every audio clip descriptor in `resources.assets`.
pub fn list_tracks(data_root: &Path, opts: &AssetsOptions) -> Result<Vec<(ObjectRecord, AudioClip)>, AssetsError> {
    let mut assets = AssetsReader::open_with(data_root.join(ASSETS_FILE), opts)?;
    let order = assets.endian();

    let mut tracks = Vec::new();
    assets.for_each_object(|obj, body| -> Result<(), AssetsError> {
        if obj.type_id == AUDIO_CLIP_TYPE_ID {
            tracks.push((*obj, AudioClip::parse(body, order)?));
        }
        Ok(())
    })?;
    assets.close()?;
    Ok(tracks)
}

/// Copy every track out of the stream file into `<out_dir>/<name>.ogg`.
/// Returns the number of tracks written.
pub fn unpack_tracks(data_root: &Path, out_dir: &Path, opts: &AssetsOptions) -> Result<usize, AssetsError> {
    let tracks = list_tracks(data_root, opts)?;
    fs::create_dir_all(out_dir)?;

    let mut pack = File::open(data_root.join(ASSETS_DATA_FILE))?;
    for (_, clip) in &tracks {
        log::info!("unpacking {} ({} bytes)", clip.name, clip.size);
        pack.seek(SeekFrom::Start(clip.shift.into()))?;
        let mut out = File::create(out_dir.join(format!("{}.ogg", clip.name)))?;
        let copied = io::copy(&mut (&mut pack).take(clip.size.into()), &mut out)?;
        if copied != u64::from(clip.size) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("track {} truncated in {ASSETS_DATA_FILE}", clip.name),
            )
            .into());
        }
    }
    Ok(tracks.len())
}

/// Concatenate every `*.ogg` in `dir` into a new stream file at `res_path`.
///
/// Returns one descriptor per track, keyed by file stem.
pub fn prepare_tracks(dir: &Path, res_path: &Path) -> Result<BTreeMap<String, AudioClip>, AssetsError> {
    let mut files: Vec<_> = fs::read_dir(dir)?
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "ogg"))
        .collect();
    files.sort();

    let mut res = File::create(res_path)?;
    let mut tracks = BTreeMap::new();
    for path in files {
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let offset = res.stream_position()?;
        let size = io::copy(&mut File::open(&path)?, &mut res)?;
        let clip = AudioClip::new(
            name.clone(),
            u32::try_from(size).map_err(|_| AssetsError::TooLarge(size))?,
            u32::try_from(offset).map_err(|_| AssetsError::TooLarge(offset))?,
        );
        tracks.insert(name, clip);
    }
    Ok(tracks)
}

/// Outcome of [`pack_music`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub replaced:  usize,
    pub added:     usize,
    pub max_id:    u32,
    /// Playlist groups created in the music library.
    pub lib_added: usize,
}

/// Replace the game's music with the tracks in `music_dir`.
///
/// Writes `resources.assets`, `resources.assets.resS`, `mainData` and the
/// music library into `output_dir`; `data_root` is only read and must differ
/// from `output_dir`.
/// Every existing track must have a replacement of the same name, since
/// objects cannot be removed.
pub fn pack_music(
    data_root:  &Path,
    music_dir:  &Path,
    output_dir: &Path,
    opts:       &AssetsOptions,
) -> Result<PackReport, AssetsError> {
    if same_directory(data_root, output_dir)? {
        return Err(AssetsError::SameDirectory(output_dir.to_path_buf()));
    }
    fs::create_dir_all(output_dir)?;

    log::info!("preparing {ASSETS_DATA_FILE}...");
    let tracks = prepare_tracks(music_dir, &output_dir.join(ASSETS_DATA_FILE))?;
    if tracks.is_empty() {
        return Err(AssetsError::Missing(format!("suitable tracks not found in {}", music_dir.display())));
    }

    log::info!("parsing {ASSETS_FILE}...");
    let mut assets = AssetsReader::open_with(data_root.join(ASSETS_FILE), opts)?;
    let order = assets.endian();

    let mut replace = Vec::new();
    let mut missing = Vec::new();
    let mut used = BTreeSet::new();
    assets.for_each_object(|obj, body| -> Result<(), AssetsError> {
        if obj.type_id != AUDIO_CLIP_TYPE_ID {
            return Ok(());
        }
        let old = AudioClip::parse(body, order)?;
        match tracks.get(&old.name) {
            Some(clip) => {
                log::info!("replacing {}", old.name);
                replace.push(Replacement {
                    target_id: obj.id,
                    object: CustomObject { type_id: obj.type_id, class_id: obj.class_id, data: clip.to_bytes(order)? },
                });
                used.insert(old.name);
            }
            None => missing.push(old.name),
        }
        Ok(())
    })?;

    if !missing.is_empty() {
        return Err(AssetsError::NotSupported(format!(
            "removing tracks {missing:?}; make sure the music directory contains replacements for all existing tracks"
        )));
    }

    let mut add = Vec::new();
    let mut added_names = Vec::new();
    for (name, clip) in tracks.iter().filter(|(name, _)| !used.contains(*name)) {
        log::info!("adding {name}");
        add.push(CustomObject {
            type_id:  AUDIO_CLIP_TYPE_ID,
            class_id: AUDIO_CLIP_TYPE_ID as u16,
            data:     clip.to_bytes(order)?,
        });
        added_names.push(name.to_lowercase());
    }

    log::info!("creating modified {ASSETS_FILE}...");
    let max_id = rebuild_file(output_dir.join(ASSETS_FILE), &mut assets, &add, &replace, &[])?;
    assets.close()?;

    log::info!("parsing {MAIN_DATA}...");
    let mut main_data = AssetsReader::open_with(data_root.join(MAIN_DATA), opts)?;
    let manager = *main_data
        .objects()
        .iter()
        .find(|o| o.type_id == RESOURCE_MANAGER_TYPE_ID)
        .ok_or_else(|| AssetsError::Missing("resources manager data not found".to_owned()))?;
    let mut resources: ResourceManager = main_data.decode_object(manager.id)?;

    let first_new = max_id - add.len() as u32 + 1;
    for (pos, name) in added_names.iter().enumerate() {
        resources.resources.insert(
            format!("music/{name}"),
            ObjectReference { file_id: RESOURCES_FILE_ID, path_id: first_new + pos as u32 },
        );
    }

    log::info!("creating modified {MAIN_DATA}...");
    let mut data = Vec::new();
    codec::write(&mut data, &resources, main_data.endian())?;
    let patch = Replacement {
        target_id: manager.id,
        object:    CustomObject { type_id: manager.type_id, class_id: manager.class_id, data },
    };
    rebuild_file(output_dir.join(MAIN_DATA), &mut main_data, &[], &[patch], &[])?;
    main_data.close()?;

    log::info!("parsing {MUSIC_LIB_FILE}...");
    let mut lib = parse_music_lib(&data_root.join(MUSIC_LIB_PATH).join(MUSIC_LIB_FILE))?;
    log::info!("creating modified music lib...");
    let lib_added = lib.add_tracks(tracks.keys().map(String::as_str));
    let lib_dir = output_dir.join(MUSIC_LIB_PATH);
    fs::create_dir_all(&lib_dir)?;
    save_music_lib(&lib, &lib_dir.join(MUSIC_LIB_FILE))?;

    Ok(PackReport { replaced: replace.len(), added: add.len(), max_id, lib_added })
}

fn same_directory(data_root: &Path, output_dir: &Path) -> io::Result<bool> {
    match fs::canonicalize(output_dir) {
        Ok(out) => Ok(fs::canonicalize(data_root)? == out),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

// ── Music library ────────────────────────────────────────────────────────────

/// Playlist table of the core content pack.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct MusicLib {
    #[prost(message, repeated, tag = "1")]
    pub groups: Vec<MusicGroup>,
}

#[derive(Clone, PartialEq, Message, Serialize)]
pub struct MusicGroup {
    #[prost(string, tag = "1")]
    pub name:   String,
    #[prost(string, repeated, tag = "2")]
    pub tracks: Vec<String>,
}

impl MusicLib {
    /// Give every track not yet referenced by any group (case-insensitively)
    /// a group of its own, then sort groups by name.  Returns the number of
    /// groups created.
    pub fn add_tracks<'a, I: IntoIterator<Item = &'a str>>(&mut self, names: I) -> usize {
        let known: BTreeSet<String> = self
            .groups
            .iter()
            .flat_map(|g| g.tracks.iter().map(|t| t.to_lowercase()))
            .collect();

        let mut offered = BTreeSet::new();
        let mut added = 0;
        for name in names {
            offered.insert(name.to_lowercase());
            if known.contains(&name.to_lowercase()) {
                log::info!("{name} already in lib");
                continue;
            }
            log::info!("adding {name} to lib");
            self.groups.push(MusicGroup { name: name.to_owned(), tracks: vec![name.to_owned()] });
            added += 1;
        }
        for name in known.difference(&offered) {
            log::warn!("{name} found in lib, but missing in resources");
        }

        self.groups.sort_by(|a, b| a.name.cmp(&b.name));
        added
    }
}

pub fn parse_music_lib(path: &Path) -> Result<MusicLib, AssetsError> {
    let data = fs::read(path)?;
    Ok(MusicLib::decode(data.as_slice())?)
}

pub fn save_music_lib(lib: &MusicLib, path: &Path) -> Result<(), AssetsError> {
    fs::write(path, lib.encode_to_vec())?;
    Ok(())
}
