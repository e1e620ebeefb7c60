//! Container mutation engine.
//!
//! [`rebuild`] writes a brand-new container from an open source container
//! plus a set of replacements and additions.  The source is never modified.
//!
//! Layout of the output:
//!
//! ```text
//! [ header (20 B) | metadata | zero pad to 8 | obj 0 | pad | obj 1 | pad | ... | added objects ]
//! ```
//!
//! Kept objects retain their order and ids; only `shift` changes.  Added
//! objects are appended with ids `max_id + 1 ..= max_id + add.len()`.
//!
//! The engine does not know what is inside a payload.  If an object refers
//! to another by id (a resource table, for example), keeping those references
//! valid is the caller's job.
//!
//! On error the partially written output is left as is.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::assets::{AssetsError, AssetsReader, OBJECT_ALIGN};
use crate::codec::{self, write_zeros};
use crate::header::{align, Header, HEADER_SIZE};
use crate::meta::{MetaData, ObjectRecord};

/// Payload plus the type information that goes into its object record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomObject {
    pub type_id:  u32,
    pub class_id: u16,
    pub data:     Vec<u8>,
}

/// Replace the object `target_id` in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub target_id: u32,
    pub object:    CustomObject,
}

/// Rebuild `src` into `dst`.
///
/// Returns the highest object id in the output; the `i`-th (0-based) entry of
/// `add` received id `max_id - add.len() + i + 1`.
///
/// `remove` must be empty: deleting an object could leave dangling references
/// in other payloads.  Express deletions as id-preserving replacements.
pub fn rebuild<R, W>(
    src:     &mut AssetsReader<R>,
    dst:     W,
    add:     &[CustomObject],
    replace: &[Replacement],
    remove:  &[u32],
) -> Result<u32, AssetsError>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let plan = Plan::new(src.header(), src.meta(), add, replace, remove)?;
    plan.write(src, dst)
}

/// Rebuild `src` into a new file at `path`.
///
/// The request is validated before `path` is created.
pub fn rebuild_file<P, R>(
    path:    P,
    src:     &mut AssetsReader<R>,
    add:     &[CustomObject],
    replace: &[Replacement],
    remove:  &[u32],
) -> Result<u32, AssetsError>
where
    P: AsRef<Path>,
    R: Read + Seek,
{
    let plan = Plan::new(src.header(), src.meta(), add, replace, remove)?;
    let out = BufWriter::new(File::create(path.as_ref())?);
    plan.write(src, out)
}

// ── Planning ─────────────────────────────────────────────────────────────────

/// New header and metadata computed before any output is written.
struct Plan<'a> {
    header:    Header,
    meta:      MetaData,
    add:       &'a [CustomObject],
    replace:   HashMap<u32, &'a CustomObject>,
    /// Sum of aligned object sizes.
    data_size: u64,
    max_id:    u32,
}

impl<'a> Plan<'a> {
    fn new(
        header:  &Header,
        meta:    &MetaData,
        add:     &'a [CustomObject],
        replace: &'a [Replacement],
        remove:  &[u32],
    ) -> Result<Self, AssetsError> {
        if let Some(rep) = replace.iter().find(|r| remove.contains(&r.target_id)) {
            return Err(AssetsError::Conflict { id: rep.target_id });
        }
        if !remove.is_empty() {
            return Err(AssetsError::NotSupported(format!(
                "removing objects {remove:?}; other objects may still reference them, \
                 replace them with id-preserving content instead"
            )));
        }

        let mut replace_map = HashMap::with_capacity(replace.len());
        for rep in replace {
            if meta.find(rep.target_id).is_none() {
                return Err(AssetsError::ObjectNotFound(rep.target_id));
            }
            replace_map.insert(rep.target_id, &rep.object);
        }

        let mut objects   = Vec::with_capacity(meta.objects.len() + add.len());
        let mut data_size = 0u64;
        let mut max_id    = 0u32;

        for obj in &meta.objects {
            let mut obj = *obj;
            if let Some(rep) = replace_map.get(&obj.id) {
                obj.type_id  = rep.type_id;
                obj.class_id = rep.class_id;
                obj.size     = to_u32(rep.data.len() as u64)?;
            }
            obj.shift = to_u32(data_size)?;
            data_size += align(obj.size.into(), OBJECT_ALIGN);
            max_id = max_id.max(obj.id);
            objects.push(obj);
        }

        for custom in add {
            max_id = max_id
                .checked_add(1)
                .ok_or_else(|| AssetsError::NotSupported("object id space exhausted".to_owned()))?;
            let size = to_u32(custom.data.len() as u64)?;
            objects.push(ObjectRecord {
                id:        max_id,
                shift:     to_u32(data_size)?,
                size,
                type_id:   custom.type_id,
                class_id:  custom.class_id,
                destroyed: 0,
            });
            data_size += align(size.into(), OBJECT_ALIGN);
        }

        Ok(Self {
            header: *header,
            meta: MetaData {
                types:     meta.types.clone(),
                objects,
                externals: meta.externals.clone(),
            },
            add,
            replace: replace_map,
            data_size,
            max_id,
        })
    }

    // ── Output ───────────────────────────────────────────────────────────────

    fn write<R, W>(mut self, src: &mut AssetsReader<R>, mut dst: W) -> Result<u32, AssetsError>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        let order = self.header.endian();

        // Placeholder; rewritten once the metadata size is known.
        dst.seek(SeekFrom::Start(0))?;
        self.header.write(&mut dst)?;
        codec::write(&mut dst, &self.meta, order)?;

        let meta_end    = dst.stream_position()?;
        let data_offset = align(meta_end, OBJECT_ALIGN);
        self.header.meta_size   = to_u32(meta_end - HEADER_SIZE)?;
        self.header.data_offset = to_u32(data_offset)?;
        self.header.file_size   = to_u32(data_offset + self.data_size)?;
        write_zeros(&mut dst, data_offset - meta_end)?;

        dst.seek(SeekFrom::Start(0))?;
        self.header.write(&mut dst)?;
        dst.seek(SeekFrom::Start(data_offset))?;

        let replace = &self.replace;
        src.for_each_object(|obj, body| -> Result<(), AssetsError> {
            let written = match replace.get(&obj.id) {
                Some(rep) => {
                    log::debug!("replacing object {} ({} -> {} bytes)", obj.id, obj.size, rep.data.len());
                    dst.write_all(&rep.data)?;
                    rep.data.len() as u64
                }
                None => {
                    let copied = io::copy(body, &mut dst)?;
                    if copied != u64::from(obj.size) {
                        return Err(AssetsError::Io(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!("object {} truncated: {copied} of {} bytes", obj.id, obj.size),
                        )));
                    }
                    copied
                }
            };
            write_zeros(&mut dst, align(written, OBJECT_ALIGN) - written)?;
            Ok(())
        })?;

        for (i, custom) in self.add.iter().enumerate() {
            let len = custom.data.len() as u64;
            log::debug!("appending object {} ({len} bytes)", self.max_id - (self.add.len() - 1 - i) as u32);
            dst.write_all(&custom.data)?;
            write_zeros(&mut dst, align(len, OBJECT_ALIGN) - len)?;
        }
        dst.flush()?;

        log::info!(
            "rebuilt container: {} objects, {} bytes, max id {}",
            self.meta.objects.len(),
            self.header.file_size,
            self.max_id
        );
        Ok(self.max_id)
    }
}

fn to_u32(value: u64) -> Result<u32, AssetsError> {
    u32::try_from(value).map_err(|_| AssetsError::TooLarge(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::TypesHeader;

    fn header() -> Header {
        Header { meta_size: 0, file_size: 0, version: 9, data_offset: 0, byte_order: 0, reserved: [0; 3] }
    }

    fn meta(sizes: &[u32]) -> MetaData {
        let mut shift = 0;
        let objects = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let rec = ObjectRecord { id: i as u32 + 1, shift, size, type_id: 1, class_id: 1, destroyed: 0 };
                shift += align(size.into(), OBJECT_ALIGN) as u32;
                rec
            })
            .collect();
        MetaData {
            types: TypesHeader { signature: 0, flags: 0, classes: Vec::new(), unknown: 0 },
            objects,
            externals: Vec::new(),
        }
    }

    fn custom(len: usize) -> CustomObject {
        CustomObject { type_id: 7, class_id: 7, data: vec![0xAB; len] }
    }

    #[test]
    fn shifts_are_aligned_and_ids_allocated() {
        let add = [custom(5)];
        let plan = Plan::new(&header(), &meta(&[10, 20, 8]), &add, &[], &[]).unwrap();
        let shifts: Vec<u32> = plan.meta.objects.iter().map(|o| o.shift).collect();
        assert_eq!(shifts, [0, 16, 40, 48]);
        assert_eq!(plan.meta.objects[3].id, 4);
        assert_eq!(plan.max_id, 4);
        assert_eq!(plan.data_size, 56);
    }

    #[test]
    fn replacement_changes_only_its_record() {
        let replace = [Replacement { target_id: 2, object: custom(3) }];
        let plan = Plan::new(&header(), &meta(&[4, 4, 4]), &[], &replace, &[]).unwrap();
        let objs = &plan.meta.objects;
        assert_eq!((objs[1].size, objs[1].type_id, objs[1].class_id), (3, 7, 7));
        assert_eq!(objs[0], meta(&[4, 4, 4]).objects[0]);
        assert_eq!(objs.iter().map(|o| o.id).collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn conflict_is_reported_before_removal() {
        let replace = [Replacement { target_id: 1, object: custom(1) }];
        let err = Plan::new(&header(), &meta(&[1]), &[], &replace, &[1]).err().unwrap();
        assert!(matches!(err, AssetsError::Conflict { id: 1 }));
    }

    #[test]
    fn removal_is_not_supported() {
        let err = Plan::new(&header(), &meta(&[1, 2]), &[custom(1)], &[], &[2]).err().unwrap();
        assert!(matches!(err, AssetsError::NotSupported(_)));
    }

    #[test]
    fn unknown_replacement_target() {
        let replace = [Replacement { target_id: 42, object: custom(1) }];
        let err = Plan::new(&header(), &meta(&[1]), &[], &replace, &[]).err().unwrap();
        assert!(matches!(err, AssetsError::ObjectNotFound(42)));
    }

    #[test]
    fn empty_source_allocates_from_one() {
        let add = [custom(1), custom(2)];
        let plan = Plan::new(&header(), &meta(&[]), &add, &[], &[]).unwrap();
        assert_eq!(plan.meta.objects.iter().map(|o| o.id).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(plan.max_id, 2);
    }
}
