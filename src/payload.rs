//! Shapes of individual object payloads.
//!
//! Payload records use length-prefixed ([`StringEncoding::Payload`]) strings,
//! unlike the metadata table.
//!
//! [`StringEncoding::Payload`]: crate::codec::StringEncoding::Payload

use std::collections::BTreeMap;
use std::io::Read;

use serde::Serialize;

use crate::codec::{self, CodecError, Shape, Shaped, Value};
use crate::header::Endian;

/// Type id of streamed audio clip descriptors.
pub const AUDIO_CLIP_TYPE_ID: u32 = 83;
/// Type id of the global resource name table.
pub const RESOURCE_MANAGER_TYPE_ID: u32 = 147;

/// Format fields observed in every shipped audio clip.
pub const MAGIC_NUMBERS: [u32; 4] = [2, 14, 0, 2];

/// Descriptor of an audio track stored in the companion `.resS` stream file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioClip {
    pub name:    String,
    /// Format and loading flags; see [`MAGIC_NUMBERS`].
    pub unknown: [u32; 4],
    /// Length of the track in the stream file.
    pub size:    u32,
    /// Offset of the track in the stream file.
    pub shift:   u32,
}

impl AudioClip {
    pub fn new(name: impl Into<String>, size: u32, shift: u32) -> Self {
        Self { name: name.into(), unknown: MAGIC_NUMBERS, size, shift }
    }

    /// Parse a whole payload; any bytes left over are an error.
    pub fn parse<R: Read>(reader: &mut R, order: Endian) -> Result<Self, CodecError> {
        codec::read_exact(reader, order)
    }
}

impl Shaped for AudioClip {
    fn shape() -> Shape {
        Shape::record([
            ("name",    Shape::payload_string()),
            ("unknown", <[u32; 4]>::shape()),
            ("size",    Shape::u32()),
            ("shift",   Shape::u32()),
        ])
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut f = value.into_record()?;
        Ok(Self {
            name:    f.take()?.into_string()?,
            unknown: <[u32; 4]>::from_value(f.take()?)?,
            size:    f.take()?.into_u32()?,
            shift:   f.take()?.into_u32()?,
        })
    }

    fn to_value(&self) -> Value {
        Value::Record(vec![
            Value::from(self.name.as_str()),
            self.unknown.to_value(),
            self.size.into(),
            self.shift.into(),
        ])
    }
}

/// Pointer to an object, possibly in another container (`file_id` indexes
/// the externals table, 0 meaning the same file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectReference {
    pub file_id: u32,
    pub path_id: u32,
}

impl Shaped for ObjectReference {
    fn shape() -> Shape {
        Shape::record([("file_id", Shape::u32()), ("path_id", Shape::u32())])
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut f = value.into_record()?;
        Ok(Self { file_id: f.take()?.into_u32()?, path_id: f.take()?.into_u32()? })
    }

    fn to_value(&self) -> Value {
        Value::Record(vec![self.file_id.into(), self.path_id.into()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub object:       ObjectReference,
    pub dependencies: Vec<ObjectReference>,
}

impl Shaped for Dependency {
    fn shape() -> Shape {
        Shape::record([
            ("object",       ObjectReference::shape()),
            ("dependencies", Vec::<ObjectReference>::shape()),
        ])
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut f = value.into_record()?;
        Ok(Self {
            object:       ObjectReference::from_value(f.take()?)?,
            dependencies: Vec::from_value(f.take()?)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::Record(vec![self.object.to_value(), self.dependencies.to_value()])
    }
}

/// Name → object table used to load resources by path at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceManager {
    pub resources: BTreeMap<String, ObjectReference>,
    pub dependent: Vec<Dependency>,
}

impl Shaped for ResourceManager {
    fn shape() -> Shape {
        Shape::record([
            ("resources", Shape::map(Shape::payload_string(), ObjectReference::shape())),
            ("dependent", Vec::<Dependency>::shape()),
        ])
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut f = value.into_record()?;
        let resources: BTreeMap<String, ObjectReference> = f
            .take()?
            .into_map()?
            .into_iter()
            .map(|(k, v)| -> Result<_, CodecError> { Ok((k.into_string()?, ObjectReference::from_value(v)?)) })
            .collect::<Result<_, _>>()?;
        Ok(Self { resources, dependent: Vec::from_value(f.take()?)? })
    }

    fn to_value(&self) -> Value {
        let resources = self
            .resources
            .iter()
            .map(|(k, v)| (Value::from(k.as_str()), v.to_value()))
            .collect();
        Value::Record(vec![Value::Map(resources), self.dependent.to_value()])
    }
}
