//! Metadata table: type tree, object table and external references.
//!
//! All strings here are tag (zero-terminated) strings.  The type tree and
//! external references are carried through untouched; only the object table
//! is ever rewritten.  Their strings are kept as raw bytes since shipped files
//! are not guaranteed to be UTF-8.

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::codec::{CodecError, Shape, Shaped, Value};

/// One node of the recursive type tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeInfo {
    #[serde(serialize_with = "lossy")]
    pub type_name: Vec<u8>,
    #[serde(serialize_with = "lossy")]
    pub name:      Vec<u8>,
    pub size:      u32,
    pub index:     u32,
    pub is_array:  u32,
    pub version:   u32,
    pub flags:     u32,
    pub children:  Vec<TypeInfo>,
}

impl Shaped for TypeInfo {
    fn shape() -> Shape {
        Shape::record([
            ("type",     Shape::tag_string()),
            ("name",     Shape::tag_string()),
            ("size",     Shape::u32()),
            ("index",    Shape::u32()),
            ("is_array", Shape::u32()),
            ("version",  Shape::u32()),
            ("flags",    Shape::u32()),
            ("children", Shape::sequence(Shape::Deferred(TypeInfo::shape))),
        ])
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut f = value.into_record()?;
        Ok(Self {
            type_name: f.take()?.into_bytes()?,
            name:      f.take()?.into_bytes()?,
            size:      f.take()?.into_u32()?,
            index:     f.take()?.into_u32()?,
            is_array:  f.take()?.into_u32()?,
            version:   f.take()?.into_u32()?,
            flags:     f.take()?.into_u32()?,
            children:  Vec::from_value(f.take()?)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::Record(vec![
            Value::Str(self.type_name.clone()),
            Value::Str(self.name.clone()),
            self.size.into(),
            self.index.into(),
            self.is_array.into(),
            self.version.into(),
            self.flags.into(),
            self.children.to_value(),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Class {
    pub id:   u32,
    pub info: TypeInfo,
}

impl Shaped for Class {
    fn shape() -> Shape {
        Shape::record([("id", Shape::u32()), ("info", TypeInfo::shape())])
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut f = value.into_record()?;
        Ok(Self {
            id:   f.take()?.into_u32()?,
            info: TypeInfo::from_value(f.take()?)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::Record(vec![self.id.into(), self.info.to_value()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypesHeader {
    pub signature: u64,
    pub flags:     u32,
    pub classes:   Vec<Class>,
    pub unknown:   u32,
}

impl Shaped for TypesHeader {
    fn shape() -> Shape {
        Shape::record([
            ("signature", Shape::u64()),
            ("flags",     Shape::u32()),
            ("classes",   Vec::<Class>::shape()),
            ("unknown",   Shape::u32()),
        ])
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut f = value.into_record()?;
        Ok(Self {
            signature: u64::from_value(f.take()?)?,
            flags:     f.take()?.into_u32()?,
            classes:   Vec::from_value(f.take()?)?,
            unknown:   f.take()?.into_u32()?,
        })
    }

    fn to_value(&self) -> Value {
        Value::Record(vec![
            self.signature.into(),
            self.flags.into(),
            self.classes.to_value(),
            self.unknown.into(),
        ])
    }
}

/// Object table entry.  `shift` is relative to the header's `data_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectRecord {
    pub id:        u32,
    pub shift:     u32,
    pub size:      u32,
    pub type_id:   u32,
    pub class_id:  u16,
    pub destroyed: u16,
}

impl Shaped for ObjectRecord {
    fn shape() -> Shape {
        Shape::record([
            ("id",        Shape::u32()),
            ("shift",     Shape::u32()),
            ("size",      Shape::u32()),
            ("type_id",   Shape::u32()),
            ("class_id",  Shape::u16()),
            ("destroyed", Shape::u16()),
        ])
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut f = value.into_record()?;
        Ok(Self {
            id:        f.take()?.into_u32()?,
            shift:     f.take()?.into_u32()?,
            size:      f.take()?.into_u32()?,
            type_id:   f.take()?.into_u32()?,
            class_id:  f.take()?.into_u16()?,
            destroyed: f.take()?.into_u16()?,
        })
    }

    fn to_value(&self) -> Value {
        Value::Record(vec![
            self.id.into(),
            self.shift.into(),
            self.size.into(),
            self.type_id.into(),
            self.class_id.into(),
            self.destroyed.into(),
        ])
    }
}

/// Dependency on another container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct External {
    #[serde(serialize_with = "lossy")]
    pub asset_path: Vec<u8>,
    pub guid:       Uuid,
    pub kind:       u32,
    #[serde(serialize_with = "lossy")]
    pub file_path:  Vec<u8>,
}

impl Shaped for External {
    fn shape() -> Shape {
        Shape::record([
            ("asset_path", Shape::tag_string()),
            ("guid",       <[u8; 16]>::shape()),
            ("type",       Shape::u32()),
            ("file_path",  Shape::tag_string()),
        ])
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut f = value.into_record()?;
        Ok(Self {
            asset_path: f.take()?.into_bytes()?,
            guid:       Uuid::from_bytes(<[u8; 16]>::from_value(f.take()?)?),
            kind:       f.take()?.into_u32()?,
            file_path:  f.take()?.into_bytes()?,
        })
    }

    fn to_value(&self) -> Value {
        Value::Record(vec![
            Value::Str(self.asset_path.clone()),
            self.guid.as_bytes().to_value(),
            self.kind.into(),
            Value::Str(self.file_path.clone()),
        ])
    }
}

/// Dumps show raw strings as text, invalid sequences replaced.
fn lossy<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaData {
    pub types:     TypesHeader,
    pub objects:   Vec<ObjectRecord>,
    pub externals: Vec<External>,
}

impl MetaData {
    pub fn max_id(&self) -> u32 {
        self.objects.iter().map(|o| o.id).max().unwrap_or(0)
    }

    pub fn find(&self, id: u32) -> Option<&ObjectRecord> {
        self.objects.iter().find(|o| o.id == id)
    }
}

impl Shaped for MetaData {
    fn shape() -> Shape {
        Shape::record([
            ("types",     TypesHeader::shape()),
            ("objects",   Vec::<ObjectRecord>::shape()),
            ("externals", Vec::<External>::shape()),
        ])
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let mut f = value.into_record()?;
        Ok(Self {
            types:     TypesHeader::from_value(f.take()?)?,
            objects:   Vec::from_value(f.take()?)?,
            externals: Vec::from_value(f.take()?)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::Record(vec![
            self.types.to_value(),
            self.objects.to_value(),
            self.externals.to_value(),
        ])
    }
}
