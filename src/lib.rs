pub mod header;
pub mod codec;
pub mod meta;
pub mod section;
pub mod assets;
pub mod rebuild;
pub mod payload;
pub mod music;

pub use header::{Endian, Header, HeaderError};
pub use codec::{CodecError, Shape, Shaped, Value};
pub use meta::{MetaData, ObjectRecord};
pub use assets::{AssetsError, AssetsOptions, AssetsReader};
pub use rebuild::{rebuild, rebuild_file, CustomObject, Replacement};
