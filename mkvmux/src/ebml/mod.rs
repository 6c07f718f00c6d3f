//! The EBML codec layer (§4.1–§4.3): variable-length integers, primitive
//! value I/O, CRC-32 coverage and the element/master tree built on top
//! of them.

pub mod crc32;
pub mod element;
pub mod primitive;
pub mod varint;

pub use element::{
    ChildSpec, DefaultValue, EbmlError, Element, ElementId, ElementKind, Master, SemanticContext,
    CRC32_ID, VOID_ID,
};
pub use varint::UNKNOWN_SIZE;
