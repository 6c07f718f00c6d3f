//! The EBML element tree (§3 "EBML element", §4.3): a tagged-union
//! element model dispatched through a small per-kind table (read,
//! write, size, default-value test) instead of deep inheritance, with
//! masters driven by an immutable, process-wide semantic context.

use std::fmt;

use thiserror::Error;

use super::crc32::crc32;
use super::primitive::{
    read_binary, read_date, read_float, read_int, read_str, read_uint, write_date, write_float,
    write_int, write_str, write_uint, PrimitiveError,
};
use super::varint::{encoded_id_len, read_id, read_size, write_id, write_size, VintError, UNKNOWN_SIZE};

pub type ElementId = u32;

/// EBML CRC-32 element ID (§4.3).
pub const CRC32_ID: ElementId = 0xBF;
/// EBML Void (padding) element ID, carried per SPEC_FULL §3 supplement.
pub const VOID_ID: ElementId = 0xEC;

#[derive(Debug, Error)]
pub enum EbmlError {
    #[error(transparent)]
    Vint(#[from] VintError),
    #[error(transparent)]
    Primitive(#[from] PrimitiveError),
    #[error("unexpected element {found:#x}, expected one of the semantic context's children")]
    UnexpectedElement { found: ElementId },
    #[error("missing mandatory element {name} ({id:#x})")]
    MissingMandatory { name: &'static str, id: ElementId },
    #[error("element {name} ({id:#x}) appears more than once but is marked unique")]
    DuplicateUnique { name: &'static str, id: ElementId },
    #[error("CRC-32 mismatch in master {0}: stored {1:#010x}, computed {2:#010x}")]
    Crc32Mismatch(&'static str, u32, u32),
    #[error("element {0} has unknown size but is not a top-level master")]
    UnknownSizeNotAllowed(&'static str),
}

/// The kind of value a [`ChildSpec`] describes; drives the dispatch
/// table used by [`Element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    UnsignedInt,
    SignedInt,
    /// Float width in bytes: 4 or 8.
    Float(u8),
    Ascii,
    Utf8,
    Binary,
    Date,
    Master,
}

/// A child's default value, used both to auto-populate mandatory+unique
/// masters and to drive `is_default_value`.
#[derive(Debug, Clone, Copy)]
pub enum DefaultValue {
    None,
    UInt(u64),
    Int(i64),
    Float(f64),
    Str(&'static str),
}

/// One entry in a master's semantic context (§3 "Semantic context").
pub struct ChildSpec {
    pub id: ElementId,
    pub name: &'static str,
    pub kind: ElementKind,
    pub mandatory: bool,
    pub unique: bool,
    pub default: DefaultValue,
    /// Padding target for strings (and reserved-size ints); `None` means
    /// "no default size, write exactly what's there".
    pub default_size: Option<usize>,
    /// Present when `kind == Master`: the nested context new children of
    /// this type are built from.
    pub nested: Option<&'static SemanticContext>,
}

/// An ordered list of `(child-id, mandatory?, unique?, factory)` entries
/// for one master type (§3). Immutable and process-wide: every instance
/// of a given master type shares the same `&'static` context.
pub struct SemanticContext {
    pub name: &'static str,
    pub children: &'static [ChildSpec],
}

impl SemanticContext {
    pub fn spec_for(&self, id: ElementId) -> Option<&'static ChildSpec> {
        self.children.iter().find(|c| c.id == id)
    }
}

impl ChildSpec {
    /// Builds a fresh element for this child, using the spec's default
    /// value (or, for nested masters, recursively populating *its*
    /// mandatory+unique children).
    pub fn instantiate(&self) -> Element {
        match self.kind {
            ElementKind::Master => {
                let ctx = self
                    .nested
                    .expect("ChildSpec with Master kind must carry a nested context");
                Element::Master(Master::with_id(self.id, ctx))
            }
            ElementKind::UnsignedInt => Element::UInt {
                id: self.id,
                name: self.name,
                value: 0,
                value_is_set: false,
                default: match self.default {
                    DefaultValue::UInt(v) => Some(v),
                    DefaultValue::None => None,
                    _ => None,
                },
            },
            ElementKind::SignedInt => Element::Int {
                id: self.id,
                name: self.name,
                value: 0,
                value_is_set: false,
                default: match self.default {
                    DefaultValue::Int(v) => Some(v),
                    DefaultValue::None => None,
                    _ => None,
                },
            },
            ElementKind::Float(size) => Element::Float {
                id: self.id,
                name: self.name,
                value: 0.0,
                value_is_set: false,
                size,
                default: match self.default {
                    DefaultValue::Float(v) => Some(v),
                    DefaultValue::None => None,
                    _ => None,
                },
            },
            ElementKind::Ascii | ElementKind::Utf8 => Element::Str {
                id: self.id,
                name: self.name,
                value: match self.default {
                    DefaultValue::Str(v) => v.to_string(),
                    _ => String::new(),
                },
                value_is_set: false,
                default: match self.default {
                    DefaultValue::Str(v) => Some(v.to_string()),
                    _ => None,
                },
                default_size: self.default_size,
            },
            ElementKind::Binary => Element::Binary {
                id: self.id,
                name: self.name,
                value: Vec::new(),
                value_is_set: false,
            },
            ElementKind::Date => Element::Date {
                id: self.id,
                name: self.name,
                value: 0,
                value_is_set: false,
            },
        }
    }
}

/// A tagged-union EBML element: scalar kinds and the recursive `Master`
/// case, each dispatched through the methods below instead of a class
/// hierarchy.
pub enum Element {
    UInt {
        id: ElementId,
        name: &'static str,
        value: u64,
        value_is_set: bool,
        default: Option<u64>,
    },
    Int {
        id: ElementId,
        name: &'static str,
        value: i64,
        value_is_set: bool,
        default: Option<i64>,
    },
    Float {
        id: ElementId,
        name: &'static str,
        value: f64,
        value_is_set: bool,
        size: u8,
        default: Option<f64>,
    },
    Str {
        id: ElementId,
        name: &'static str,
        value: String,
        value_is_set: bool,
        default: Option<String>,
        default_size: Option<usize>,
    },
    Binary {
        id: ElementId,
        name: &'static str,
        value: Vec<u8>,
        value_is_set: bool,
    },
    Date {
        id: ElementId,
        name: &'static str,
        value: i64,
        value_is_set: bool,
    },
    Master(Master),
    /// EBML Void: a padding element whose content is never meaningful.
    Void { len: u64 },
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Element::UInt { id, .. }
            | Element::Int { id, .. }
            | Element::Float { id, .. }
            | Element::Str { id, .. }
            | Element::Binary { id, .. }
            | Element::Date { id, .. } => *id,
            Element::Master(m) => m.id,
            Element::Void { .. } => VOID_ID,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Element::UInt { name, .. }
            | Element::Int { name, .. }
            | Element::Float { name, .. }
            | Element::Str { name, .. }
            | Element::Binary { name, .. }
            | Element::Date { name, .. } => name,
            Element::Master(m) => m.context.name,
            Element::Void { .. } => "Void",
        }
    }

    pub fn as_master(&self) -> Option<&Master> {
        match self {
            Element::Master(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_master_mut(&mut self) -> Option<&mut Master> {
        match self {
            Element::Master(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Element::UInt { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Element::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Element::Float { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Element::Str { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Element::Binary { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn set_uint(&mut self, v: u64) {
        if let Element::UInt {
            value,
            value_is_set,
            ..
        } = self
        {
            *value = v;
            *value_is_set = true;
        }
    }

    pub fn set_int(&mut self, v: i64) {
        if let Element::Int {
            value,
            value_is_set,
            ..
        } = self
        {
            *value = v;
            *value_is_set = true;
        }
    }

    pub fn set_float(&mut self, v: f64) {
        if let Element::Float {
            value,
            value_is_set,
            ..
        } = self
        {
            *value = v;
            *value_is_set = true;
        }
    }

    pub fn set_str(&mut self, v: impl Into<String>) {
        if let Element::Str {
            value,
            value_is_set,
            ..
        } = self
        {
            *value = v.into();
            *value_is_set = true;
        }
    }

    pub fn set_binary(&mut self, v: impl Into<Vec<u8>>) {
        if let Element::Binary {
            value,
            value_is_set,
            ..
        } = self
        {
            *value = v.into();
            *value_is_set = true;
        }
    }

    pub fn set_date(&mut self, v: i64) {
        if let Element::Date {
            value,
            value_is_set,
            ..
        } = self
        {
            *value = v;
            *value_is_set = true;
        }
    }

    /// `is_default_value()` (§3): true when the element's value equals
    /// its registered default (or was never set and has no override).
    pub fn is_default_value(&self) -> bool {
        match self {
            Element::UInt {
                value,
                default,
                value_is_set,
                ..
            } => !value_is_set || default.map(|d| d == *value).unwrap_or(false),
            Element::Int {
                value,
                default,
                value_is_set,
                ..
            } => !value_is_set || default.map(|d| d == *value).unwrap_or(false),
            Element::Float {
                value,
                default,
                value_is_set,
                ..
            } => !value_is_set || default.map(|d| d == *value).unwrap_or(false),
            Element::Str {
                value,
                default,
                value_is_set,
                ..
            } => !value_is_set || default.as_deref().map(|d| d == value).unwrap_or(false),
            Element::Binary { value_is_set, .. } => !value_is_set,
            Element::Date { value_is_set, .. } => !value_is_set,
            Element::Master(_) | Element::Void { .. } => false,
        }
    }

    /// Content size of a scalar (non-master) element; masters go through
    /// [`Master::content_size`] instead, since theirs depends on
    /// `with_default`.
    fn scalar_content_size(&self) -> u64 {
        match self {
            Element::UInt { value, .. } => uint_width(*value) as u64,
            Element::Int { value, .. } => int_width(*value) as u64,
            Element::Float { size, .. } => *size as u64,
            Element::Str {
                value,
                default_size,
                ..
            } => default_size.map(|d| d.max(value.len())).unwrap_or(value.len()) as u64,
            Element::Binary { value, .. } => value.len() as u64,
            Element::Date { .. } => 8,
            Element::Void { len } => *len,
            Element::Master(_) => unreachable!("masters are sized via Master::content_size"),
        }
    }

    /// `update_size` (§4.3): recursively computes the element's total
    /// on-wire size (ID + size field + content), honoring
    /// `with_default`/`force_render` elision the same way `render` will.
    pub fn update_size(&self, with_default: bool, force_render: bool) -> u64 {
        if !with_default && !force_render && self.is_default_value() {
            return 0;
        }

        let id_len = encoded_id_len(self.id());

        if let Element::Master(m) = self {
            if !m.size_is_finite {
                return id_len as u64 + m.unknown_size_len() as u64;
            }

            let content = m.content_size(with_default);
            let size_len = m
                .size_length_override
                .unwrap_or_else(|| super::varint::shortest_size_len(content));

            return id_len as u64 + size_len as u64 + content;
        }

        let content = self.scalar_content_size();
        let size_len = super::varint::shortest_size_len(content);

        id_len as u64 + size_len as u64 + content
    }

    /// `render` (§4.3): serializes the element, skipping default-valued
    /// children unless `with_default`/`force_render` says otherwise.
    pub fn render(&self, with_default: bool, force_render: bool, out: &mut Vec<u8>) -> Result<(), EbmlError> {
        if !with_default && !force_render && self.is_default_value() {
            return Ok(());
        }

        write_id(self.id(), encoded_id_len(self.id()), out);

        match self {
            Element::UInt { value, .. } => {
                let width = uint_width(*value);
                write_size(width as u64, None, out)?;
                write_uint(*value, width, out);
            }
            Element::Int { value, .. } => {
                let width = int_width(*value);
                write_size(width as u64, None, out)?;
                write_int(*value, width, out);
            }
            Element::Float { value, size, .. } => {
                write_size(*size as u64, None, out)?;
                write_float(*value, *size as usize, out);
            }
            Element::Str {
                value,
                default_size,
                ..
            } => {
                let content_len = default_size.map(|d| d.max(value.len())).unwrap_or(value.len());
                write_size(content_len as u64, None, out)?;
                write_str(value, *default_size, out);
            }
            Element::Binary { value, .. } => {
                write_size(value.len() as u64, None, out)?;
                out.extend_from_slice(value);
            }
            Element::Date { value, .. } => {
                write_size(8, None, out)?;
                write_date(*value, out);
            }
            Element::Master(m) => {
                m.render_body(with_default, force_render, out)?;
            }
            Element::Void { len } => {
                write_size(*len, None, out)?;
                out.resize(out.len() + *len as usize, 0);
            }
        }

        Ok(())
    }

    /// Parses one element (header + content) from `input`, returning the
    /// element and the number of bytes consumed. Master elements recurse
    /// using `context` to resolve children by ID.
    pub fn parse(input: &[u8], context: &'static SemanticContext) -> Result<(Element, usize), EbmlError> {
        let (id, id_len) = read_id(input)?;
        let (size, size_len) = read_size(&input[id_len..])?;
        let header_len = id_len + size_len;

        let spec = context.spec_for(id);

        if size == UNKNOWN_SIZE {
            return Err(EbmlError::UnknownSizeNotAllowed(
                spec.map(|s| s.name).unwrap_or("<unknown>"),
            ));
        }

        let content_start = header_len;
        let content_end = content_start + size as usize;
        let content = input
            .get(content_start..content_end)
            .ok_or_else(|| VintError::Truncated {
                needed: content_end,
                got: input.len(),
            })?;

        let kind = spec.map(|s| s.kind).unwrap_or(ElementKind::Binary);
        let name = spec.map(|s| s.name).unwrap_or("<unknown>");

        let element = match kind {
            ElementKind::UnsignedInt => Element::UInt {
                id,
                name,
                value: read_uint(content, size)?,
                value_is_set: true,
                default: spec.and_then(|s| match s.default {
                    DefaultValue::UInt(v) => Some(v),
                    _ => None,
                }),
            },
            ElementKind::SignedInt => Element::Int {
                id,
                name,
                value: read_int(content, size)?,
                value_is_set: true,
                default: spec.and_then(|s| match s.default {
                    DefaultValue::Int(v) => Some(v),
                    _ => None,
                }),
            },
            ElementKind::Float(fsize) => Element::Float {
                id,
                name,
                value: read_float(content, size)?,
                value_is_set: true,
                size: fsize,
                default: spec.and_then(|s| match s.default {
                    DefaultValue::Float(v) => Some(v),
                    _ => None,
                }),
            },
            ElementKind::Ascii | ElementKind::Utf8 => Element::Str {
                id,
                name,
                value: read_str(content, size)?,
                value_is_set: true,
                default: spec.and_then(|s| match s.default {
                    DefaultValue::Str(v) => Some(v.to_string()),
                    _ => None,
                }),
                default_size: spec.and_then(|s| s.default_size),
            },
            ElementKind::Binary => Element::Binary {
                id,
                name,
                value: read_binary(content, size)?,
                value_is_set: true,
            },
            ElementKind::Date => Element::Date {
                id,
                name,
                value: read_date(content)?,
                value_is_set: true,
            },
            ElementKind::Master => {
                let nested_ctx = spec.and_then(|s| s.nested).unwrap_or(context);
                Element::Master(Master::parse_body(id, nested_ctx, content)?)
            }
        };

        Ok((element, content_end))
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::UInt { name, value, .. } => write!(f, "{name}={value}"),
            Element::Int { name, value, .. } => write!(f, "{name}={value}"),
            Element::Float { name, value, .. } => write!(f, "{name}={value}"),
            Element::Str { name, value, .. } => write!(f, "{name}={value:?}"),
            Element::Binary { name, value, .. } => write!(f, "{name}=[{} bytes]", value.len()),
            Element::Date { name, value, .. } => write!(f, "{name}={value}ns"),
            Element::Master(m) => write!(f, "{:?}", m),
            Element::Void { len } => write!(f, "Void[{len}]"),
        }
    }
}

fn uint_width(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    (8 - (value.leading_zeros() as usize) / 8).max(1).min(8)
}

fn int_width(value: i64) -> usize {
    if value == 0 {
        return 1;
    }

    for width in 1..8 {
        let bits = width * 8;
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if value >= min && value <= max {
            return width;
        }
    }

    8
}

/// A master element: an ordered sequence of children plus the semantic
/// context that governs them (§3 "Matroska document", §4.3).
pub struct Master {
    pub id: ElementId,
    pub context: &'static SemanticContext,
    children: Vec<(Element, bool)>,
    /// "unknown size" sentinel for top-level masters that stream.
    pub size_is_finite: bool,
    /// Coded-size-length override (SPEC_FULL §3): used for reserved-size
    /// placeholders such as the Segment or a not-yet-finalized Cluster.
    pub size_length_override: Option<usize>,
    crc_enabled: bool,
}

impl Master {
    /// Constructs a master for a specific element ID, with its
    /// mandatory+unique children auto-created from the semantic context
    /// (the same context may be reused by several IDs, e.g. nested
    /// `ChapterAtom`s).
    pub fn with_id(id: ElementId, context: &'static SemanticContext) -> Self {
        let mut master = Master {
            id,
            context,
            children: Vec::new(),
            size_is_finite: true,
            size_length_override: None,
            crc_enabled: false,
        };

        for spec in context.children {
            if spec.mandatory && spec.unique {
                master.children.push((spec.instantiate(), false));
            }
        }

        master
    }

    pub fn enable_crc(&mut self, enabled: bool) {
        self.crc_enabled = enabled;
    }

    pub fn set_unknown_size(&mut self) {
        self.size_is_finite = false;
    }

    fn unknown_size_len(&self) -> usize {
        self.size_length_override.unwrap_or(8)
    }

    /// Appends a child in insertion order (§4.3 `push`).
    pub fn push(&mut self, child: Element) {
        self.children.push((child, false));
    }

    /// Inserts a child before `position` (§4.3 `insert`).
    pub fn insert(&mut self, position: usize, child: Element) {
        let position = position.min(self.children.len());
        self.children.insert(position, (child, false));
    }

    /// Removes the child at `index`, unless it is locked.
    pub fn remove(&mut self, index: usize) -> Option<Element> {
        if self.children.get(index).map(|(_, locked)| *locked).unwrap_or(false) {
            return None;
        }

        Some(self.children.remove(index).0)
    }

    /// Marks the child at `index` as locked, preventing implicit
    /// deletion when this master is torn down or mutated (§3 "Lifecycles").
    pub fn lock(&mut self, index: usize) {
        if let Some(entry) = self.children.get_mut(index) {
            entry.1 = true;
        }
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().map(|(e, _)| e)
    }

    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().map(|(e, _)| e)
    }

    pub fn find_first(&self, id: ElementId) -> Option<&Element> {
        self.children.iter().map(|(e, _)| e).find(|e| e.id() == id)
    }

    pub fn find_first_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.children.iter_mut().map(|(e, _)| e).find(|e| e.id() == id)
    }

    /// `find_next(id, last)`: returns the first child with `id` whose
    /// index is greater than `last`'s index.
    pub fn find_next<'a>(&'a self, id: ElementId, last: &Element) -> Option<&'a Element> {
        let last_ptr = last as *const Element as usize;
        let last_idx = self
            .children
            .iter()
            .position(|(e, _)| e as *const Element as usize == last_ptr)?;

        self.children[last_idx + 1..]
            .iter()
            .map(|(e, _)| e)
            .find(|e| e.id() == id)
    }

    pub fn find_all(&self, id: ElementId) -> impl Iterator<Item = &Element> {
        self.children.iter().map(|(e, _)| e).filter(move |e| e.id() == id)
    }

    /// `check_mandatory()` (§4.3): every mandatory spec must have at
    /// least one matching child; unique specs must have at most one.
    /// Recurses into nested masters.
    pub fn check_mandatory(&self) -> Result<(), EbmlError> {
        for spec in self.context.children {
            let count = self.children.iter().filter(|(e, _)| e.id() == spec.id).count();

            if spec.mandatory && count == 0 {
                return Err(EbmlError::MissingMandatory {
                    name: spec.name,
                    id: spec.id,
                });
            }

            if spec.unique && count > 1 {
                return Err(EbmlError::DuplicateUnique {
                    name: spec.name,
                    id: spec.id,
                });
            }
        }

        for (child, _) in &self.children {
            if let Element::Master(m) = child {
                m.check_mandatory()?;
            }
        }

        Ok(())
    }

    fn content_size(&self, with_default: bool) -> u64 {
        let children_size: u64 = self
            .children
            .iter()
            .map(|(e, _)| {
                let spec = self.context.spec_for(e.id());
                let force = spec.map(|s| s.mandatory && s.unique).unwrap_or(false);
                e.update_size(with_default, force)
            })
            .sum();

        if self.crc_enabled {
            children_size + crc32_element_size()
        } else {
            children_size
        }
    }

    fn render_body(&self, with_default: bool, _force_render: bool, out: &mut Vec<u8>) -> Result<(), EbmlError> {
        if !self.size_is_finite {
            write_size(UNKNOWN_SIZE, Some(self.unknown_size_len()), out)?;
        } else {
            let content = self.content_size(with_default);
            write_size(content, self.size_length_override, out)?;
        }

        let mut body = Vec::new();
        for (child, _) in &self.children {
            let spec = self.context.spec_for(child.id());
            let force = spec.map(|s| s.mandatory && s.unique).unwrap_or(false);
            child.render(with_default, force, &mut body)?;
        }

        if self.crc_enabled {
            let crc = crc32(&body);
            let mut crc_bytes = Vec::new();
            write_id(CRC32_ID, 1, &mut crc_bytes);
            write_size(4, None, &mut crc_bytes)?;
            crc_bytes.extend_from_slice(&crc.to_be_bytes());

            out.extend_from_slice(&crc_bytes);
        }

        out.extend_from_slice(&body);

        Ok(())
    }

    /// Verifies a previously rendered CRC-32 (§4.3 "Verification"): the
    /// first child must be the `EbmlCrc32` element; the remaining bytes
    /// must hash to the stored value.
    pub fn verify_crc(&self) -> Result<(), EbmlError> {
        let Some(Element::Binary { value: stored, .. }) = self.children.first().map(|(e, _)| e) else {
            return Ok(());
        };

        if self.children.first().map(|(e, _)| e.id()) != Some(CRC32_ID) {
            return Ok(());
        }

        let mut body = Vec::new();
        for (child, _) in self.children.iter().skip(1) {
            child.render(true, true, &mut body)?;
        }

        let computed = crc32(&body);
        let stored = u32::from_be_bytes(stored.clone().try_into().unwrap_or([0; 4]));

        if stored != computed {
            return Err(EbmlError::Crc32Mismatch(self.context.name, stored, computed));
        }

        Ok(())
    }

    fn parse_body(id: ElementId, context: &'static SemanticContext, mut input: &[u8]) -> Result<Master, EbmlError> {
        let mut master = Master {
            id,
            context,
            children: Vec::new(),
            size_is_finite: true,
            size_length_override: None,
            crc_enabled: false,
        };

        while !input.is_empty() {
            if input.iter().all(|&b| b == 0) {
                // Trailing Void/padding without a proper header; stop.
                break;
            }

            let (element, consumed) = Element::parse(input, context)?;

            if element.id() == CRC32_ID {
                master.crc_enabled = true;
            }

            master.children.push((element, false));
            input = &input[consumed..];
        }

        Ok(master)
    }
}

fn crc32_element_size() -> u64 {
    // 1 byte ID + 1 byte size + 4 byte value.
    6
}

impl fmt::Debug for Master {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.context.name)
            .field("children", &self.children.iter().map(|(e, _)| e).collect::<Vec<_>>())
            .finish()
    }
}

impl Clone for Master {
    /// `clone()` (§4.3): deep-copies children via the same instantiate
    /// path, then overwrites with the current values.
    fn clone(&self) -> Self {
        let mut cloned = Master {
            id: self.id,
            context: self.context,
            children: Vec::new(),
            size_is_finite: self.size_is_finite,
            size_length_override: self.size_length_override,
            crc_enabled: self.crc_enabled,
        };

        for (child, locked) in &self.children {
            cloned.children.push((child.clone_value(), *locked));
        }

        cloned
    }
}

impl Element {
    /// Deep-clones a single element, used by `Master::clone`.
    fn clone_value(&self) -> Element {
        match self {
            Element::UInt {
                id,
                name,
                value,
                value_is_set,
                default,
            } => Element::UInt {
                id: *id,
                name,
                value: *value,
                value_is_set: *value_is_set,
                default: *default,
            },
            Element::Int {
                id,
                name,
                value,
                value_is_set,
                default,
            } => Element::Int {
                id: *id,
                name,
                value: *value,
                value_is_set: *value_is_set,
                default: *default,
            },
            Element::Float {
                id,
                name,
                value,
                value_is_set,
                size,
                default,
            } => Element::Float {
                id: *id,
                name,
                value: *value,
                value_is_set: *value_is_set,
                size: *size,
                default: *default,
            },
            Element::Str {
                id,
                name,
                value,
                value_is_set,
                default,
                default_size,
            } => Element::Str {
                id: *id,
                name,
                value: value.clone(),
                value_is_set: *value_is_set,
                default: default.clone(),
                default_size: *default_size,
            },
            Element::Binary {
                id,
                name,
                value,
                value_is_set,
            } => Element::Binary {
                id: *id,
                name,
                value: value.clone(),
                value_is_set: *value_is_set,
            },
            Element::Date {
                id,
                name,
                value,
                value_is_set,
            } => Element::Date {
                id: *id,
                name,
                value: *value,
                value_is_set: *value_is_set,
            },
            Element::Master(m) => Element::Master(m.clone()),
            Element::Void { len } => Element::Void { len: *len },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static LEAF: SemanticContext = SemanticContext {
        name: "Leaf",
        children: &[],
    };

    static CHILD_CTX: SemanticContext = SemanticContext {
        name: "Child",
        children: &[ChildSpec {
            id: 0x01,
            name: "Value",
            kind: ElementKind::UnsignedInt,
            mandatory: true,
            unique: true,
            default: DefaultValue::UInt(0),
            default_size: None,
            nested: None,
        }],
    };

    static ROOT_CTX: SemanticContext = SemanticContext {
        name: "Root",
        children: &[
            ChildSpec {
                id: 0x02,
                name: "Name",
                kind: ElementKind::Utf8,
                mandatory: false,
                unique: true,
                default: DefaultValue::None,
                default_size: None,
                nested: None,
            },
            ChildSpec {
                id: 0x83,
                name: "Child",
                kind: ElementKind::Master,
                mandatory: true,
                unique: true,
                default: DefaultValue::None,
                default_size: None,
                nested: Some(&CHILD_CTX),
            },
        ],
    };

    #[test]
    fn mandatory_unique_children_are_auto_created() {
        let master = Master::with_id(0x1234, &ROOT_CTX);
        assert!(master.find_first(0x83).is_some());
        assert!(master.find_first(0x02).is_none());
    }

    #[test]
    fn check_mandatory_passes_when_satisfied() {
        let master = Master::with_id(0x1234, &ROOT_CTX);
        assert!(master.check_mandatory().is_ok());
    }

    #[test]
    fn check_mandatory_fails_when_missing() {
        let master = Master {
            id: 0x1234,
            context: &ROOT_CTX,
            children: Vec::new(),
            size_is_finite: true,
            size_length_override: None,
            crc_enabled: false,
        };

        assert!(matches!(
            master.check_mandatory(),
            Err(EbmlError::MissingMandatory { .. })
        ));
    }

    #[test]
    fn render_then_parse_roundtrips() {
        let mut master = Master::with_id(0x1234, &ROOT_CTX);
        master.find_first_mut(0x02).is_none().then(|| {
            let mut name = ChildSpec {
                id: 0x02,
                name: "Name",
                kind: ElementKind::Utf8,
                mandatory: false,
                unique: true,
                default: DefaultValue::None,
                default_size: None,
                nested: None,
            }
            .instantiate();
            name.set_str("hello");
            master.push(name);
        });

        if let Some(Element::Master(child)) = master.find_first_mut(0x83) {
            child.find_first_mut(0x01).unwrap().set_uint(42);
        }

        let mut out = Vec::new();
        Element::Master(master).render(false, true, &mut out).unwrap();

        let (parsed, consumed) = Element::parse(&out, &ROOT_CTX).unwrap();
        assert_eq!(consumed, out.len());

        let parsed_master = parsed.as_master().unwrap();
        assert_eq!(parsed_master.find_first(0x02).unwrap().as_str(), Some("hello"));

        let child = parsed_master.find_first(0x83).unwrap().as_master().unwrap();
        assert_eq!(child.find_first(0x01).unwrap().as_uint(), Some(42));
    }

    #[test]
    fn default_value_elided_without_with_default() {
        let spec = ChildSpec {
            id: 0x55,
            name: "Scale",
            kind: ElementKind::UnsignedInt,
            mandatory: false,
            unique: true,
            default: DefaultValue::UInt(1_000_000),
            default_size: None,
            nested: None,
        };

        let mut element = spec.instantiate();
        element.set_uint(1_000_000);
        assert!(element.is_default_value());

        let mut out = Vec::new();
        element.render(false, false, &mut out).unwrap();
        assert!(out.is_empty());

        element.set_uint(2_000_000);
        assert!(!element.is_default_value());

        let mut out = Vec::new();
        element.render(false, false, &mut out).unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn crc32_roundtrips() {
        let mut child = ChildSpec {
            id: 0x01,
            name: "Value",
            kind: ElementKind::UnsignedInt,
            mandatory: true,
            unique: true,
            default: DefaultValue::UInt(0),
            default_size: None,
            nested: None,
        }
        .instantiate();
        child.set_uint(7);

        let mut master = Master::with_id(0x1234, &CHILD_CTX);
        master.enable_crc(true);
        *master.find_first_mut(0x01).unwrap() = child;

        let mut out = Vec::new();
        Element::Master(master).render(true, true, &mut out).unwrap();

        let (parsed, _) = Element::parse(&out, &CHILD_CTX).unwrap();
        let parsed = parsed.as_master().unwrap();
        assert!(parsed.verify_crc().is_ok());
    }

    #[test]
    fn uint_width_picks_minimal_bytes() {
        assert_eq!(uint_width(0), 1);
        assert_eq!(uint_width(255), 1);
        assert_eq!(uint_width(256), 2);
        assert_eq!(uint_width(u64::MAX), 8);
    }
}
