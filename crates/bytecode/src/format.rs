// SPDX-License-Identifier: MIT

//! Parser for the managed-bytecode container format: magic number,
//! this-class/super-class references, interface table, field table,
//! and method table. Constant-pool-style string storage is collapsed
//! into inline length-prefixed UTF-8 strings for this core; downstream
//! users only need the fully resolved names.

use crate::error::ExtractionFailed;
use crate::metadata::{ClassMetadata, FieldDescriptor, MethodDescriptor};

pub const MAGIC: u32 = 0x4857_4346; // "HWCF"
pub const MAX_SUPPORTED_VERSION: u16 = 1;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let slice = self.bytes.get(self.pos..self.pos + n)?;
        self.pos += n;
        Some(slice)
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        self.take(4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self) -> Option<String> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).ok()
    }
}

/// Parse raw artifact bytes into [`ClassMetadata`].
pub fn parse(bytes: &[u8]) -> Result<ClassMetadata, ExtractionFailed> {
    if bytes.is_empty() {
        return Err(ExtractionFailed::Truncated);
    }
    if bytes.len() > MetadataExtractorLimits::MAX_ARTIFACT_BYTES {
        return Err(ExtractionFailed::TooLarge);
    }

    let mut cursor = Cursor::new(bytes);
    let magic = cursor.u32().ok_or(ExtractionFailed::Truncated)?;
    if magic != MAGIC {
        return Err(ExtractionFailed::UnsupportedFormat);
    }
    let version = cursor.u16().ok_or(ExtractionFailed::Truncated)?;
    if version == 0 || version > MAX_SUPPORTED_VERSION {
        return Err(ExtractionFailed::UnsupportedFormat);
    }

    let class_name = cursor.string().ok_or(ExtractionFailed::Truncated)?;
    if class_name.is_empty() {
        return Err(ExtractionFailed::Malformed);
    }

    let supertype_name = {
        let s = cursor.string().ok_or(ExtractionFailed::Truncated)?;
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    };

    let interface_count = cursor.u16().ok_or(ExtractionFailed::Truncated)? as usize;
    let mut interfaces = Vec::with_capacity(interface_count);
    for _ in 0..interface_count {
        interfaces.push(cursor.string().ok_or(ExtractionFailed::Truncated)?);
    }

    let field_count = cursor.u16().ok_or(ExtractionFailed::Truncated)? as usize;
    let mut fields = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        let name = cursor.string().ok_or(ExtractionFailed::Truncated)?;
        let type_descriptor = cursor.string().ok_or(ExtractionFailed::Truncated)?;
        if name.is_empty() {
            return Err(ExtractionFailed::Malformed);
        }
        fields.push(FieldDescriptor { name, type_descriptor });
    }

    let method_count = cursor.u16().ok_or(ExtractionFailed::Truncated)? as usize;
    let mut methods = Vec::with_capacity(method_count);
    for _ in 0..method_count {
        let name = cursor.string().ok_or(ExtractionFailed::Truncated)?;
        if name.is_empty() {
            return Err(ExtractionFailed::Malformed);
        }
        let param_count = cursor.u16().ok_or(ExtractionFailed::Truncated)? as usize;
        let mut parameter_types = Vec::with_capacity(param_count);
        for _ in 0..param_count {
            parameter_types.push(cursor.string().ok_or(ExtractionFailed::Truncated)?);
        }
        let return_type = cursor.string().ok_or(ExtractionFailed::Truncated)?;
        methods.push(MethodDescriptor {
            name,
            parameter_types,
            return_type,
        });
    }

    Ok(ClassMetadata {
        class_name,
        supertype_name,
        interfaces,
        fields,
        methods,
    })
}

/// Encode [`ClassMetadata`] back into the container format. Used by tests
/// and fixtures to build synthetic artifacts; the real agent only ever
/// reads artifacts produced by the VM's own compiler.
pub fn encode(meta: &ClassMetadata) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    push_string(&mut out, &meta.class_name);
    push_string(&mut out, meta.supertype_name.as_deref().unwrap_or(""));
    out.extend_from_slice(&(meta.interfaces.len() as u16).to_be_bytes());
    for i in &meta.interfaces {
        push_string(&mut out, i);
    }
    out.extend_from_slice(&(meta.fields.len() as u16).to_be_bytes());
    for f in &meta.fields {
        push_string(&mut out, &f.name);
        push_string(&mut out, &f.type_descriptor);
    }
    out.extend_from_slice(&(meta.methods.len() as u16).to_be_bytes());
    for m in &meta.methods {
        push_string(&mut out, &m.name);
        out.extend_from_slice(&(m.parameter_types.len() as u16).to_be_bytes());
        for p in &m.parameter_types {
            push_string(&mut out, p);
        }
        push_string(&mut out, &m.return_type);
    }
    out
}

fn push_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Kept separate from [`crate::error`] so the default ceiling is visible
/// next to the parser that enforces it; callers with a configured
/// `metadata.max-artifact-bytes` should check size themselves before
/// calling [`parse`] if they want a non-default limit.
struct MetadataExtractorLimits;
impl MetadataExtractorLimits {
    const MAX_ARTIFACT_BYTES: usize = 16 * 1024 * 1024;
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;