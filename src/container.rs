//! GLB container packing for `.vrma` output.
//!
//! Layout: a 12-byte header (magic, version, total length) followed by one
//! JSON chunk and at most one BIN chunk. Every chunk is prefixed by an 8-byte
//! header (length, type) and padded to a 4-byte boundary: JSON with spaces,
//! BIN with zero bytes.

use std::borrow::Cow;

use gltf::binary::{Glb, Header};

use crate::error::ConvertError;

/// `b"glTF"` read as a little-endian u32.
pub const GLB_MAGIC: u32 = 0x4654_6C67;
pub const GLB_VERSION: u32 = 2;

pub const HEADER_LEN: usize = 12;
pub const CHUNK_HEADER_LEN: usize = 8;

/// Round `len` up to the next multiple of four.
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(4) * 4
}

/// Byte sizes of a container, computed from the unpadded payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerLayout {
    pub json_chunk_len: usize,
    pub bin_chunk_len: Option<usize>,
    pub total_len: usize,
}

impl ContainerLayout {
    pub fn new(json_len: usize, bin_len: Option<usize>) -> Self {
        let json_chunk_len = padded_len(json_len);
        let bin_chunk_len = bin_len.map(padded_len);
        let total_len = HEADER_LEN
            + CHUNK_HEADER_LEN
            + json_chunk_len
            + bin_chunk_len.map_or(0, |len| CHUNK_HEADER_LEN + len);
        Self {
            json_chunk_len,
            bin_chunk_len,
            total_len,
        }
    }
}

/// Pack a JSON document and an optional binary payload into GLB bytes.
///
/// The emitted length is checked against the layout computed up front; a
/// disagreement is returned as an error rather than written out.
pub fn pack_container(json: &[u8], bin: Option<&[u8]>) -> Result<Vec<u8>, ConvertError> {
    let layout = ContainerLayout::new(json.len(), bin.map(<[u8]>::len));
    let total_len = u32::try_from(layout.total_len)
        .map_err(|_| ConvertError::ContainerTooLarge(layout.total_len))?;

    let glb = Glb {
        header: Header {
            magic: GLB_MAGIC.to_le_bytes(),
            version: GLB_VERSION,
            length: total_len,
        },
        json: Cow::Borrowed(json),
        bin: bin.map(Cow::Borrowed),
    };

    let mut out = Vec::with_capacity(layout.total_len);
    glb.to_writer(&mut out)?;

    if out.len() != layout.total_len {
        return Err(ConvertError::ContainerLengthMismatch {
            expected: layout.total_len,
            actual: out.len(),
        });
    }
    let declared = read_u32_le(&out, 8).map_or(0, |value| value as usize);
    if declared != out.len() {
        return Err(ConvertError::ContainerLengthMismatch {
            expected: declared,
            actual: out.len(),
        });
    }

    Ok(out)
}

/// Contents of a GLB container with chunk padding removed from the JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedContainer {
    pub version: u32,
    pub declared_len: usize,
    pub json_chunk_len: usize,
    pub json: Vec<u8>,
    /// BIN chunk bytes including the zero padding.
    pub bin: Option<Vec<u8>>,
}

impl UnpackedContainer {
    pub fn json_value(&self) -> Result<serde_json::Value, ConvertError> {
        Ok(serde_json::from_slice(&self.json)?)
    }
}

/// Read back a container produced by [`pack_container`].
pub fn unpack_container(bytes: &[u8]) -> Result<UnpackedContainer, ConvertError> {
    let glb = Glb::from_slice(bytes)?;
    let json_chunk_len = glb.json.len();
    let trimmed_len = glb
        .json
        .iter()
        .rposition(|byte| *byte != b' ')
        .map_or(0, |last| last + 1);

    Ok(UnpackedContainer {
        version: glb.header.version,
        declared_len: glb.header.length as usize,
        json_chunk_len,
        json: glb.json[..trimmed_len].to_vec(),
        bin: glb.bin.map(Cow::into_owned),
    })
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let word = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
}
