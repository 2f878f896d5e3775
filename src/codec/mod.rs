use std::io::{self, Cursor};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Zstd level used for archives (good balance of speed and ratio).
pub const COMPRESSION_LEVEL : i32 = 3;

#[derive(Debug, Error)]
pub enum DecodeError {

    #[error("Could not reverse archive compression: {0}")]
    Transform(#[source] io::Error),

    #[error("Malformed archive document: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Archive has wrong dimensions: {0}")]
    Shape(String),

    #[error("Archive holds invalid variance {value} (label {label:?}, feature {feature})")]
    Variance { label : Option<usize>, feature : usize, value : f64 },

    #[error("Archive holds invalid value: {0}")]
    Value(String),

    #[error("Archive was written by an unknown classifier '{0}'")]
    UnknownType(String),

    #[error("Archive is truncated")]
    Truncated

}

pub fn compress(data : &[u8]) -> io::Result<Vec<u8>> {
    zstd::encode_all(Cursor::new(data), COMPRESSION_LEVEL)
}

pub fn decompress(data : &[u8]) -> Result<Vec<u8>, DecodeError> {
    zstd::decode_all(Cursor::new(data)).map_err(DecodeError::Transform)
}

/// Writes the archive as compressed JSON. Floats are written with their shortest
/// round-trip representation, so decoding recovers them bit-for-bit.
pub fn encode<T>(archive : &T) -> io::Result<Vec<u8>>
where
    T : Serialize
{
    let content = serde_json::to_vec(archive)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    compress(&content[..])
}

pub fn decode<T>(data : &[u8]) -> Result<T, DecodeError>
where
    T : DeserializeOwned
{
    let content = decompress(data)?;
    Ok(serde_json::from_slice(&content[..])?)
}
