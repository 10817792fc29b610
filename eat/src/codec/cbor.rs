//! CBOR primitives shared by the claim codecs.
//!
//! Encoding goes through [`ciborium::Value`], which already emits the shortest integer and float
//! forms. Decoding works on raw slices: each polymorphic claim looks at the major type of the
//! lead byte, then splits arrays, maps and tags into the raw slices of their children. Item
//! headers are read with [`ciborium_ll::Decoder`], which also reports how many bytes they take.

use std::io::Cursor;

use ciborium_ll::{self as ll, Decoder, Header};
use serde::de::DeserializeOwned;

use crate::config::{Config, IndefiniteLength};
use crate::error::{Error, Result};

pub const MAJOR_UINT: u8 = 0x00;
pub const MAJOR_NINT: u8 = 0x20;
pub const MAJOR_BYTES: u8 = 0x40;
pub const MAJOR_TEXT: u8 = 0x60;
pub const MAJOR_ARRAY: u8 = 0x80;
pub const MAJOR_MAP: u8 = 0xa0;
pub const MAJOR_TAG: u8 = 0xc0;
pub const MAJOR_SIMPLE: u8 = 0xe0;

/// Epoch-based date/time, RFC 8949 section 3.4.2
pub const TAG_EPOCH: u64 = 1;
/// URI, RFC 8949 section 3.4.5.3
pub const TAG_URI: u64 = 32;

const MAX_DEPTH: usize = 64;

/// Major type of the first item, or `None` for empty input.
pub fn major(data: &[u8]) -> Option<u8> {
    data.first().map(|b| b & 0xe0)
}

pub fn is_array(data: &[u8]) -> bool {
    major(data) == Some(MAJOR_ARRAY)
}

pub fn is_map(data: &[u8]) -> bool {
    major(data) == Some(MAJOR_MAP)
}

pub fn is_text(data: &[u8]) -> bool {
    major(data) == Some(MAJOR_TEXT)
}

pub fn is_bytes(data: &[u8]) -> bool {
    major(data) == Some(MAJOR_BYTES)
}

pub fn is_tag(data: &[u8]) -> bool {
    major(data) == Some(MAJOR_TAG)
}

/// Human readable name of the first item's type, used in error messages.
pub fn describe(data: &[u8]) -> &'static str {
    match major(data) {
        None => "empty input",
        Some(MAJOR_UINT) => "unsigned integer",
        Some(MAJOR_NINT) => "negative integer",
        Some(MAJOR_BYTES) => "byte string",
        Some(MAJOR_TEXT) => "text string",
        Some(MAJOR_ARRAY) => "array",
        Some(MAJOR_MAP) => "map",
        Some(MAJOR_TAG) => "tag",
        Some(_) => "simple value",
    }
}

/// Reads the header of the first item, returns it with the number of bytes it takes.
fn pull(data: &[u8]) -> Result<(Header, usize)> {
    let mut decoder = Decoder::from(data);

    match decoder.pull() {
        Ok(header) => Ok((header, decoder.offset())),
        Err(ll::Error::Io(_)) => Err(Error::UnexpectedEof),
        Err(ll::Error::Syntax(_)) => Err(Error::Malformed("invalid item header")),
    }
}

fn check_indefinite(config: &Config) -> Result<()> {
    match config.indefinite_length() {
        IndefiniteLength::Reject => Err(Error::Malformed("indefinite-length item")),
        IndefiniteLength::Allow => Ok(()),
    }
}

/// Length in bytes of the first encoded item in `data`.
pub fn item_len(data: &[u8], config: &Config) -> Result<usize> {
    item_len_at(data, config, 0)
}

fn item_len_at(data: &[u8], config: &Config, depth: usize) -> Result<usize> {
    if depth > MAX_DEPTH {
        return Err(Error::Malformed("nesting too deep"));
    }

    let (header, mut offset) = pull(data)?;

    match header {
        Header::Positive(_) | Header::Negative(_) | Header::Float(_) | Header::Simple(_) => {
            Ok(offset)
        }
        Header::Break => Err(Error::Malformed("unexpected break")),
        Header::Bytes(Some(len)) | Header::Text(Some(len)) => {
            let end = offset.checked_add(len).ok_or(Error::UnexpectedEof)?;

            if end > data.len() {
                return Err(Error::UnexpectedEof);
            }

            Ok(end)
        }
        Header::Bytes(None) | Header::Text(None) => {
            check_indefinite(config)?;

            let is_bytes = matches!(header, Header::Bytes(None));

            loop {
                let chunk = rest(data, offset)?;

                match pull(chunk)? {
                    (Header::Break, len) => return Ok(offset + len),
                    (Header::Bytes(Some(_)), _) if is_bytes => {}
                    (Header::Text(Some(_)), _) if !is_bytes => {}
                    _ => return Err(Error::Malformed("invalid indefinite-length string chunk")),
                }

                offset += item_len_at(chunk, config, depth + 1)?;
            }
        }
        Header::Array(Some(len)) => {
            for _ in 0..len {
                offset += item_len_at(rest(data, offset)?, config, depth + 1)?;
            }

            Ok(offset)
        }
        Header::Map(Some(len)) => {
            for _ in 0..len {
                offset += item_len_at(rest(data, offset)?, config, depth + 1)?;
                offset += item_len_at(rest(data, offset)?, config, depth + 1)?;
            }

            Ok(offset)
        }
        Header::Array(None) | Header::Map(None) => {
            check_indefinite(config)?;

            let per_entry = if matches!(header, Header::Map(None)) { 2 } else { 1 };

            loop {
                if let (Header::Break, len) = pull(rest(data, offset)?)? {
                    return Ok(offset + len);
                }

                for _ in 0..per_entry {
                    offset += item_len_at(rest(data, offset)?, config, depth + 1)?;
                }
            }
        }
        Header::Tag(_) => Ok(offset + item_len_at(rest(data, offset)?, config, depth + 1)?),
    }
}

fn rest(data: &[u8], offset: usize) -> Result<&[u8]> {
    match data.get(offset..) {
        Some(rest) if !rest.is_empty() => Ok(rest),
        _ => Err(Error::UnexpectedEof),
    }
}

/// Whether the item at `offset` is the break closing an indefinite-length container.
fn at_break(data: &[u8], offset: usize) -> Result<bool> {
    let (header, _) = pull(rest(data, offset)?)?;

    Ok(matches!(header, Header::Break))
}

/// Checks that `data` holds exactly one well formed item.
pub fn single<'a>(data: &'a [u8], config: &Config) -> Result<&'a [u8]> {
    let len = item_len(data, config)?;

    if len != data.len() {
        return Err(Error::TrailingData(data.len() - len));
    }

    Ok(data)
}

/// Splits an encoded array into the raw items it contains.
pub fn split_array<'a>(data: &'a [u8], config: &Config) -> Result<Vec<&'a [u8]>> {
    if !is_array(data) {
        return Err(Error::unexpected("array", describe(data)));
    }

    let (header, mut offset) = pull(data)?;

    let mut items = Vec::new();

    match header {
        Header::Array(Some(len)) => {
            for _ in 0..len {
                let item = next_item(data, offset, config)?;
                offset += item.len();
                items.push(item);
            }
        }
        Header::Array(None) => {
            check_indefinite(config)?;

            while !at_break(data, offset)? {
                let item = next_item(data, offset, config)?;
                offset += item.len();
                items.push(item);
            }
        }
        _ => return Err(Error::Malformed("invalid array header")),
    }

    Ok(items)
}

/// Splits an encoded map into the raw key and value of each entry, in wire order.
pub fn split_map<'a>(data: &'a [u8], config: &Config) -> Result<Vec<(&'a [u8], &'a [u8])>> {
    if !is_map(data) {
        return Err(Error::unexpected("map", describe(data)));
    }

    let (header, mut offset) = pull(data)?;

    let mut entries = Vec::new();

    let next_entry = |offset: &mut usize| -> Result<(&'a [u8], &'a [u8])> {
        let key = next_item(data, *offset, config)?;
        *offset += key.len();
        let value = next_item(data, *offset, config)?;
        *offset += value.len();

        Ok((key, value))
    };

    match header {
        Header::Map(Some(len)) => {
            for _ in 0..len {
                entries.push(next_entry(&mut offset)?);
            }
        }
        Header::Map(None) => {
            check_indefinite(config)?;

            while !at_break(data, offset)? {
                entries.push(next_entry(&mut offset)?);
            }
        }
        _ => return Err(Error::Malformed("invalid map header")),
    }

    Ok(entries)
}

fn next_item<'a>(data: &'a [u8], offset: usize, config: &Config) -> Result<&'a [u8]> {
    let rest = rest(data, offset)?;
    let len = item_len(rest, config)?;

    Ok(&rest[..len])
}

/// Returns the tag number and the raw tagged item.
pub fn untag<'a>(data: &'a [u8], config: &Config) -> Result<(u64, &'a [u8])> {
    if !is_tag(data) {
        return Err(Error::unexpected("tag", describe(data)));
    }

    let (header, offset) = pull(data)?;

    let Header::Tag(tag) = header else {
        return Err(Error::unexpected("tag", describe(data)));
    };

    let item = next_item(data, offset, config)?;

    Ok((tag, item))
}

/// Decodes a single raw item into `T`.
pub fn decode<T>(data: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    ciborium::from_reader(Cursor::new(data)).map_err(Error::from)
}

pub fn to_vec(value: &ciborium::Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();

    ciborium::into_writer(value, &mut buf)?;

    Ok(buf)
}

/// Decodes an integer map key or tag argument that must fit an `i64`.
pub fn decode_int(data: &[u8]) -> Result<i64> {
    match major(data) {
        Some(MAJOR_UINT | MAJOR_NINT) => {
            let value: i128 = decode(data)?;

            i64::try_from(value).map_err(|_| Error::invalid(format!("integer {value} overflows i64")))
        }
        _ => Err(Error::unexpected("integer", describe(data))),
    }
}
