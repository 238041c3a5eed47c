use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};

use crate::error::Error;
use crate::raster::SizedBitmap;

/// The length of the ICONDIR file header, in bytes:
const HEADER_LENGTH: usize = 6;

/// The length of one ICONDIRENTRY record, in bytes:
const DIRECTORY_ENTRY_LENGTH: usize = 16;

/// Resource type field value for icons (as opposed to cursors):
const RESOURCE_TYPE_ICON: u16 = 1;

/// The largest edge an ICO directory entry can describe:
const MAX_EDGE: u32 = 256;

/// Encodes PNG bitmaps into a single ICO container.
///
/// Expects at most one bitmap per distinct edge length. Entries that do not
/// begin with the PNG signature, or whose edge exceeds 256 pixels, are
/// skipped with a warning; if nothing usable remains the encoder fails with
/// [`Error::EmptyInput`]. The directory is written sorted ascending by
/// effective edge (a 256-pixel entry encodes its width and height as 0 but
/// still sorts last), with payload offsets assigned as a running sum from
/// the end of the directory.
pub fn encode_ico(bitmaps: &[&SizedBitmap]) -> Result<Vec<u8>, Error> {
    if bitmaps.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut entries: Vec<&SizedBitmap> = Vec::with_capacity(bitmaps.len());
    for &bitmap in bitmaps {
        if !bitmap.has_png_signature() {
            log::warn!("{}", Error::UnsupportedEntry { size: bitmap.size() });
            continue;
        }
        if bitmap.size() == 0 || bitmap.size() > MAX_EDGE {
            log::warn!(
                "skipping {0}x{0} entry: edge not representable in an ICO directory",
                bitmap.size()
            );
            continue;
        }
        entries.push(bitmap);
    }
    if entries.is_empty() {
        return Err(Error::EmptyInput);
    }
    // Strict readers expect the smallest edge first.
    entries.sort_by_key(|bitmap| bitmap.size());

    let directory_end = HEADER_LENGTH + DIRECTORY_ENTRY_LENGTH * entries.len();
    let mut offsets = Vec::with_capacity(entries.len());
    let mut next_offset = directory_end;
    for bitmap in &entries {
        offsets.push(next_offset);
        next_offset += bitmap.byte_length();
    }
    let total_length = next_offset;

    let buffer = write_ico(&entries, &offsets, total_length).map_err(io_invariant)?;
    verify_ico(&buffer, entries.len(), total_length)?;
    Ok(buffer)
}

fn write_ico(
    entries: &[&SizedBitmap],
    offsets: &[usize],
    total_length: usize,
) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(total_length);
    buffer.write_u16::<LittleEndian>(0)?; // reserved
    buffer.write_u16::<LittleEndian>(RESOURCE_TYPE_ICON)?;
    buffer.write_u16::<LittleEndian>(entries.len() as u16)?;
    for (bitmap, &offset) in entries.iter().zip(offsets) {
        // A 256-pixel edge is written as 0 in the one-byte fields.
        let edge = if bitmap.size() == MAX_EDGE { 0 } else { bitmap.size() as u8 };
        buffer.write_u8(edge)?; // width
        buffer.write_u8(edge)?; // height
        buffer.write_u8(0)?; // color count (0 for PNG payloads)
        buffer.write_u8(0)?; // reserved
        buffer.write_u16::<LittleEndian>(1)?; // color planes
        buffer.write_u16::<LittleEndian>(32)?; // bits per pixel
        buffer.write_u32::<LittleEndian>(bitmap.byte_length() as u32)?;
        buffer.write_u32::<LittleEndian>(offset as u32)?;
    }
    for bitmap in entries {
        buffer.write_all(bitmap.data())?;
    }
    Ok(buffer)
}

/// Re-parses the header and directory of a freshly encoded buffer. A
/// mismatch here is an encoder bug, reported as [`Error::Invariant`].
fn verify_ico(
    buffer: &[u8],
    expected_count: usize,
    expected_length: usize,
) -> Result<(), Error> {
    if buffer.len() != expected_length {
        return Err(Error::Invariant(format!(
            "encoded {} bytes, computed {}",
            buffer.len(),
            expected_length
        )));
    }
    let mut cursor = Cursor::new(buffer);
    let reserved = cursor.read_u16::<LittleEndian>().map_err(io_invariant)?;
    let restype = cursor.read_u16::<LittleEndian>().map_err(io_invariant)?;
    let count = cursor.read_u16::<LittleEndian>().map_err(io_invariant)?;
    if reserved != 0 || restype != RESOURCE_TYPE_ICON || count as usize != expected_count {
        return Err(Error::Invariant(format!(
            "bad ICONDIR header ({}, {}, {})",
            reserved, restype, count
        )));
    }
    let mut previous_edge = 0u32;
    let mut previous_end = HEADER_LENGTH + DIRECTORY_ENTRY_LENGTH * expected_count;
    for _ in 0..count {
        let width = cursor.read_u8().map_err(io_invariant)?;
        let edge = if width == 0 { MAX_EDGE } else { u32::from(width) };
        cursor.read_exact(&mut [0u8; 7]).map_err(io_invariant)?;
        let data_size = cursor.read_u32::<LittleEndian>().map_err(io_invariant)?;
        let data_offset = cursor.read_u32::<LittleEndian>().map_err(io_invariant)?;
        if edge < previous_edge {
            return Err(Error::Invariant("directory not sorted by edge".to_string()));
        }
        if data_offset as usize != previous_end {
            return Err(Error::Invariant("payload offsets not contiguous".to_string()));
        }
        previous_edge = edge;
        previous_end = data_offset as usize + data_size as usize;
    }
    if previous_end != buffer.len() {
        return Err(Error::Invariant("payload region does not fill the file".to_string()));
    }
    Ok(())
}

fn io_invariant(err: io::Error) -> Error {
    Error::Invariant(err.to_string())
}
