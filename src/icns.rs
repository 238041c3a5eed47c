use byteorder::{BigEndian, WriteBytesExt};
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::error::Error;
use crate::raster::SizedBitmap;

/// The first four bytes of an ICNS file:
const ICNS_MAGIC_LITERAL: &[u8; 4] = b"icns";

/// The length of an ICNS file header, in bytes:
const FILE_HEADER_LENGTH: usize = 8;

/// The length of an icon entry header, in bytes:
const ENTRY_HEADER_LENGTH: usize = 8;

/// A Macintosh OSType (also known as a ResType), used in ICNS files to
/// identify the resolution and encoding of each icon entry.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OsType(pub [u8; 4]);

impl fmt::Display for OsType {
    fn fmt(&self, out: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let &OsType(raw) = self;
        for &byte in &raw {
            write!(out, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

impl FromStr for OsType {
    type Err = String;

    fn from_str(input: &str) -> Result<OsType, String> {
        let bytes = input.as_bytes();
        if bytes.len() != 4 {
            Err(format!("OSType string must be 4 bytes (was {})", bytes.len()))
        } else {
            let mut raw = [0u8; 4];
            raw.clone_from_slice(bytes);
            Ok(OsType(raw))
        }
    }
}

/// Returns the OSType identifying a PNG-payload icon entry with the given
/// edge length, or `None` if no ICNS entry type has that resolution.
pub fn os_type_for_edge(edge: u32) -> Option<OsType> {
    match edge {
        16 => Some(OsType(*b"icp4")),
        32 => Some(OsType(*b"icp5")),
        64 => Some(OsType(*b"icp6")),
        128 => Some(OsType(*b"ic07")),
        256 => Some(OsType(*b"ic08")),
        512 => Some(OsType(*b"ic09")),
        1024 => Some(OsType(*b"ic10")),
        _ => None,
    }
}

/// Encodes PNG bitmaps into a single ICNS container.
///
/// Each bitmap's entry type is chosen solely by its edge length via
/// [`os_type_for_edge`]; bitmaps with an unrecognized edge, or without a
/// PNG signature, are dropped with a warning. Entries are written in input
/// order (readers locate entries by type, not position). Fails with
/// [`Error::EmptyInput`] if no usable entries remain.
pub fn encode_icns(bitmaps: &[&SizedBitmap]) -> Result<Vec<u8>, Error> {
    if bitmaps.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut entries: Vec<(OsType, &SizedBitmap)> = Vec::with_capacity(bitmaps.len());
    for &bitmap in bitmaps {
        if !bitmap.has_png_signature() {
            log::warn!("{}", Error::UnsupportedEntry { size: bitmap.size() });
            continue;
        }
        match os_type_for_edge(bitmap.size()) {
            Some(ostype) => entries.push((ostype, bitmap)),
            None => {
                log::warn!(
                    "skipping {0}x{0} entry: no ICNS entry type has that resolution",
                    bitmap.size()
                );
            }
        }
    }
    if entries.is_empty() {
        return Err(Error::EmptyInput);
    }

    // Total length is known up front, so the buffer never reallocates.
    let total_length = FILE_HEADER_LENGTH
        + entries
            .iter()
            .map(|(_, bitmap)| ENTRY_HEADER_LENGTH + bitmap.byte_length())
            .sum::<usize>();

    write_icns(&entries, total_length).map_err(|err| Error::Invariant(err.to_string()))
}

fn write_icns(entries: &[(OsType, &SizedBitmap)], total_length: usize) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(total_length);
    buffer.write_all(ICNS_MAGIC_LITERAL)?;
    buffer.write_u32::<BigEndian>(total_length as u32)?;
    for (ostype, bitmap) in entries {
        let OsType(raw) = ostype;
        buffer.write_all(raw)?;
        buffer.write_u32::<BigEndian>((ENTRY_HEADER_LENGTH + bitmap.byte_length()) as u32)?;
        buffer.write_all(bitmap.data())?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::PNG_SIGNATURE;
    use byteorder::{BigEndian, ReadBytesExt};
    use std::io::{Cursor, Read};

    fn fake_png(size: u32, filler: u8) -> SizedBitmap {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend(std::iter::repeat(filler).take(16));
        SizedBitmap::new(size, data)
    }

    fn entries(buffer: &[u8]) -> Vec<(OsType, Vec<u8>)> {
        let mut cursor = Cursor::new(buffer);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic).unwrap();
        assert_eq!(&magic, ICNS_MAGIC_LITERAL);
        let file_length = cursor.read_u32::<BigEndian>().unwrap();
        assert_eq!(file_length as usize, buffer.len());
        let mut result = Vec::new();
        while (cursor.position() as usize) < buffer.len() {
            let mut raw = [0u8; 4];
            cursor.read_exact(&mut raw).unwrap();
            let entry_length = cursor.read_u32::<BigEndian>().unwrap();
            let mut payload = vec![0u8; entry_length as usize - ENTRY_HEADER_LENGTH];
            cursor.read_exact(&mut payload).unwrap();
            result.push((OsType(raw), payload));
        }
        result
    }

    #[test]
    fn os_type_table_matches_edges() {
        let expected = [
            (16, "icp4"),
            (32, "icp5"),
            (64, "icp6"),
            (128, "ic07"),
            (256, "ic08"),
            (512, "ic09"),
            (1024, "ic10"),
        ];
        for (edge, tag) in expected {
            assert_eq!(os_type_for_edge(edge).unwrap().to_string(), tag);
        }
        assert_eq!(os_type_for_edge(48), None);
    }

    #[test]
    fn os_type_to_and_from_str() {
        let ostype = OsType::from_str("abcd").expect("failed to parse OSType");
        assert_eq!(ostype.to_string(), "abcd".to_string());
        assert!(OsType::from_str("abc").is_err());
        assert!(OsType::from_str("abcde").is_err());
    }

    #[test]
    fn empty_input_is_rejected() {
        match encode_icns(&[]) {
            Err(Error::EmptyInput) => {}
            other => panic!("expected EmptyInput, got {:?}", other),
        }
    }

    #[test]
    fn length_field_and_tags_parse_back() {
        let bitmaps = [fake_png(512, 1), fake_png(16, 2)];
        let refs: Vec<&SizedBitmap> = bitmaps.iter().collect();
        let buffer = encode_icns(&refs).unwrap();
        let parsed = entries(&buffer);
        // Input order is preserved, not size-sorted.
        assert_eq!(parsed[0].0, OsType(*b"ic09"));
        assert_eq!(parsed[1].0, OsType(*b"icp4"));
    }

    #[test]
    fn payloads_round_trip() {
        let bitmaps = [fake_png(16, 7), fake_png(32, 9)];
        let refs: Vec<&SizedBitmap> = bitmaps.iter().collect();
        let buffer = encode_icns(&refs).unwrap();
        let parsed = entries(&buffer);
        assert_eq!(parsed[0].1, bitmaps[0].data());
        assert_eq!(parsed[1].1, bitmaps[1].data());
    }

    #[test]
    fn unrecognized_edge_is_dropped() {
        let odd = fake_png(17, 0);
        let good = fake_png(128, 0);
        let buffer = encode_icns(&[&odd, &good]).unwrap();
        let parsed = entries(&buffer);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, OsType(*b"ic07"));
    }

    #[test]
    fn only_unrecognized_edges_is_empty_input() {
        let odd = fake_png(17, 0);
        match encode_icns(&[&odd]) {
            Err(Error::EmptyInput) => {}
            other => panic!("expected EmptyInput, got {:?}", other),
        }
    }

    #[test]
    fn single_entry_succeeds() {
        let bitmap = fake_png(1024, 3);
        let buffer = encode_icns(&[&bitmap]).unwrap();
        assert_eq!(buffer.len(), 8 + 8 + bitmap.byte_length());
        assert_eq!(entries(&buffer)[0].0, OsType(*b"ic10"));
    }

    #[test]
    fn encoding_is_idempotent() {
        let bitmaps = [fake_png(64, 4), fake_png(256, 5)];
        let refs: Vec<&SizedBitmap> = bitmaps.iter().collect();
        assert_eq!(encode_icns(&refs).unwrap(), encode_icns(&refs).unwrap());
    }
}
