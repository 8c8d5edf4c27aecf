//! Minimal NPZ container: a zip archive of `.npy` arrays.
//!
//! Only what checkpoints need is supported: NPY format 1.0/2.0 headers,
//! C order, little-endian `<f8` and raw `|u1` payloads. Entries are stored
//! uncompressed with a fixed timestamp, so writing the same arrays twice
//! yields byte-identical archives.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{Result, ValidError};

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";
const HEADER_ALIGN: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum NpyData {
    F64(Vec<f64>),
    U8(Vec<u8>),
}

/// One named array inside an archive.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub data: NpyData,
}

impl NpyArray {
    pub fn f64(shape: Vec<usize>, data: Vec<f64>) -> NpyArray {
        NpyArray { shape, data: NpyData::F64(data) }
    }

    /// A 1-D byte array; used for embedded JSON documents.
    pub fn bytes(data: Vec<u8>) -> NpyArray {
        NpyArray { shape: vec![data.len()], data: NpyData::U8(data) }
    }

    fn descr(&self) -> &'static str {
        match self.data {
            NpyData::F64(_) => "<f8",
            NpyData::U8(_) => "|u1",
        }
    }

    /// Serializes the array as a version 1.0 `.npy` file.
    pub fn to_npy(&self) -> Vec<u8> {
        let shape = match self.shape.as_slice() {
            [n] => format!("({},)", n),
            dims => format!(
                "({})",
                dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
            ),
        };
        let mut header = format!(
            "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
            self.descr(),
            shape
        );
        // magic + version + u16 length + header + '\n' must align to 64 bytes.
        let unpadded = NPY_MAGIC.len() + 2 + 2 + header.len() + 1;
        let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
        header.extend(std::iter::repeat(' ').take(padding));
        header.push('\n');

        let mut out = Vec::with_capacity(10 + header.len() + self.payload_len());
        out.extend_from_slice(NPY_MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        match &self.data {
            NpyData::F64(values) => {
                for v in values {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            NpyData::U8(bytes) => out.extend_from_slice(bytes),
        }
        out
    }

    fn payload_len(&self) -> usize {
        match &self.data {
            NpyData::F64(values) => values.len() * 8,
            NpyData::U8(bytes) => bytes.len(),
        }
    }

    /// Parses a `.npy` file written by `to_npy` (or by numpy for the same dtypes).
    pub fn from_npy(bytes: &[u8]) -> Result<NpyArray> {
        if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
            return Err(ValidError::Checkpoint("missing NPY magic".into()));
        }
        let (header_len, data_start) = match bytes[6] {
            1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            2 | 3 if bytes.len() >= 12 => (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            ),
            v => return Err(ValidError::Checkpoint(format!("unsupported NPY version {}", v))),
        };
        let header_end = data_start + header_len;
        let header = bytes
            .get(data_start..header_end)
            .and_then(|h| std::str::from_utf8(h).ok())
            .ok_or_else(|| ValidError::Checkpoint("truncated NPY header".into()))?;

        if !header.contains("'fortran_order': False") {
            return Err(ValidError::Checkpoint("fortran-ordered arrays are not supported".into()));
        }
        let descr = header_value(header, "'descr':")
            .and_then(|v| v.split('\'').nth(1))
            .ok_or_else(|| ValidError::Checkpoint("NPY header has no descr".into()))?;
        let shape = parse_shape(header)?;
        let count = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| ValidError::Checkpoint("NPY shape overflows".into()))?;
        let payload = &bytes[header_end..];

        let data = match descr {
            "<f8" => {
                let byte_len = count
                    .checked_mul(8)
                    .ok_or_else(|| ValidError::Checkpoint("NPY shape overflows".into()))?;
                if payload.len() != byte_len {
                    return Err(ValidError::Checkpoint(format!(
                        "expected {} f64 values, found {} bytes",
                        count,
                        payload.len()
                    )));
                }
                let mut values = Vec::with_capacity(count);
                for chunk in payload.chunks_exact(8) {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(chunk);
                    values.push(f64::from_le_bytes(buf));
                }
                NpyData::F64(values)
            }
            "|u1" => {
                if payload.len() != count {
                    return Err(ValidError::Checkpoint(format!(
                        "expected {} bytes, found {}",
                        count,
                        payload.len()
                    )));
                }
                NpyData::U8(payload.to_vec())
            }
            other => return Err(ValidError::Checkpoint(format!("unsupported dtype '{}'", other))),
        };

        Ok(NpyArray { shape, data })
    }
}

fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    header.find(key).map(|at| header[at + key.len()..].trim_start())
}

fn parse_shape(header: &str) -> Result<Vec<usize>> {
    let rest = header_value(header, "'shape':")
        .ok_or_else(|| ValidError::Checkpoint("NPY header has no shape".into()))?;
    let open = rest.find('(');
    let close = rest.find(')');
    let inner = match (open, close) {
        (Some(o), Some(c)) if o < c => &rest[o + 1..c],
        _ => return Err(ValidError::Checkpoint("malformed NPY shape".into())),
    };
    inner
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            d.parse::<usize>()
                .map_err(|_| ValidError::Checkpoint(format!("bad shape dimension '{}'", d)))
        })
        .collect()
}

/// Writes `arrays` to `path` as an NPZ archive, replacing any existing file.
pub fn write_npz(path: &Path, arrays: &[(String, NpyArray)]) -> Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());

    for (name, array) in arrays {
        zip.start_file(format!("{}.npy", name), options)?;
        zip.write_all(&array.to_npy())?;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    Ok(())
}

/// Reads every array of an NPZ archive, in archive order, without the
/// `.npy` suffix on names.
pub fn read_npz(path: &Path) -> Result<Vec<(String, NpyArray)>> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let mut arrays = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().trim_end_matches(".npy").to_owned();
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        arrays.push((name, NpyArray::from_npy(&bytes)?));
    }
    Ok(arrays)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npy_header_is_aligned_to_64_bytes() {
        let bytes = NpyArray::f64(vec![2, 3], vec![0.0; 6]).to_npy();
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;

        assert_eq!((10 + header_len) % 64, 0);
        assert_eq!(bytes[10 + header_len - 1], b'\n');
        assert_eq!(bytes.len(), 10 + header_len + 6 * 8);
    }

    #[test]
    fn one_dimensional_shapes_keep_the_trailing_comma() {
        let bytes = NpyArray::bytes(b"{}".to_vec()).to_npy();
        let header = String::from_utf8_lossy(&bytes[10..]);
        assert!(header.contains("'shape': (2,)"));
        assert!(header.contains("'descr': '|u1'"));
    }

    #[test]
    fn from_npy_rejects_truncated_payload() {
        let mut bytes = NpyArray::f64(vec![4], vec![1.0, 2.0, 3.0, 4.0]).to_npy();
        bytes.truncate(bytes.len() - 8);
        assert!(matches!(NpyArray::from_npy(&bytes), Err(ValidError::Checkpoint(_))));
    }

    #[test]
    fn from_npy_rejects_shapes_whose_size_overflows() {
        let huge = NpyArray { shape: vec![usize::MAX, 2], data: NpyData::F64(vec![]) }.to_npy();
        let err = NpyArray::from_npy(&huge).unwrap_err();
        assert!(matches!(err, ValidError::Checkpoint(msg) if msg == "NPY shape overflows"));

        let wide = NpyArray { shape: vec![usize::MAX / 4], data: NpyData::F64(vec![]) }.to_npy();
        let err = NpyArray::from_npy(&wide).unwrap_err();
        assert!(matches!(err, ValidError::Checkpoint(msg) if msg == "NPY shape overflows"));
    }

    #[test]
    fn from_npy_rejects_non_npy_bytes() {
        assert!(NpyArray::from_npy(b"PK\x03\x04 not an array").is_err());
    }

    #[test]
    fn archives_are_byte_identical_across_writes() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.npz");
        let second = dir.path().join("b.npz");
        let arrays = vec![
            ("w".to_owned(), NpyArray::f64(vec![1, 2], vec![0.25, -1.5])),
            ("meta".to_owned(), NpyArray::bytes(b"{\"k\":1}".to_vec())),
        ];

        write_npz(&first, &arrays).unwrap();
        write_npz(&second, &arrays).unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
        assert_eq!(read_npz(&first).unwrap(), arrays);
    }
}
