//! Content-based container detection. File names are never consulted.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;

use crate::error::{SampleError, SampleResult};
use crate::utils::config::SNIFF_LEN;

/// Tar stream compression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TarCompression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

/// Structural kind of a byte stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Zip,
    Rar,
    Tar(TarCompression),
    PlainText,
    Unsupported(String),
}

impl ContainerKind {
    /// True for every kind that is opened as an archive and recursed into.
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Zip | Self::Rar | Self::Tar(_))
    }

    pub fn mime(&self) -> &str {
        match self {
            Self::Zip => "application/zip",
            Self::Rar => "application/vnd.rar",
            Self::Tar(TarCompression::None) => "application/x-tar",
            Self::Tar(TarCompression::Gzip) => "application/gzip",
            Self::Tar(TarCompression::Bzip2) => "application/x-bzip2",
            Self::Tar(TarCompression::Xz) => "application/x-xz",
            Self::PlainText => "text/plain",
            Self::Unsupported(mime) => mime,
        }
    }

    /// Inverse of [`ContainerKind::mime`]; unknown types map to `Unsupported`.
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "application/zip" => Self::Zip,
            "application/vnd.rar" | "application/x-rar-compressed" => Self::Rar,
            "application/x-tar" => Self::Tar(TarCompression::None),
            "application/gzip" | "application/x-gzip" => Self::Tar(TarCompression::Gzip),
            "application/x-bzip" | "application/x-bzip2" => Self::Tar(TarCompression::Bzip2),
            "application/x-xz" => Self::Tar(TarCompression::Xz),
            "text/plain" => Self::PlainText,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

const OCTET_STREAM: &str = "application/octet-stream";
const DIRECTORY_MIME: &str = "inode/directory";

/// Sniff a MIME type from a stream prefix (at most [`SNIFF_LEN`] bytes are inspected).
pub fn sniff_mime(prefix: &[u8]) -> &'static str {
    let prefix = &prefix[..prefix.len().min(SNIFF_LEN)];
    match prefix {
        [b'P', b'K', 0x03, 0x04, ..] | [b'P', b'K', 0x05, 0x06, ..] | [b'P', b'K', 0x07, 0x08, ..] => {
            "application/zip"
        }
        [b'R', b'a', b'r', b'!', 0x1A, 0x07, 0x00, ..]
        | [b'R', b'a', b'r', b'!', 0x1A, 0x07, 0x01, 0x00, ..] => "application/vnd.rar",
        [0x1F, 0x8B, ..] => "application/gzip",
        [b'B', b'Z', b'h', ..] => "application/x-bzip2",
        [0xFD, b'7', b'z', b'X', b'Z', 0x00, ..] => "application/x-xz",
        _ if is_tar_header(prefix) => "application/x-tar",
        _ if looks_like_text(prefix) => "text/plain",
        _ => OCTET_STREAM,
    }
}

/// Classify a stream prefix.
pub fn detect_format(prefix: &[u8]) -> ContainerKind {
    ContainerKind::from_mime(sniff_mime(prefix))
}

fn is_tar_header(data: &[u8]) -> bool {
    data.len() >= 263 && &data[257..262] == b"ustar"
}

/// UTF-16 byte order marks, little- then big-endian.
pub(crate) const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
pub(crate) const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// Text is UTF-16 with a byte order mark, or has no control bytes outside the usual
/// whitespace/escape set. Bytes >= 0x80 are accepted so UTF-8, ISO-8859 and cp1252 all pass.
fn looks_like_text(data: &[u8]) -> bool {
    if data.starts_with(&UTF16_LE_BOM) || data.starts_with(&UTF16_BE_BOM) {
        return true;
    }
    data.iter().all(|&b| is_text_byte(b))
}

/// 0x07..=0x0D (BEL, BS, TAB, LF, VT, FF, CR), ESC, printable ASCII, and any high-bit byte.
fn is_text_byte(b: u8) -> bool {
    matches!(b, 0x07..=0x0D | 0x1B | 0x20..=0x7E | 0x80..=0xFF)
}

fn read_prefix<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    reader.take(SNIFF_LEN as u64).read_to_end(&mut prefix)?;
    Ok(prefix)
}

/// Classify an open seekable stream and rewind it to position zero.
pub fn detect_from_reader<R: Read + Seek>(reader: &mut R) -> io::Result<ContainerKind> {
    let prefix = read_prefix(reader)?;
    reader.rewind()?;
    Ok(detect_format(&prefix))
}

/// Classify a filesystem path. Directories classify as `Unsupported("inode/directory")`.
pub fn detect_path(path: &Path) -> SampleResult<ContainerKind> {
    let display = path.display().to_string();
    let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SampleError::NotFound {
            path: path.to_path_buf(),
        },
        _ => SampleError::io(display.clone(), e),
    })?;
    if meta.is_dir() {
        return Ok(ContainerKind::Unsupported(DIRECTORY_MIME.to_string()));
    }
    let mut file = File::open(path).map_err(|e| SampleError::io(display.clone(), e))?;
    detect_from_reader(&mut file).map_err(|e| SampleError::io(display, e))
}

/// Classify a forward-only stream. The returned reader replays the sniffed prefix,
/// so consumers still see the stream from its first byte.
pub fn sniff_stream<R: Read>(mut reader: R) -> io::Result<(ContainerKind, Cursor<Vec<u8>>, R)> {
    let prefix = read_prefix(&mut reader)?;
    let kind = detect_format(&prefix);
    Ok((kind, Cursor::new(prefix), reader))
}
