//! Bounded line sampling from an entry stream.

use std::io::{self, BufRead};

use crate::archive::detect::{UTF16_BE_BOM, UTF16_LE_BOM};

/// Line terminator as the stream encodes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Newline {
    Byte,
    /// Two-byte code units; the array is `\n` in the stream's byte order.
    Utf16([u8; 2]),
}

fn newline_of<R: BufRead>(reader: &mut R) -> io::Result<Newline> {
    let head = reader.fill_buf()?;
    Ok(if head.starts_with(&UTF16_LE_BOM) {
        Newline::Utf16([b'\n', 0])
    } else if head.starts_with(&UTF16_BE_BOM) {
        Newline::Utf16([0, b'\n'])
    } else {
        Newline::Byte
    })
}

/// Read whole code units up to and including `newline`. Returns bytes consumed.
fn read_utf16_line<R: BufRead>(reader: &mut R, out: &mut Vec<u8>, newline: [u8; 2]) -> io::Result<usize> {
    let mut consumed = 0;
    loop {
        let mut unit = [0u8; 2];
        let mut filled = 0;
        while filled < 2 {
            match reader.read(&mut unit[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        out.extend_from_slice(&unit[..filled]);
        consumed += filled;
        if filled < 2 || unit == newline {
            return Ok(consumed);
        }
    }
}

/// Read up to `max_lines` lines from `reader`, keeping original terminators.
///
/// Stops early once `len` bytes have been consumed (when the length is known) so the read
/// never asks for data past the end of the entry. A failed read discards the partial sample.
/// Streams starting with a UTF-16 byte order mark are split on two-byte newlines.
pub fn sample<R: BufRead>(reader: &mut R, max_lines: usize, len: Option<u64>) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    if max_lines == 0 {
        return Ok(out);
    }
    let newline = newline_of(reader)?;
    let mut pos = 0u64;
    for _ in 0..max_lines {
        if len.is_some_and(|end| pos >= end) {
            break;
        }
        let n = match newline {
            Newline::Byte => reader.read_until(b'\n', &mut out)?,
            Newline::Utf16(nl) => read_utf16_line(reader, &mut out, nl)?,
        };
        if n == 0 {
            break;
        }
        pos += n as u64;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    #[test]
    fn takes_first_lines_only() {
        let data = b"h1,h2\r\n1,2\r\n3,4\r\n";
        let out = sample(&mut Cursor::new(&data[..]), 2, Some(data.len() as u64)).unwrap();
        assert_eq!(out, b"h1,h2\r\n1,2\r\n");
    }

    #[test]
    fn short_stream_returns_everything() {
        let data = b"only\nlast-without-newline";
        let out = sample(&mut Cursor::new(&data[..]), 5, Some(data.len() as u64)).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn unknown_length_stops_at_eof() {
        let data = b"a\nb\n";
        let out = sample(&mut Cursor::new(&data[..]), 10, None).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn zero_lines_reads_nothing() {
        let out = sample(&mut Cursor::new(&b"a\n"[..]), 0, None).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn does_not_read_past_known_length() {
        // Anything after the declared length must not be consumed.
        let data = b"a\nb\nTRAILER";
        let mut reader = BufReader::new(&data[..]).take(4);
        let mut buffered = BufReader::new(&mut reader);
        let out = sample(&mut buffered, 3, Some(4)).unwrap();
        assert_eq!(out, b"a\nb\n");
    }

    fn utf16le(text: &str) -> Vec<u8> {
        [0xFF, 0xFE]
            .into_iter()
            .chain(text.encode_utf16().flat_map(u16::to_le_bytes))
            .collect()
    }

    #[test]
    fn utf16_lines_keep_whole_code_units() {
        let data = utf16le("h1,h2\n1,2\n3,4\n");
        let out = sample(&mut Cursor::new(&data[..]), 2, Some(data.len() as u64)).unwrap();
        assert_eq!(out, utf16le("h1,h2\n1,2\n"));
    }

    #[test]
    fn utf16_newline_byte_inside_code_unit_is_not_a_break() {
        // U+0A41 encodes as 41 0A in little-endian.
        let data = utf16le("a\u{0A41}b\nnext\n");
        let out = sample(&mut Cursor::new(&data[..]), 1, None).unwrap();
        assert_eq!(out, utf16le("a\u{0A41}b\n"));
    }

    #[test]
    fn latin1_bytes_pass_through() {
        let data = b"id,city\n1,Montr\xe9al\n2,Z\xfcrich\n";
        let out = sample(&mut Cursor::new(&data[..]), 2, None).unwrap();
        assert_eq!(out, b"id,city\n1,Montr\xe9al\n");
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk gone"))
        }
    }

    #[test]
    fn read_error_surfaces() {
        let mut reader = BufReader::new(Failing);
        assert!(sample(&mut reader, 2, None).is_err());
    }
}
