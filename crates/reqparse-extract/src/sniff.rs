//! Content-based file type detection.
//!
//! Uploads are classified by their leading bytes, never by the client's
//! filename or declared content type. Magic numbers come from `infer`, with
//! extra matchers for the container formats it does not know (3GP, Ogg
//! Theora, RealMedia, JPEG 2000 multi-layer) and a text heuristic for CSV.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::OnceLock;

use infer::Infer;

use crate::{ErrorCode, ParseError};

/// Number of leading bytes inspected when sniffing.
pub const SNIFF_LEN: u64 = 3072;

fn sniffer() -> &'static Infer {
    static INFER: OnceLock<Infer> = OnceLock::new();
    INFER.get_or_init(|| {
        // Custom matchers run before the built-in table.
        let mut info = Infer::new();
        info.add("video/3gpp", "3gp", is_3gp);
        info.add("video/ogg", "ogv", is_ogg_theora);
        info.add("application/vnd.rn-realmedia-vbr", "rmvb", is_realmedia);
        info.add("image/jpm", "jpm", is_jpm);
        info
    })
}

fn is_3gp(buf: &[u8]) -> bool {
    buf.len() > 11 && &buf[4..8] == b"ftyp" && &buf[8..11] == b"3gp"
}

/// Ogg stream whose first packet is a Theora header.
fn is_ogg_theora(buf: &[u8]) -> bool {
    buf.starts_with(b"OggS") && buf.get(28..35) == Some(&b"\x80theora"[..])
}

fn is_realmedia(buf: &[u8]) -> bool {
    buf.starts_with(b".RMF")
}

/// JPEG 2000 signature box followed by a `jpm ` file type brand.
fn is_jpm(buf: &[u8]) -> bool {
    buf.starts_with(b"\x00\x00\x00\x0cjP  \r\n\x87\n")
        && buf.get(16..20) == Some(&b"ftyp"[..])
        && buf.get(20..24) == Some(&b"jpm "[..])
}

/// UTF-8 text with at least two records of the same column count (> 1).
///
/// When `truncated` is set the last line may be cut short and is ignored.
fn is_csv(head: &[u8], truncated: bool) -> bool {
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(err) if truncated && err.error_len().is_none() => {
            std::str::from_utf8(&head[..err.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return false,
    };

    if text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\r' | '\n'))
    {
        return false;
    }

    let mut records: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if truncated && !text.ends_with('\n') {
        records.pop();
    }
    if records.len() < 2 {
        return false;
    }

    let columns = column_count(records[0]);
    columns > 1 && records.iter().all(|r| column_count(r) == columns)
}

fn column_count(record: &str) -> usize {
    let mut quoted = false;
    let mut count = 1;
    for c in record.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => count += 1,
            _ => {}
        }
    }
    count
}

/// Detects the extension of a stream from its magic number.
///
/// Reads at most [`SNIFF_LEN`] bytes and seeks back to the start, so the
/// stream can be copied afterwards. Returns the extension with its leading
/// dot, or an empty string when the content is not recognized.
///
/// # Errors
///
/// Returns the underlying I/O error if reading or seeking fails.
///
/// # Example
///
/// ```rust
/// use reqparse_extract::detect_extension;
/// use std::io::Cursor;
///
/// let mut png = Cursor::new(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec());
/// assert_eq!(detect_extension(&mut png).unwrap(), ".png");
/// assert_eq!(png.position(), 0);
///
/// let mut csv = Cursor::new(b"sku,qty\nA-1,2\nB-7,1\n".to_vec());
/// assert_eq!(detect_extension(&mut csv).unwrap(), ".csv");
/// ```
pub fn detect_extension<R: Read + Seek>(reader: &mut R) -> io::Result<String> {
    reader.seek(SeekFrom::Start(0))?;

    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    reader.by_ref().take(SNIFF_LEN).read_to_end(&mut head)?;
    reader.seek(SeekFrom::Start(0))?;

    let truncated = head.len() as u64 >= SNIFF_LEN;
    let extension = sniffer()
        .get(&head)
        .map(|kind| kind.extension())
        .or_else(|| is_csv(&head, truncated).then_some("csv"));

    Ok(extension.map(|ext| format!(".{ext}")).unwrap_or_default())
}

/// Sniffs a stream and checks the result against an allow-list.
///
/// Returns the detected extension on success. The stream is left at its
/// start either way.
///
/// # Errors
///
/// - `EXTENSION_NOT_ALLOWED` for `field` when the sniffed extension (or the
///   empty string, for unknown content) is not in `allowed`
/// - any I/O error raised while sniffing
pub fn validate<R, S>(reader: &mut R, field: &str, allowed: &[S]) -> Result<String, ParseError>
where
    R: Read + Seek,
    S: AsRef<str>,
{
    validate_with(reader, field, |extension| listed(allowed, extension))
}

pub(crate) fn listed<S: AsRef<str>>(allowed: &[S], extension: &str) -> bool {
    allowed.iter().any(|a| a.as_ref() == extension)
}

/// Like [`validate`], with the allow-list given as a predicate.
///
/// # Errors
///
/// Same as [`validate`].
pub fn validate_with<R, F>(reader: &mut R, field: &str, accepts: F) -> Result<String, ParseError>
where
    R: Read + Seek,
    F: Fn(&str) -> bool,
{
    let extension = detect_extension(reader)?;

    if accepts(&extension) {
        Ok(extension)
    } else {
        tracing::debug!(field, extension = %extension, "extension not allowed");
        Err(ParseError::field(field, ErrorCode::ExtensionNotAllowed))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::DEFAULT_ALLOWED_EXTENSIONS;
    use std::io::Cursor;

    pub(crate) const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01";
    pub(crate) const JPEG: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00\x01\x01\x00";
    pub(crate) const PDF: &[u8] = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n";
    const CSV: &[u8] = b"name,age,city\nann,30,oslo\nbob,41,bergen\n";

    /// Default-list entries no content maps to: aliases of a detected
    /// extension (`.jpeg`, `.qt`, `.rm`, `.mpeg`, `.mpe`, `.mpv`) and
    /// headerless raw video (`.yuv`).
    const UNREACHABLE: &[&str] = &[".jpeg", ".qt", ".rm", ".mpeg", ".mpe", ".mpv", ".yuv"];

    fn padded(prefix: &[u8], len: usize) -> Vec<u8> {
        let mut buf = prefix.to_vec();
        buf.resize(len.max(prefix.len()), 0);
        buf
    }

    /// A zip whose first entry lives under an OOXML part directory.
    fn ooxml(entry: &[u8]) -> Vec<u8> {
        let mut buf = padded(b"PK\x03\x04", 0x1E);
        buf.extend_from_slice(entry);
        buf.resize(96, 0);
        buf
    }

    fn ogg_theora() -> Vec<u8> {
        let mut buf = padded(b"OggS\x00\x02", 28);
        buf.extend_from_slice(b"\x80theora");
        buf.resize(64, 0);
        buf
    }

    fn sample(extension: &str) -> Option<Vec<u8>> {
        let bytes = match extension {
            ".png" => PNG.to_vec(),
            ".jpg" => JPEG.to_vec(),
            ".pdf" => PDF.to_vec(),
            ".csv" => CSV.to_vec(),
            ".ogv" => ogg_theora(),
            ".ogg" => padded(b"OggS\x00\x02", 64),
            ".jpm" => padded(b"\x00\x00\x00\x0cjP  \r\n\x87\n\x00\x00\x00\x14ftypjpm ", 48),
            ".mp4" => padded(b"\x00\x00\x00\x18ftypmp42", 32),
            ".3gp" => padded(b"\x00\x00\x00\x14ftyp3gp5", 32),
            ".mov" => padded(b"\x00\x00\x00\x14ftypqt  ", 32),
            ".webm" => padded(b"\x1a\x45\xdf\xa3", 64),
            ".mpg" => padded(b"\x00\x00\x01\xba", 16),
            ".flv" => padded(b"FLV\x01", 16),
            ".swf" => padded(b"FWS\x0a", 16),
            ".avi" => padded(b"RIFF\x00\x00\x00\x00AVI LIST", 32),
            ".wmv" => padded(b"\x30\x26\xb2\x75\x8e\x66\xcf\x11\xa6\xd9", 32),
            ".rmvb" => padded(b".RMF\x00\x00\x00\x12\x00\x01", 32),
            ".zip" => padded(b"PK\x03\x04", 64),
            ".docx" => ooxml(b"word/document.xml"),
            ".xlsx" => ooxml(b"xl/workbook.xml"),
            ".pptx" => ooxml(b"ppt/presentation.xml"),
            ".7z" => padded(b"7z\xbc\xaf\x27\x1c", 32),
            ".gz" => padded(b"\x1f\x8b\x08", 32),
            _ => return None,
        };
        Some(bytes)
    }

    #[test]
    fn test_detect_known_types() {
        assert_eq!(detect_extension(&mut Cursor::new(PNG)).unwrap(), ".png");
        assert_eq!(detect_extension(&mut Cursor::new(JPEG)).unwrap(), ".jpg");
        assert_eq!(detect_extension(&mut Cursor::new(PDF)).unwrap(), ".pdf");
    }

    #[test]
    fn test_every_default_extension_is_detectable() {
        for &extension in DEFAULT_ALLOWED_EXTENSIONS {
            match sample(extension) {
                Some(bytes) => {
                    let detected =
                        validate(&mut Cursor::new(bytes), "upload", DEFAULT_ALLOWED_EXTENSIONS)
                            .unwrap_or_else(|e| panic!("{extension}: {e}"));
                    assert_eq!(detected, extension);
                }
                None => assert!(
                    UNREACHABLE.contains(&extension),
                    "{extension} has no sample"
                ),
            }
        }
    }

    #[test]
    fn test_archives_and_office_documents_with_default_list() {
        let cases = [
            (padded(b"PK\x03\x04", 64), ".zip"),
            (ooxml(b"word/document.xml"), ".docx"),
            (ooxml(b"xl/workbook.xml"), ".xlsx"),
            (padded(b"\x1f\x8b\x08", 32), ".gz"),
            (padded(b"7z\xbc\xaf\x27\x1c", 32), ".7z"),
        ];

        for (bytes, expected) in cases {
            let ext = validate(&mut Cursor::new(bytes), "attachment", DEFAULT_ALLOWED_EXTENSIONS)
                .unwrap();
            assert_eq!(ext, expected);
        }
    }

    #[test]
    fn test_ogg_theora_is_video_and_plain_ogg_is_not() {
        assert_eq!(detect_extension(&mut Cursor::new(ogg_theora())).unwrap(), ".ogv");
        assert_eq!(
            detect_extension(&mut Cursor::new(padded(b"OggS\x00\x02", 64))).unwrap(),
            ".ogg"
        );
    }

    #[test]
    fn test_csv_with_default_list() {
        let ext = validate(&mut Cursor::new(CSV), "report", DEFAULT_ALLOWED_EXTENSIONS).unwrap();
        assert_eq!(ext, ".csv");
    }

    #[test]
    fn test_csv_quoted_commas_and_crlf() {
        let csv = b"id,label\r\n1,\"a, b\"\r\n2,plain\r\n";
        assert_eq!(detect_extension(&mut Cursor::new(&csv[..])).unwrap(), ".csv");
    }

    #[test]
    fn test_csv_truncated_tail_is_ignored() {
        let mut data = Vec::new();
        while data.len() < SNIFF_LEN as usize {
            data.extend_from_slice(b"2024-01-01,42,ok\n");
        }
        data.extend_from_slice(b"2024-01-02,43,ok\n");
        // The sniff window ends mid-record.
        assert_ne!(SNIFF_LEN as usize % b"2024-01-01,42,ok\n".len(), 0);

        assert_eq!(detect_extension(&mut Cursor::new(data)).unwrap(), ".csv");
    }

    #[test]
    fn test_text_that_is_not_csv() {
        let prose = b"just some words\nwith no columns\n";
        let ragged = b"a,b,c\n1,2\n";
        let single = b"a,b\n";
        let binary = b"a,b\n\x00\x01,\x02\n";

        for input in [&prose[..], &ragged[..], &single[..], &binary[..]] {
            assert_eq!(detect_extension(&mut Cursor::new(input)).unwrap(), "");
        }
    }

    #[test]
    fn test_detect_unknown_is_empty() {
        let mut text = Cursor::new(b"just some words".to_vec());
        assert_eq!(detect_extension(&mut text).unwrap(), "");

        let mut empty = Cursor::new(Vec::new());
        assert_eq!(detect_extension(&mut empty).unwrap(), "");
    }

    #[test]
    fn test_detect_rewinds_and_is_repeatable() {
        let mut data = PNG.to_vec();
        data.extend(std::iter::repeat(0u8).take(8000));
        let mut cursor = Cursor::new(data);

        let first = detect_extension(&mut cursor).unwrap();
        assert_eq!(cursor.position(), 0);
        let second = detect_extension(&mut cursor).unwrap();
        assert_eq!(first, second);

        let mut all = Vec::new();
        cursor.read_to_end(&mut all).unwrap();
        assert_eq!(all.len(), PNG.len() + 8000);
    }

    #[test]
    fn test_detect_from_middle_of_stream() {
        let mut cursor = Cursor::new(PNG);
        cursor.set_position(4);
        assert_eq!(detect_extension(&mut cursor).unwrap(), ".png");
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_validate_allowed() {
        let allowed = [".png", ".jpg"];
        let ext = validate(&mut Cursor::new(JPEG), "photo", &allowed).unwrap();
        assert_eq!(ext, ".jpg");
    }

    #[test]
    fn test_validate_rejected() {
        let allowed = vec![".png".to_string()];
        let err = validate(&mut Cursor::new(PDF), "resume_file", allowed.as_slice()).unwrap_err();

        let field = err.as_field().unwrap();
        assert_eq!(field.field(), "resume_file");
        assert_eq!(field.code(), ErrorCode::ExtensionNotAllowed);
    }

    #[test]
    fn test_validate_with_predicate() {
        let ext = validate_with(&mut Cursor::new(PNG), "img", |e| e == ".png").unwrap();
        assert_eq!(ext, ".png");

        let err = validate_with(&mut Cursor::new(PNG), "img", |_| false).unwrap_err();
        assert_eq!(err.error_code(), "EXTENSION_NOT_ALLOWED");
    }

    #[test]
    fn test_validate_unknown_content_rejected() {
        let allowed = [".png"];
        let err = validate(&mut Cursor::new(b"plain".to_vec()), "doc", &allowed).unwrap_err();
        assert_eq!(err.error_code(), "EXTENSION_NOT_ALLOWED");
    }

    #[test]
    fn test_validate_is_case_sensitive() {
        let allowed = [".PNG"];
        assert!(validate(&mut Cursor::new(PNG), "img", &allowed).is_err());
    }
}
