/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Maximum number of leading bytes considered when sniffing a content type
pub const SNIFF_LEN: usize = 512;

/// Content type used when nothing more specific matches binary data
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Determine the `Content-Type` of `data` from its leading bytes.
///
/// At most the first [`SNIFF_LEN`] bytes are examined. Markup, common document, image,
/// audio/video and archive signatures are recognized. Anything else is reported as
/// `text/plain; charset=utf-8` when it contains no control bytes and
/// [`OCTET_STREAM`] otherwise. Empty input is plain text.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    // markup signatures may be preceded by whitespace
    let first_non_ws = data
        .iter()
        .position(|b| !is_ws(*b))
        .unwrap_or(data.len());
    let trimmed = &data[first_non_ws..];

    if HTML_TAGS.iter().any(|tag| matches_html_tag(trimmed, tag)) {
        return "text/html; charset=utf-8";
    }
    if starts_with_ignore_case(trimmed, b"<?XML") {
        return "text/xml; charset=utf-8";
    }

    if let Some(content_type) = MAGIC
        .iter()
        .find(|sig| sig.matches(data))
        .map(|sig| sig.content_type)
    {
        return content_type;
    }

    if is_mp4(data) {
        return "video/mp4";
    }

    if data.iter().any(|b| is_binary(*b)) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN_UTF8
    }
}

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// A byte signature where `mask` selects the bits of `pattern` that must match
struct Magic {
    pattern: &'static [u8],
    mask: Option<&'static [u8]>,
    content_type: &'static str,
}

impl Magic {
    const fn exact(pattern: &'static [u8], content_type: &'static str) -> Self {
        Self {
            pattern,
            mask: None,
            content_type,
        }
    }

    const fn masked(
        pattern: &'static [u8],
        mask: &'static [u8],
        content_type: &'static str,
    ) -> Self {
        Self {
            pattern,
            mask: Some(mask),
            content_type,
        }
    }

    fn matches(&self, data: &[u8]) -> bool {
        if data.len() < self.pattern.len() {
            return false;
        }
        match self.mask {
            None => data.starts_with(self.pattern),
            Some(mask) => self
                .pattern
                .iter()
                .zip(mask)
                .zip(data)
                .all(|((p, m), d)| d & m == *p),
        }
    }
}

const MAGIC: &[Magic] = &[
    Magic::exact(b"%PDF-", "application/pdf"),
    Magic::exact(b"%!PS-Adobe-", "application/postscript"),
    // byte order marks
    Magic::exact(b"\xFE\xFF", "text/plain; charset=utf-16be"),
    Magic::exact(b"\xFF\xFE", "text/plain; charset=utf-16le"),
    Magic::exact(b"\xEF\xBB\xBF", TEXT_PLAIN_UTF8),
    // images
    Magic::exact(b"\x00\x00\x01\x00", "image/x-icon"),
    Magic::exact(b"\x00\x00\x02\x00", "image/x-icon"),
    Magic::exact(b"BM", "image/bmp"),
    Magic::exact(b"GIF87a", "image/gif"),
    Magic::exact(b"GIF89a", "image/gif"),
    Magic::masked(
        b"RIFF\x00\x00\x00\x00WEBPVP",
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        "image/webp",
    ),
    Magic::exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    Magic::exact(b"\xFF\xD8\xFF", "image/jpeg"),
    // audio and video
    Magic::masked(
        b"FORM\x00\x00\x00\x00AIFF",
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        "audio/aiff",
    ),
    Magic::exact(b"ID3", "audio/mpeg"),
    Magic::exact(b"OggS\x00", "application/ogg"),
    Magic::exact(b"MThd\x00\x00\x00\x06", "audio/midi"),
    Magic::masked(
        b"RIFF\x00\x00\x00\x00AVI ",
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        "video/avi",
    ),
    Magic::masked(
        b"RIFF\x00\x00\x00\x00WAVE",
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        "audio/wave",
    ),
    Magic::exact(b"\x1A\x45\xDF\xA3", "video/webm"),
    // archives
    Magic::exact(b"\x1F\x8B\x08", "application/x-gzip"),
    Magic::exact(b"PK\x03\x04", "application/zip"),
    Magic::exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    Magic::exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    Magic::exact(b"\x00\x61\x73\x6D", "application/wasm"),
];

fn is_ws(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_tag_terminator(b: u8) -> bool {
    b == b' ' || b == b'>'
}

fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

fn starts_with_ignore_case(data: &[u8], upper: &[u8]) -> bool {
    data.len() >= upper.len() && data[..upper.len()].eq_ignore_ascii_case(upper)
}

/// An HTML tag must be followed by a space or `>` to count as a match
fn matches_html_tag(data: &[u8], tag: &[u8]) -> bool {
    starts_with_ignore_case(data, tag)
        && data.get(tag.len()).copied().is_some_and(is_tag_terminator)
}

/// ISO base media file with an `mp4` major or compatible brand
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }
    // brands follow the box header; offset 12 holds the minor version
    (8..box_size)
        .step_by(4)
        .filter(|offset| *offset != 12)
        .any(|offset| data.get(offset..offset + 3) == Some(b"mp4".as_slice()))
}
