//! Text extraction for uploaded files and email files.
//!
//! Uploaded bytes are never stored; only the extracted text and a small
//! metadata object survive. Plain text is decoded lossily as UTF-8, HTML is
//! reduced to its text, and RFC 822 messages are split into headers and body.
//! Binary document formats are recognized but not decoded; their text body is
//! a short description naming the file.

use std::sync::OnceLock;

use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use taxon_core::{ContentKind, Error, NewContentItem, Result};

/// Coarse type of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Text,
    Pdf,
    Doc,
    Xls,
    Ppt,
    Image,
    Other,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Text => "text",
            FileType::Pdf => "pdf",
            FileType::Doc => "doc",
            FileType::Xls => "xls",
            FileType::Ppt => "ppt",
            FileType::Image => "image",
            FileType::Other => "other",
        }
    }

    fn from_extension(ext: &str) -> Self {
        match ext {
            "txt" | "text" | "md" | "csv" | "log" | "json" => FileType::Text,
            "pdf" => FileType::Pdf,
            "doc" | "docx" => FileType::Doc,
            "xls" | "xlsx" => FileType::Xls,
            "ppt" | "pptx" => FileType::Ppt,
            "jpg" | "jpeg" | "png" | "gif" => FileType::Image,
            _ => FileType::Other,
        }
    }

    fn from_mime(mime: &str) -> Self {
        if mime.starts_with("text/") {
            FileType::Text
        } else if mime.starts_with("image/") {
            FileType::Image
        } else if mime == "application/pdf" {
            FileType::Pdf
        } else if mime == "application/msword"
            || mime.starts_with("application/vnd.openxmlformats-officedocument.wordprocessingml")
        {
            FileType::Doc
        } else if mime == "application/vnd.ms-excel"
            || mime.starts_with("application/vnd.openxmlformats-officedocument.spreadsheetml")
        {
            FileType::Xls
        } else if mime == "application/vnd.ms-powerpoint"
            || mime.starts_with("application/vnd.openxmlformats-officedocument.presentationml")
        {
            FileType::Ppt
        } else {
            FileType::Other
        }
    }
}

/// Kind of email file, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailFileType {
    Txt,
    Html,
    Eml,
    Oft,
    Msg,
    Other,
}

impl EmailFileType {
    pub fn from_filename(filename: &str) -> Self {
        match extension(filename).as_deref() {
            Some("txt") => EmailFileType::Txt,
            Some("html") | Some("htm") => EmailFileType::Html,
            Some("eml") => EmailFileType::Eml,
            Some("oft") => EmailFileType::Oft,
            Some("msg") => EmailFileType::Msg,
            _ => EmailFileType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmailFileType::Txt => "txt",
            EmailFileType::Html => "html",
            EmailFileType::Eml => "eml",
            EmailFileType::Oft => "oft",
            EmailFileType::Msg => "msg",
            EmailFileType::Other => "other",
        }
    }
}

/// Result of extracting an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub title: String,
    pub text: String,
    pub metadata: JsonValue,
}

impl ExtractedContent {
    /// Content item for `user` built from this extraction.
    pub fn into_new_item(self, kind: ContentKind, user: &str) -> NewContentItem {
        NewContentItem {
            kind,
            title: self.title,
            content: self.text,
            metadata: self.metadata,
            created_by: user.to_string(),
        }
    }
}

fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Detect the coarse file type from magic bytes, falling back to the
/// extension for formats without a signature.
pub fn detect_file_type(filename: &str, data: &[u8]) -> FileType {
    if let Some(kind) = infer::get(data) {
        let detected = FileType::from_mime(kind.mime_type());
        // OOXML files are zip archives; the extension tells them apart.
        if detected != FileType::Other || kind.mime_type() != "application/zip" {
            return detected;
        }
    }
    extension(filename)
        .map(|ext| FileType::from_extension(&ext))
        .unwrap_or(FileType::Other)
}

fn ensure_not_empty(filename: &str, data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Err(Error::Validation(format!("uploaded file is empty: {}", filename)));
    }
    Ok(())
}

/// Extract the text body of an uploaded file.
pub fn extract_file(filename: &str, data: &[u8]) -> Result<ExtractedContent> {
    ensure_not_empty(filename, data)?;
    let file_type = detect_file_type(filename, data);

    let (text, text_extracted) = match file_type {
        FileType::Text => (String::from_utf8_lossy(data).into_owned(), true),
        other => (
            format!("File: {}\nType: {}", filename, other.as_str()),
            false,
        ),
    };

    Ok(ExtractedContent {
        title: filename.to_string(),
        metadata: json!({
            "name": filename,
            "size": data.len(),
            "type": file_type.as_str(),
            "text_extracted": text_extracted,
            "char_count": text.chars().count(),
        }),
        text,
    })
}

/// Extract subject, addresses and body from an email file.
pub fn extract_email(filename: &str, data: &[u8]) -> Result<ExtractedContent> {
    ensure_not_empty(filename, data)?;
    let email_type = EmailFileType::from_filename(filename);
    let raw = String::from_utf8_lossy(data);

    let parsed = match email_type {
        EmailFileType::Eml | EmailFileType::Msg | EmailFileType::Oft => {
            if looks_like_rfc822(&raw) {
                parse_message(&raw)
            } else {
                ParsedEmail::body_only(printable_text(&raw))
            }
        }
        EmailFileType::Html => ParsedEmail::body_only(html_to_text(&raw)),
        EmailFileType::Txt | EmailFileType::Other => {
            if looks_like_rfc822(&raw) {
                parse_message(&raw)
            } else {
                ParsedEmail::body_only(raw.trim().to_string())
            }
        }
    };

    if parsed.body.trim().is_empty() && parsed.subject.is_empty() {
        return Err(Error::Validation(format!(
            "no readable text in email file: {}",
            filename
        )));
    }

    let title = if parsed.subject.is_empty() {
        filename.to_string()
    } else {
        parsed.subject.clone()
    };
    let text = if parsed.subject.is_empty() {
        parsed.body.clone()
    } else {
        format!("Subject: {}\n\n{}", parsed.subject, parsed.body)
    };

    Ok(ExtractedContent {
        title,
        metadata: json!({
            "name": filename,
            "size": data.len(),
            "type": email_type.as_str(),
            "subject": parsed.subject,
            "from": parsed.from,
            "to": parsed.to,
            "date": parsed.date,
            "attachments": parsed.attachments,
        }),
        text,
    })
}

#[derive(Debug, Default)]
struct ParsedEmail {
    subject: String,
    from: String,
    to: String,
    date: String,
    body: String,
    attachments: Vec<String>,
}

impl ParsedEmail {
    fn body_only(body: String) -> Self {
        Self {
            body,
            ..Default::default()
        }
    }
}

fn looks_like_rfc822(raw: &str) -> bool {
    let head = raw.split("\n\n").next().unwrap_or_default();
    head.lines().any(|line| {
        let lower = line.to_ascii_lowercase();
        lower.starts_with("from:") || lower.starts_with("subject:")
    })
}

/// Byte ranges of the header block and the body, split at the first blank
/// line whatever its line ending.
fn header_boundary(raw: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in raw.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']).is_empty() {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}

/// Split headers from body; header names are lowercased and folded lines
/// joined.
fn split_headers(raw: &str) -> (Vec<(String, String)>, &str) {
    let (head, body) = match header_boundary(raw) {
        Some((head_end, body_start)) => (&raw[..head_end], &raw[body_start..]),
        None => (raw, ""),
    };

    let mut headers: Vec<(String, String)> = Vec::new();
    for line in head.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }
    (headers, body)
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

fn header_param(value: &str, param: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|part| {
        let (key, val) = part.trim().split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case(param)
            .then(|| val.trim().trim_matches('"').to_string())
    })
}

fn parse_message(raw: &str) -> ParsedEmail {
    let (headers, body) = split_headers(raw);
    let mut parsed = ParsedEmail {
        subject: header(&headers, "subject").unwrap_or_default().to_string(),
        from: header(&headers, "from").unwrap_or_default().to_string(),
        to: header(&headers, "to").unwrap_or_default().to_string(),
        date: header(&headers, "date").unwrap_or_default().to_string(),
        ..Default::default()
    };

    let mut texts = Vec::new();
    collect_parts(&headers, body, &mut texts, &mut parsed.attachments);
    parsed.body = texts.join("\n").trim().to_string();
    parsed
}

/// Walk a (possibly multipart) entity, collecting text parts and
/// attachment filenames.
fn collect_parts(
    headers: &[(String, String)],
    body: &str,
    texts: &mut Vec<String>,
    attachments: &mut Vec<String>,
) {
    let content_type = header(headers, "content-type")
        .unwrap_or("text/plain")
        .to_ascii_lowercase();
    let disposition = header(headers, "content-disposition").unwrap_or_default();

    if disposition.to_ascii_lowercase().starts_with("attachment") {
        let name = header_param(disposition, "filename")
            .or_else(|| header(headers, "content-type").and_then(|ct| header_param(ct, "name")))
            .unwrap_or_else(|| "unnamed".to_string());
        attachments.push(name);
        return;
    }

    if content_type.starts_with("multipart/") {
        let boundary = header(headers, "content-type").and_then(|ct| header_param(ct, "boundary"));
        let Some(boundary) = boundary else {
            texts.push(body.to_string());
            return;
        };
        let delimiter = format!("--{}", boundary);
        for part in body.split(delimiter.as_str()).skip(1) {
            if part.starts_with("--") {
                break;
            }
            let part = part.trim_start_matches(['\r', '\n']);
            let (part_headers, part_body) = split_headers(part);
            collect_parts(&part_headers, part_body, texts, attachments);
        }
        return;
    }

    // Prefer text/plain; HTML parts only count when nothing plain was found.
    let decoded = decode_transfer(
        body,
        header(headers, "content-transfer-encoding").unwrap_or_default(),
    );
    if content_type.starts_with("text/plain") {
        texts.push(decoded);
    } else if content_type.starts_with("text/html") && texts.is_empty() {
        texts.push(html_to_text(&decoded));
    }
}

fn decode_transfer(body: &str, encoding: &str) -> String {
    match encoding.trim().to_ascii_lowercase().as_str() {
        "base64" => {
            let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
            match base64::engine::general_purpose::STANDARD.decode(compact.as_bytes()) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => body.to_string(),
            }
        }
        "quoted-printable" => decode_quoted_printable(body),
        _ => body.to_string(),
    }
}

fn decode_quoted_printable(body: &str) -> String {
    let mut out = Vec::with_capacity(body.len());
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            // Soft line break.
            if bytes[i + 1..].starts_with(b"\r\n") {
                i += 3;
                continue;
            }
            if bytes[i + 1..].starts_with(b"\n") {
                i += 2;
                continue;
            }
            if i + 2 < bytes.len() {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    out.push(value);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn html_to_text(html: &str) -> String {
    static BLOCKS: OnceLock<Regex> = OnceLock::new();
    static TAGS: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();

    let blocks = BLOCKS.get_or_init(|| {
        Regex::new(r"(?is)<(script|style|head)[^>]*>.*?</(script|style|head)>").unwrap()
    });
    let tags = TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap());
    let spaces = SPACES.get_or_init(|| Regex::new(r"[ \t]+").unwrap());

    let without_blocks = blocks.replace_all(html, " ");
    let without_tags = tags.replace_all(&without_blocks, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(|line| spaces.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep runs of printable characters from a binary container.
fn printable_text(raw: &str) -> String {
    raw.split(|c: char| c.is_control() && c != '\n' && c != '\t')
        .map(str::trim)
        .filter(|run| run.chars().count() >= 4 && !run.contains('\u{FFFD}'))
        .collect::<Vec<_>>()
        .join("\n")
}
