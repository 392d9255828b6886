//! Text extraction: turn deck bytes into one flat string.
//!
//! Format comes from the file extension and is confirmed by magic bytes, so
//! a renamed file fails with a clear message instead of a parser error deep
//! inside pdfium or the zip reader.
//!
//! * PDF: pdfium, page texts joined with `\n`. Bound from `PDFIUM_LIB_PATH`
//!   when set, otherwise from the system library. pdfium is blocking and
//!   not async-safe, so it runs in `spawn_blocking`.
//! * PPTX: the slide XML parts `ppt/slides/slideN.xml`, in slide order;
//!   every `<a:t>` run, one line per `<a:p>` paragraph.

use crate::error::ScorerError;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Supported deck formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckFormat {
    Pdf,
    Pptx,
    /// Text handed in directly, no extraction.
    Text,
}

impl DeckFormat {
    /// Format implied by the file extension, case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DeckFormat::Pdf),
            "pptx" => Some(DeckFormat::Pptx),
            _ => None,
        }
    }

    fn magic_matches(self, bytes: &[u8]) -> bool {
        match self {
            DeckFormat::Pdf => bytes.starts_with(PDF_MAGIC),
            DeckFormat::Pptx => bytes.starts_with(ZIP_MAGIC),
            DeckFormat::Text => true,
        }
    }

    /// Decide the format of `bytes` named `source_name`.
    ///
    /// A known extension must agree with the magic bytes. Without a known
    /// extension the magic bytes alone decide.
    pub fn detect(source_name: &str, bytes: &[u8]) -> Result<Self, ScorerError> {
        let unsupported = |detail: String| ScorerError::UnsupportedFormat {
            source_name: source_name.to_string(),
            detail,
        };

        match Self::from_name(source_name) {
            Some(fmt) if fmt.magic_matches(bytes) => Ok(fmt),
            Some(fmt) => Err(unsupported(format!(
                "the file is named like a {} but its content is not one (starts with {:?})",
                fmt.label(),
                String::from_utf8_lossy(&bytes[..bytes.len().min(4)])
            ))),
            None if bytes.starts_with(PDF_MAGIC) => Ok(DeckFormat::Pdf),
            None if bytes.starts_with(ZIP_MAGIC) => Ok(DeckFormat::Pptx),
            None => {
                let ext = Path::new(source_name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("");
                Err(unsupported(if ext.eq_ignore_ascii_case("ppt") {
                    "legacy .ppt files are not supported; save the deck as .pptx".into()
                } else {
                    "not a PDF or PPTX file".into()
                }))
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeckFormat::Pdf => "PDF",
            DeckFormat::Pptx => "PPTX",
            DeckFormat::Text => "text",
        }
    }
}

/// Text pulled out of one deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDeck {
    pub raw_text: String,
    pub format: DeckFormat,
    pub source_name: String,
}

impl ExtractedDeck {
    /// Characters of text, ignoring surrounding whitespace.
    pub fn char_count(&self) -> usize {
        self.raw_text.trim().chars().count()
    }
}

/// Extract the text of a deck held in memory.
pub async fn extract_text(bytes: Vec<u8>, source_name: &str) -> Result<ExtractedDeck, ScorerError> {
    let format = DeckFormat::detect(source_name, &bytes)?;
    let name = source_name.to_string();

    let raw_text = match format {
        DeckFormat::Pdf => tokio::task::spawn_blocking(move || extract_pdf_blocking(&bytes, &name))
            .await
            .map_err(|e| ScorerError::Internal(format!("PDF extraction task panicked: {e}")))??,
        DeckFormat::Pptx => extract_pptx(&bytes, &name)?,
        DeckFormat::Text => String::from_utf8_lossy(&bytes).into_owned(),
    };

    info!(
        "Extracted {} chars from {} '{}'",
        raw_text.chars().count(),
        format.label(),
        source_name
    );

    Ok(ExtractedDeck {
        raw_text,
        format,
        source_name: source_name.to_string(),
    })
}

// ── PDF ──────────────────────────────────────────────────────────────────

/// Bind pdfium from `PDFIUM_LIB_PATH` (file or directory) or the system.
fn bind_pdfium() -> Result<Pdfium, String> {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH") {
        Some(p) => {
            let mut path = PathBuf::from(p);
            if path.is_dir() {
                path = Pdfium::pdfium_platform_library_name_at_path(&path);
            }
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path)
                .map_err(|e| format!("could not load pdfium from {}: {e}", path.display()))?
        }
        None => Pdfium::bind_to_system_library().map_err(|e| {
            format!("pdfium library not found ({e}); set PDFIUM_LIB_PATH to libpdfium")
        })?,
    };
    Ok(Pdfium::new(bindings))
}

fn extract_pdf_blocking(bytes: &[u8], source_name: &str) -> Result<String, ScorerError> {
    let extraction = |detail: String| ScorerError::Extraction {
        source_name: source_name.to_string(),
        detail,
    };

    let pdfium = bind_pdfium().map_err(extraction)?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| extraction(format!("corrupt or encrypted PDF: {e:?}")))?;

    let pages = document.pages();
    debug!("PDF loaded: {} pages", pages.len());

    let mut texts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| extraction(format!("page {}: {e:?}", idx + 1)))?;
        texts.push(text.all());
    }

    Ok(texts.join("\n"))
}

// ── PPTX ─────────────────────────────────────────────────────────────────

static RE_SLIDE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

fn extract_pptx(bytes: &[u8], source_name: &str) -> Result<String, ScorerError> {
    let extraction = |detail: String| ScorerError::Extraction {
        source_name: source_name.to_string(),
        detail,
    };

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| extraction(format!("not a valid PPTX archive: {e}")))?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let caps = RE_SLIDE_PART.captures(name)?;
            let n = caps[1].parse().ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(n, _)| *n);

    if slides.is_empty() {
        return Err(extraction("archive contains no slides (ppt/slides/slideN.xml)".into()));
    }

    let mut out = String::new();
    for (n, part) in &slides {
        let mut xml = String::new();
        archive
            .by_name(part)
            .map_err(|e| extraction(format!("slide {n}: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| extraction(format!("slide {n}: {e}")))?;

        let text = slide_text(&xml).map_err(|e| extraction(format!("slide {n}: {e}")))?;
        debug!("Slide {n}: {} chars", text.len());
        out.push_str(&text);
    }

    Ok(out)
}

/// Text runs of one slide, a newline after every paragraph.
fn slide_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = XmlReader::from_str(xml);
    let mut buf = Vec::new();
    let mut output = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.name().as_ref() == b"a:t" => in_text_run = true,
            Event::Empty(ref e) if e.name().as_ref() == b"a:br" => output.push('\n'),
            Event::Text(e) if in_text_run => output.push_str(&e.unescape()?),
            Event::End(ref e) => match e.name().as_ref() {
                b"a:t" => in_text_run = false,
                b"a:p" => output.push('\n'),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(DeckFormat::from_name("Deck.PDF"), Some(DeckFormat::Pdf));
        assert_eq!(DeckFormat::from_name("pitch.pptx"), Some(DeckFormat::Pptx));
        assert_eq!(DeckFormat::from_name("notes.txt"), None);
        assert_eq!(DeckFormat::from_name("noext"), None);
    }

    #[test]
    fn extension_and_magic_must_agree() {
        assert_eq!(
            DeckFormat::detect("a.pdf", b"%PDF-1.7 ...").unwrap(),
            DeckFormat::Pdf
        );
        let err = DeckFormat::detect("a.pdf", b"PK\x03\x04....").unwrap_err();
        assert!(matches!(err, ScorerError::UnsupportedFormat { .. }));
    }

    #[test]
    fn magic_decides_without_extension() {
        assert_eq!(
            DeckFormat::detect("download", b"%PDF-1.4").unwrap(),
            DeckFormat::Pdf
        );
        assert_eq!(
            DeckFormat::detect("download", b"PK\x03\x04rest").unwrap(),
            DeckFormat::Pptx
        );
        assert!(DeckFormat::detect("notes.txt", b"hello").is_err());
    }

    #[test]
    fn legacy_ppt_gets_specific_hint() {
        let err = DeckFormat::detect("old.ppt", b"\xD0\xCF\x11\xE0").unwrap_err();
        assert!(err.to_string().contains(".pptx"), "got: {err}");
    }

    #[test]
    fn slide_text_collects_runs_per_paragraph() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
            <p:sp><p:txBody>
              <a:p><a:r><a:t>Fresh &amp; </a:t></a:r><a:r><a:t>Local</a:t></a:r></a:p>
              <a:p><a:r><a:t>Line one</a:t></a:r><a:br/><a:r><a:t>Line two</a:t></a:r></a:p>
            </p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;
        assert_eq!(
            slide_text(xml).unwrap(),
            "Fresh & Local\nLine one\nLine two\n"
        );
    }

    #[test]
    fn garbage_zip_is_extraction_error() {
        let err = extract_pptx(b"PK\x03\x04 not really a zip", "x.pptx").unwrap_err();
        assert!(matches!(err, ScorerError::Extraction { .. }));
    }
}
