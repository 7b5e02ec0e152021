//! Rendering of web pages into stored PDF documents.
//!
//! Pages that do not serve a document directly are fetched, reduced to
//! readable text and laid out as a plain Courier PDF, so every entry in the
//! store can go through the same extraction path.

use std::sync::Arc;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use url::Url;

use crate::documents::download::{fetch_limited, DownloadError};
use crate::utils::{html_to_text, looks_like_html, HttpClient};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 10;
const LEADING: i64 = 12;
const COLUMNS: usize = 80;
const LINES_PER_PAGE: usize = 60;

/// Turns a non-document URL into PDF bytes
#[async_trait]
pub trait PageRenderer: Send + Sync + std::fmt::Debug {
    /// Render the page at `url`; `title` heads the first page
    async fn render(&self, url: &Url, title: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Default renderer: page text via `html2text`, layout via `lopdf`
#[derive(Debug, Clone)]
pub struct TextPdfRenderer {
    client: Arc<HttpClient>,
    max_bytes: u64,
}

impl TextPdfRenderer {
    pub fn new(client: Arc<HttpClient>, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }
}

#[async_trait]
impl PageRenderer for TextPdfRenderer {
    async fn render(&self, url: &Url, title: &str) -> Result<Vec<u8>, DownloadError> {
        let page = fetch_limited(&self.client, url, self.max_bytes).await?;

        if page.is_pdf() {
            tracing::debug!(%url, "page already served as PDF, storing as-is");
            return Ok(page.bytes);
        }

        let body = String::from_utf8_lossy(&page.bytes);
        let text = if page.is_html() || looks_like_html(&body) {
            html_to_text(&body)
        } else {
            body.into_owned()
        };

        if text.trim().is_empty() {
            return Err(DownloadError::Render(format!("{} has no readable text", url)));
        }

        let title = title.to_string();
        let pdf = tokio::task::spawn_blocking(move || text_to_pdf(&title, &text))
            .await
            .map_err(|e| DownloadError::Render(format!("PDF layout task failed: {}", e)))??;

        tracing::debug!(%url, bytes = pdf.len(), "page rendered");
        Ok(pdf)
    }
}

/// Lay `text` out as an A4 PDF in 10pt Courier, 80 columns wide.
///
/// Characters outside Latin-1 are replaced with `?`.
pub fn text_to_pdf(title: &str, text: &str) -> Result<Vec<u8>, DownloadError> {
    let mut lines = wrap_text(title);
    lines.push(String::new());
    lines.extend(wrap_text(text));

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for chunk in lines.chunks(LINES_PER_PAGE) {
        let content_id = add_page_content(&mut doc, chunk)?;
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => media_box(),
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => media_box(),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| DownloadError::Render(format!("Failed to write PDF: {}", e)))?;
    Ok(out)
}

fn media_box() -> Vec<Object> {
    vec![0i64.into(), 0i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()]
}

fn add_page_content(doc: &mut Document, lines: &[String]) -> Result<ObjectId, DownloadError> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
    ];
    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(latin1_bytes(line))],
        ));
        operations.push(Operation::new("Td", vec![0i64.into(), (-LEADING).into()]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations }
        .encode()
        .map_err(|e| DownloadError::Render(format!("Failed to encode page: {}", e)))?;

    Ok(doc.add_object(Stream::new(Dictionary::new(), content)))
}

/// Encode a line for a WinAnsi font
fn latin1_bytes(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap at [`COLUMNS`]; runs of blank lines collapse into one
fn wrap_text(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut previous_blank = false;

    for raw in text.lines() {
        let words: Vec<&str> = raw.split_whitespace().collect();
        if words.is_empty() {
            if !previous_blank && !lines.is_empty() {
                lines.push(String::new());
            }
            previous_blank = true;
            continue;
        }
        previous_blank = false;

        let mut current = String::new();
        for word in words {
            let mut word: String = word.to_string();
            // a single over-long token is hard-broken
            while word.chars().count() > COLUMNS {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let head: String = word.chars().take(COLUMNS).collect();
                word = word.chars().skip(COLUMNS).collect();
                lines.push(head);
            }
            if word.is_empty() {
                continue;
            }

            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > COLUMNS {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
