use lopdf::Document as PdfDocument;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::UploadConfig;
use crate::error::AssistantError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Text extracted from an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    /// Pages in the source file
    pub page_count: usize,
    /// Pages actually read (capped by `UploadConfig::max_pages`)
    pub pages_processed: usize,
}

impl Document {
    pub fn truncated(&self) -> bool {
        self.pages_processed < self.page_count
    }
}

/// Reject uploads that are too large or are not PDFs, before any parsing.
pub fn validate_upload(name: &str, bytes: &[u8], limits: &UploadConfig) -> Result<(), AssistantError> {
    if bytes.is_empty() {
        return Err(AssistantError::Validation("uploaded file is empty".to_string()));
    }
    if bytes.len() as u64 > limits.max_bytes {
        return Err(AssistantError::Validation(format!(
            "file too large: {} bytes (limit {} bytes)",
            bytes.len(),
            limits.max_bytes
        )));
    }
    if !name.to_ascii_lowercase().ends_with(".pdf") {
        return Err(AssistantError::Validation(format!(
            "unsupported file type: {} (PDF only)",
            name
        )));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(AssistantError::Validation(format!(
            "{} does not look like a PDF",
            name
        )));
    }
    Ok(())
}

/// Validate and extract the text of a PDF upload.
pub fn extract_pdf(name: &str, bytes: &[u8], limits: &UploadConfig) -> Result<Document, AssistantError> {
    validate_upload(name, bytes, limits)?;

    let pdf = PdfDocument::load_mem(bytes)
        .map_err(|e| AssistantError::Validation(format!("unreadable PDF {}: {}", name, e)))?;
    if pdf.is_encrypted() {
        return Err(AssistantError::Validation(format!("{} is encrypted", name)));
    }

    let pages: Vec<u32> = pdf.get_pages().keys().copied().collect();
    let page_count = pages.len();
    if page_count > limits.max_pages {
        warn!(
            name,
            page_count,
            max_pages = limits.max_pages,
            "large PDF, processing leading pages only"
        );
    }

    let mut text = String::new();
    let mut pages_processed = 0;
    for page in pages.iter().take(limits.max_pages) {
        pages_processed += 1;
        match pdf.extract_text(&[*page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => warn!(name, page, error = %e, "failed to extract page text"),
        }
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AssistantError::NoExtractableText);
    }

    info!(name, page_count, pages_processed, chars = text.len(), "extracted PDF text");
    Ok(Document {
        text,
        page_count,
        pages_processed,
    })
}
