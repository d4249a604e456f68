//! Document text extraction.
//!
//! A document is an ordered run of pages. Its text is the page texts joined in page order,
//! with an empty string standing in for any page that yields nothing. Only a container that
//! cannot be opened at all is an error.

use std::panic;

use lopdf::Document;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("'{name}' is not a readable PDF document: {reason}")]
    InvalidDocument { name: String, reason: String },
}

/// Extracts the full text of the PDF in `bytes`. `name` is used for diagnostics only.
pub fn extract_text(name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::InvalidDocument {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    // get_pages() is a BTreeMap keyed by page number, so iteration is page order.
    let pages = doc.get_pages();
    let page_count = pages.len();
    let text = concat_pages(pages.keys().map(|&page_number| {
        let page = doc.extract_text(&[page_number]);
        if let Err(e) = &page {
            debug!("{name}: page {page_number} yielded no text: {e}");
        }
        page
    }));

    if !text.trim().is_empty() || page_count == 0 {
        debug!("{name}: extracted {} chars from {page_count} pages", text.len());
        return Ok(text);
    }

    // lopdf decodes few font encodings; pdf-extract handles more but has no page boundaries.
    // It panics on some malformed fonts; a panic counts as a failed fallback.
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(fallback)) => {
            debug!(
                "{name}: per-page extraction was empty, pdf-extract recovered {} chars",
                fallback.len()
            );
            Ok(fallback)
        }
        Ok(Err(e)) => {
            warn!("{name}: no text could be extracted from {page_count} pages: {e}");
            Ok(text)
        }
        Err(_) => {
            warn!("{name}: pdf-extract panicked on {page_count} pages with no text");
            Ok(text)
        }
    }
}

/// Joins per-page extraction results in order. A failed page contributes nothing.
pub fn concat_pages<I, E>(pages: I) -> String
where
    I: IntoIterator<Item = Result<String, E>>,
{
    pages
        .into_iter()
        .map(|page| page.unwrap_or_default())
        .collect()
}
