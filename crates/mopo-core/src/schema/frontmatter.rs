//! Front matter splitting for v1 model cards.
//!
//! A model card is Markdown with a metadata block between two lines that
//! consist only of `---`:
//!
//! ```text
//! ---
//! id: 10.5281/zenodo.14585602
//! summary: Pretrained multilingual Party model
//! ---
//! # Party
//!
//! Free-form description...
//! ```

use super::{MetadataBlock, MetadataSchemaVersion};
use crate::error::{MopoError, Result};

const DELIMITER: &str = "---";

/// A model card split into its metadata text and its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    /// Text strictly between the two delimiter lines.
    pub metadata: &'a str,
    /// Everything after the closing delimiter, minus one leading blank line.
    pub body: &'a str,
}

/// Split a document into front matter and body.
///
/// Fails with [`MopoError::NoFrontMatter`] when no delimiter line exists and
/// with [`MopoError::UnterminatedFrontMatter`] when only an opening one does.
pub fn split(content: &str) -> Result<FrontMatter<'_>> {
    let mut offset = 0;
    let mut opening: Option<(usize, usize)> = None;

    for (index, line) in content.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += line.len();

        if line.trim() != DELIMITER {
            continue;
        }
        match opening {
            None => opening = Some((index + 1, offset)),
            Some((_, metadata_start)) => {
                return Ok(FrontMatter {
                    metadata: &content[metadata_start..line_start],
                    body: skip_blank_line(&content[offset..]),
                });
            }
        }
    }

    match opening {
        Some((line, _)) => Err(MopoError::UnterminatedFrontMatter { line }),
        None => Err(MopoError::NoFrontMatter),
    }
}

fn skip_blank_line(body: &str) -> &str {
    match body.find('\n') {
        Some(end) if body[..end].trim().is_empty() => &body[end + 1..],
        None if body.trim().is_empty() => "",
        _ => body,
    }
}

/// Guess the schema generation from the document shape: a bare JSON object
/// is a v0 sidecar, anything else is treated as a v1 model card.
pub fn detect_version(content: &str) -> MetadataSchemaVersion {
    if content.trim_start().starts_with('{') {
        MetadataSchemaVersion::V0
    } else {
        MetadataSchemaVersion::V1
    }
}

/// A decoded document, ready for validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub version: MetadataSchemaVersion,
    pub block: MetadataBlock,
    /// Model card body; `None` for v0 sidecars.
    pub body: Option<String>,
}

/// Detect the version of `content` and decode its metadata block.
pub fn parse_document(content: &str) -> Result<ParsedDocument> {
    match detect_version(content) {
        MetadataSchemaVersion::V0 => Ok(ParsedDocument {
            version: MetadataSchemaVersion::V0,
            block: MetadataBlock::from_json(content.as_bytes())?,
            body: None,
        }),
        MetadataSchemaVersion::V1 => {
            let parts = split(content)?;
            Ok(ParsedDocument {
                version: MetadataSchemaVersion::V1,
                block: MetadataBlock::from_front_matter(parts.metadata)?,
                body: Some(parts.body.to_string()),
            })
        }
    }
}
