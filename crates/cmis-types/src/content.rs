use serde::{Deserialize, Serialize};

/// Mime type used when a caller supplies none.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Document content held fully in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStream {
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl ContentStream {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: Some(file_name.into()),
            mime_type: Some(mime_type.into()),
            data: data.into(),
        }
    }

    /// Content with only bytes; name and mime type are filled in later.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: None,
            mime_type: None,
            data: data.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fill in a missing or blank file name and mime type.
    pub fn with_defaults(mut self, fallback_name: &str) -> Self {
        if self.file_name.as_deref().map_or(true, str::is_empty) {
            self.file_name = Some(fallback_name.to_string());
        }
        if self.mime_type.as_deref().map_or(true, str::is_empty) {
            self.mime_type = Some(DEFAULT_MIME_TYPE.to_string());
        }
        self
    }

    /// A copy restricted to `length` bytes starting at `offset`.
    ///
    /// A `None` length reads to the end. Ranges past the end are clamped.
    pub fn range(&self, offset: u64, length: Option<u64>) -> ContentStream {
        let total = self.data.len();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(total);
        let end = match length {
            Some(len) => start.saturating_add(usize::try_from(len).unwrap_or(usize::MAX)).min(total),
            None => total,
        };
        ContentStream {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            data: self.data[start..end].to_vec(),
        }
    }

    /// Append another chunk's bytes.
    pub fn append(&mut self, chunk: &ContentStream) {
        self.data.extend_from_slice(&chunk.data);
    }
}
