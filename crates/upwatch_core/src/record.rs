use serde::Serialize;

/// Field values for an [`UploadRecord`] before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
    pub source_url: String,
    pub file_id: String,
    pub file_name: String,
    pub size_label: String,
    pub published_at: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("upload record field `{field}` is empty")]
pub struct EmptyFieldError {
    pub field: &'static str,
}

/// One file entry discovered on a source page.
///
/// Every field is non-empty; `published_at` is already normalized to the
/// target zone in [`crate::NORMALIZED_FORMAT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRecord {
    source_url: String,
    file_id: String,
    file_name: String,
    size_label: String,
    published_at: String,
    description: String,
}

impl UploadRecord {
    pub fn new(fields: RecordFields) -> Result<Self, EmptyFieldError> {
        let RecordFields {
            source_url,
            file_id,
            file_name,
            size_label,
            published_at,
            description,
        } = fields;

        for (field, value) in [
            ("source_url", &source_url),
            ("file_id", &file_id),
            ("file_name", &file_name),
            ("size_label", &size_label),
            ("published_at", &published_at),
            ("description", &description),
        ] {
            if value.trim().is_empty() {
                return Err(EmptyFieldError { field });
            }
        }

        Ok(Self {
            source_url,
            file_id,
            file_name,
            size_label,
            published_at,
            description,
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size_label(&self) -> &str {
        &self.size_label
    }

    pub fn published_at(&self) -> &str {
        &self.published_at
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
