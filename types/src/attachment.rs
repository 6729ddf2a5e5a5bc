use thiserror::Error;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// A document staged for upload alongside a chat message.
///
/// Only PDFs can be constructed; anything else is rejected when the file is
/// picked, before it can reach a send.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    file_name: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("{file_name} is not a PDF (only .pdf files can be attached)")]
    NotPdf { file_name: String },
    #[error("{file_name} is empty")]
    Empty { file_name: String },
    #[error("attachment needs a file name")]
    MissingName,
}

impl Attachment {
    pub const MIME_TYPE: &'static str = "application/pdf";

    pub fn pdf(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, AttachmentError> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(AttachmentError::MissingName);
        }
        if bytes.is_empty() {
            return Err(AttachmentError::Empty { file_name });
        }
        let has_extension = file_name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"));
        if !has_extension || !bytes.starts_with(PDF_MAGIC) {
            return Err(AttachmentError::NotPdf { file_name });
        }
        Ok(Self { file_name, bytes })
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
