//! # Upload Validation
//!
//! Decides whether a selected file may be uploaded, from its metadata alone.
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. extension (case-insensitive suffix match)
//! 2. declared MIME type, only when one was reported
//! 3. size
//!
//! The limits come from an [`UploadPolicy`] supplied by the caller.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use log::debug;

pub const BYTES_PER_MB: u64 = 1024 * 1024;
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * BYTES_PER_MB;
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx"];
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Metadata of a file the user picked, before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub file_name: String,
    /// May be empty when the source could not tell.
    pub declared_mime_type: String,
    pub size_bytes: u64,
}

impl UploadCandidate {
    pub fn new(
        file_name: impl Into<String>,
        declared_mime_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            declared_mime_type: declared_mime_type.into(),
            size_bytes,
        }
    }

    /// Reads name and size from the filesystem and guesses the MIME type from
    /// the extension. Unknown extensions yield an empty MIME type.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        if metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            ));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;

        let declared_mime_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();

        debug!(
            "Upload candidate {}: mime={:?}, size={}",
            file_name,
            declared_mime_type,
            metadata.len()
        );

        Ok(Self {
            file_name,
            declared_mime_type,
            size_bytes: metadata.len(),
        })
    }
}

/// Limits applied to every upload candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Suffixes including the dot, e.g. `.pdf`.
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
    pub max_size_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn validate(&self, candidate: &UploadCandidate) -> ValidationOutcome {
        validate(candidate, self)
    }
}

/// Why a candidate was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Extension {
        file_name: String,
        allowed: Vec<String>,
    },
    MimeType {
        expected: Vec<String>,
        received: String,
    },
    TooLarge {
        size_bytes: u64,
        max_size_bytes: u64,
    },
}

/// Bytes as megabytes with two decimals.
fn megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_MB as f64)
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Extension { file_name, allowed } => write!(
                f,
                "Invalid file type: \"{file_name}\". Allowed extensions: {}",
                allowed.join(", ")
            ),
            Rejection::MimeType { expected, received } => write!(
                f,
                "Invalid MIME type: expected one of [{}], received \"{received}\"",
                expected.join(", ")
            ),
            Rejection::TooLarge {
                size_bytes,
                max_size_bytes,
            } => write!(
                f,
                "File is too large: {} MB (maximum {} MB)",
                megabytes(*size_bytes),
                megabytes(*max_size_bytes)
            ),
        }
    }
}

impl std::error::Error for Rejection {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected(Rejection),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }

    /// The user-facing rejection message, if any.
    pub fn reason(&self) -> Option<String> {
        match self {
            ValidationOutcome::Accepted => None,
            ValidationOutcome::Rejected(rejection) => Some(rejection.to_string()),
        }
    }

    pub fn into_result(self) -> Result<(), Rejection> {
        match self {
            ValidationOutcome::Accepted => Ok(()),
            ValidationOutcome::Rejected(rejection) => Err(rejection),
        }
    }
}

/// Checks `candidate` against `policy`. Extension, then MIME type, then size.
pub fn validate(candidate: &UploadCandidate, policy: &UploadPolicy) -> ValidationOutcome {
    let lower_name = candidate.file_name.to_lowercase();
    let extension_ok = policy
        .allowed_extensions
        .iter()
        .any(|ext| lower_name.ends_with(&ext.to_lowercase()));
    if !extension_ok {
        return ValidationOutcome::Rejected(Rejection::Extension {
            file_name: candidate.file_name.clone(),
            allowed: policy.allowed_extensions.clone(),
        });
    }

    // An empty MIME type means the source did not know it; only the extension counts then.
    if !candidate.declared_mime_type.is_empty()
        && !policy
            .allowed_mime_types
            .iter()
            .any(|mime| *mime == candidate.declared_mime_type)
    {
        return ValidationOutcome::Rejected(Rejection::MimeType {
            expected: policy.allowed_mime_types.clone(),
            received: candidate.declared_mime_type.clone(),
        });
    }

    if candidate.size_bytes > policy.max_size_bytes {
        return ValidationOutcome::Rejected(Rejection::TooLarge {
            size_bytes: candidate.size_bytes,
            max_size_bytes: policy.max_size_bytes,
        });
    }

    ValidationOutcome::Accepted
}
