//! On-disk artifact layout and key-derivation policy.
//!
//! Two keying strategies coexist, each with a fixed purpose:
//!
//! - Uploaded resumes are content-addressed: the directory name is the first
//!   [`CONTENT_KEY_LEN`] hex characters of the SHA-256 of the file. Uploading
//!   identical bytes again yields the same `file_id` and replaces the stored
//!   copy, so a resume can be referenced by later runs.
//! - Job runs are one-off: outputs live under `run-<job_id>`, where the job id
//!   is random. Two runs never share an output directory.
//!
//! ```text
//! <root>/knowledge/<file_id>/resume.<ext>
//! <root>/output/run-<job_id>/<artifact>
//! ```

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::hashing::sha256_hex;

/// Directory (under the data root) holding per-run outputs.
pub const OUTPUTS_DIR: &str = "output";

/// Directory (under the data root) holding uploaded resumes.
pub const UPLOADS_DIR: &str = "knowledge";

/// Prefix of a per-run output directory name.
pub const RUN_DIR_PREFIX: &str = "run-";

/// Number of hex characters kept from the content hash.
pub const CONTENT_KEY_LEN: usize = 12;

/// Stem of the stored resume file.
pub const RESUME_FILE_STEM: &str = "resume";

/// Extension used when neither the file name nor content type implies one.
pub const DEFAULT_RESUME_EXTENSION: &str = "pdf";

pub const CONTENT_TYPE_PDF: &str = "application/pdf";
pub const CONTENT_TYPE_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Accepted upload content types, paired with their canonical extension.
const RESUME_TYPES: &[(&str, &str)] = &[
    (CONTENT_TYPE_PDF, "pdf"),
    (CONTENT_TYPE_DOCX, "docx"),
    (CONTENT_TYPE_TEXT, "txt"),
];

// ---------------------------------------------------------------------------
// Keys and names
// ---------------------------------------------------------------------------

/// Content-addressed key for uploaded bytes.
pub fn content_key(data: &[u8]) -> String {
    let mut digest = sha256_hex(data);
    digest.truncate(CONTENT_KEY_LEN);
    digest
}

/// Check that a caller-supplied `file_id` has the shape [`content_key`]
/// produces, so it is safe to join onto a path.
pub fn validate_content_key(file_id: &str) -> Result<(), CoreError> {
    let well_formed = file_id.len() == CONTENT_KEY_LEN
        && file_id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid file_id '{file_id}'. Expected {CONTENT_KEY_LEN} lowercase hex characters"
        )))
    }
}

/// Output directory name for a job run.
pub fn run_dir_name(job_id: &str) -> String {
    format!("{RUN_DIR_PREFIX}{job_id}")
}

/// Reject artifact names that could escape the run directory or address
/// hidden files.
pub fn validate_artifact_name(name: &str) -> Result<(), CoreError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(CoreError::Validation(format!(
            "Invalid artifact name '{name}'"
        )));
    }
    Ok(())
}

pub fn is_supported_resume_type(content_type: &str) -> bool {
    RESUME_TYPES.iter().any(|(ct, _)| *ct == content_type)
}

/// Whether `path` looks like a stored resume (by extension).
pub fn is_resume_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            RESUME_TYPES.iter().any(|(_, ext)| *ext == e)
        })
        .unwrap_or(false)
}

/// Stored file name for an uploaded resume: `resume.<ext>`.
///
/// The extension comes from the original file name when it is a supported
/// one, otherwise from the content type, otherwise [`DEFAULT_RESUME_EXTENSION`].
pub fn resume_file_name(original_name: Option<&str>, content_type: Option<&str>) -> String {
    let from_name = original_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| RESUME_TYPES.iter().any(|(_, ext)| ext == e));

    let from_type = || {
        content_type.and_then(|ct| {
            RESUME_TYPES
                .iter()
                .find(|(t, _)| *t == ct)
                .map(|(_, ext)| ext.to_string())
        })
    };

    let ext = from_name
        .or_else(from_type)
        .unwrap_or_else(|| DEFAULT_RESUME_EXTENSION.to_string());
    format!("{RESUME_FILE_STEM}.{ext}")
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Resolves artifact and upload paths under a single data root.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join(OUTPUTS_DIR)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    pub fn run_dir(&self, job_id: &str) -> PathBuf {
        self.outputs_dir().join(run_dir_name(job_id))
    }

    pub fn upload_dir(&self, file_id: &str) -> PathBuf {
        self.uploads_dir().join(file_id)
    }

    /// Path of a named artifact inside a job's run directory.
    pub fn artifact_path(&self, job_id: &str, name: &str) -> Result<PathBuf, CoreError> {
        validate_artifact_name(name)?;
        Ok(self.run_dir(job_id).join(name))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
