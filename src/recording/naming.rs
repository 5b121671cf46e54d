//! Deterministic, filesystem-safe recording paths

use regex::Regex;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::models::Programme;
use crate::utils::time::to_iso_millis;

const MAX_FILENAME_BYTES: usize = 255;

/// Lifecycle tag of a recording file, carried entirely by its path suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Failed,
    InProgress,
    Metadata,
    PostProcessed,
    Raw,
    Successful,
    Thumbnail,
}

impl FileType {
    pub fn suffix(&self, programme: &Programme) -> String {
        match self {
            FileType::Failed => format!(
                ".{}.failed",
                sanitize_filename(&to_iso_millis(programme.start_date))
            ),
            FileType::InProgress => ".inprogress".to_string(),
            FileType::Metadata => ".metadata".to_string(),
            FileType::PostProcessed => ".postprocessed".to_string(),
            FileType::Raw => ".raw".to_string(),
            FileType::Successful => ".mp4".to_string(),
            FileType::Thumbnail => ".jpg".to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FileType::Successful | FileType::Failed)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Failed => "failed",
            FileType::InProgress => "in-progress",
            FileType::Metadata => "metadata",
            FileType::PostProcessed => "post-processed",
            FileType::Raw => "raw",
            FileType::Successful => "successful",
            FileType::Thumbnail => "thumbnail",
        };
        f.write_str(name)
    }
}

struct SanitizePatterns {
    illegal: Regex,
    control: Regex,
    reserved: Regex,
    windows_reserved: Regex,
    windows_trailing: Regex,
}

fn patterns() -> &'static SanitizePatterns {
    static PATTERNS: OnceLock<SanitizePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| SanitizePatterns {
        illegal: Regex::new(r#"[/\\?<>*|"]"#).expect("valid illegal-character pattern"),
        control: Regex::new(r"[\x00-\x1f\x7f-\x9f]").expect("valid control-character pattern"),
        reserved: Regex::new(r"^\.+$").expect("valid reserved-name pattern"),
        windows_reserved: Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$")
            .expect("valid windows-reserved pattern"),
        windows_trailing: Regex::new(r"[. ]+$").expect("valid trailing pattern"),
    })
}

/// Strip characters and names that are unsafe in a file name, then cap at 255 bytes
pub fn sanitize_filename(input: &str) -> String {
    let p = patterns();
    let cleaned = p.illegal.replace_all(input, "");
    let cleaned = p.control.replace_all(&cleaned, "");
    let cleaned = p.reserved.replace(&cleaned, "");
    let cleaned = p.windows_reserved.replace(&cleaned, "");
    let cleaned = p.windows_trailing.replace(&cleaned, "");
    truncate_utf8(&cleaned, MAX_FILENAME_BYTES).to_string()
}

fn truncate_utf8(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// `title - seriesId - (ISO start | airingId)[ - subtitle]`, sanitized, apostrophes removed
pub fn file_name(programme: &Programme) -> String {
    let mut parts: Vec<String> = vec![programme.title.clone(), programme.series_id.clone()];

    if programme.has_placeholder_airing_id() {
        parts.push(to_iso_millis(programme.start_date));
    } else {
        parts.push(programme.airing_id.clone());
    }

    if let Some(subtitle) = programme.episode_title() {
        parts.push(subtitle.to_string());
    }

    sanitize_filename(&parts.join(" - ")).replace('\'', "")
}

/// Resolves every lifecycle path of a programme inside one save directory
#[derive(Debug, Clone)]
pub struct RecordingPaths {
    save_dir: PathBuf,
}

impl RecordingPaths {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    pub fn base_path(&self, programme: &Programme) -> PathBuf {
        self.save_dir.join(file_name(programme))
    }

    pub fn full_path(&self, programme: &Programme, file_type: FileType) -> PathBuf {
        append_suffix(self.base_path(programme), &file_type.suffix(programme))
    }

    /// Metadata sits on top of another suffix: `<base><suffix>.metadata`
    pub fn metadata_path(&self, programme: &Programme, of: FileType) -> PathBuf {
        append_suffix(
            self.full_path(programme, of),
            &FileType::Metadata.suffix(programme),
        )
    }
}

fn append_suffix(path: PathBuf, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.into_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}
