//! Input filtering for the data directory.

use std::path::{Path, PathBuf};

/// Check if a file should be excluded based on OS-specific clutter files
pub fn is_os_hidden_file(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        match name {
            // macOS
            ".DS_Store" | ".AppleDouble" | ".LSOverride" => true,
            // Windows
            "Thumbs.db" | "ehthumbs.db" | "Desktop.ini" | "$RECYCLE.BIN" => true,
            // Linux
            ".directory" => true,
            // macOS resource forks, Linux trash dirs
            _ => name.starts_with("._") || name.starts_with(".Trash-"),
        }
    } else {
        false
    }
}

/// Returns true if a top-level path should be submitted for sampling.
/// The data root itself, the schema output directory and OS clutter are never inputs.
pub fn should_include_input(
    path: &Path,
    root: &Path,
    schema_canonical: &Option<PathBuf>,
    exclude_patterns: &[String],
) -> bool {
    if path == root {
        return false;
    }
    if let Some(schema) = schema_canonical
        && path == schema.as_path()
    {
        return false;
    }
    if is_os_hidden_file(path) {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    !exclude_patterns
        .iter()
        .any(|pattern| glob_match(pattern, name))
}

/// Simple glob pattern matching (supports * and ?)
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    // Position of the last '*' and the text index it was matched against.
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Canonical form of `path`, or the path unchanged when it cannot be resolved.
pub fn canonicalize_or_keep(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
