// Path identity
// Canonical path form and the storage key derived from it. Both functions are total.

use regex::Regex;
use std::sync::OnceLock;

fn drive_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z]:/").expect("drive prefix pattern"))
}

fn windows_absolute() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z]:\\").expect("windows path pattern"))
}

fn id_separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[/: ]").expect("id separator pattern"))
}

fn id_disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("id charset pattern"))
}

/// Normalize a raw path into its canonical form.
///
/// Drive letters and leading slashes are stripped until neither remains, backslashes become
/// forward slashes, trailing slashes are trimmed and the result is lowercased. Stripping to a
/// fixed point keeps the function idempotent for inputs such as `/c:/clip.mp4`.
pub fn normalize_path(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let forward = raw.replace('\\', "/");
    let mut rest = forward.as_str();
    loop {
        let trimmed = rest.trim_start_matches('/');
        let stripped = match drive_prefix().find(trimmed) {
            Some(m) => &trimmed[m.end()..],
            None => trimmed,
        };
        if stripped.len() == rest.len() {
            break;
        }
        rest = stripped;
    }

    rest.trim_end_matches('/').to_lowercase()
}

/// Derive the storage id for a path: `/`, `:` and space become `_`, anything else outside
/// `[A-Za-z0-9._-]` is dropped. Distinct paths can collide; callers decide how to react.
pub fn sanitize_id(path: &str) -> String {
    let separated = id_separators().replace_all(path, "_");
    id_disallowed().replace_all(&separated, "").into_owned()
}

/// True when the path can be opened directly instead of through a local selection.
pub fn is_absolute_local_path(path: &str) -> bool {
    path.starts_with("file:///") || path.starts_with('/') || windows_absolute().is_match(path)
}

/// Last segment of a canonical path, for display.
pub fn display_name(canonical: &str) -> &str {
    canonical.rsplit('/').next().unwrap_or(canonical)
}
