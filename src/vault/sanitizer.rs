//! Turns untrusted titles and filenames into names that are safe to use as a
//! single path component on any common filesystem.
//!
//! Two layers guard the vault. A substring block list rejects anything that
//! looks like traversal (`..`, `./`, `.\`, `~`) anywhere in the input, and
//! [`Sanitizer::build_safe_path`] checks that a joined path still sits inside
//! its base. The block list is intentionally blunt: a title such as
//! `"Wait... what?"` or `"~/notes"` is refused even though it would be
//! harmless once cleaned.

use super::error::{VaultError, VaultResult};
use std::path::{Component, Path, PathBuf};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_FILENAME_LEN: usize = 100;

pub(crate) const TRAVERSAL_PATTERNS: [&str; 4] = ["..", "./", ".\\", "~"];
pub(crate) const ILLEGAL_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

pub(crate) fn is_illegal(c: char) -> bool {
    ILLEGAL_CHARS.contains(&c) || (c as u32) < 0x20
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    max_title_len: usize,
    max_filename_len: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(MAX_TITLE_LEN, MAX_FILENAME_LEN)
    }
}

impl Sanitizer {
    pub fn new(max_title_len: usize, max_filename_len: usize) -> Self {
        Self { max_title_len, max_filename_len }
    }

    pub fn sanitize_title(&self, title: &str) -> VaultResult<String> {
        if title.is_empty() {
            return Err(VaultError::validation("title cannot be empty"));
        }
        check_traversal(title).map_err(|e| e.with_field(title))?;

        let cleaned = clean(title, self.max_title_len);
        if cleaned.is_empty() || cleaned == "." {
            return Err(VaultError::validation("title is empty after sanitization").with_field(title));
        }
        // stripping can join dots back together, e.g. ".<." -> ".."
        check_traversal(&cleaned).map_err(|e| e.with_field(title))?;
        Ok(cleaned)
    }

    /// Like [`Self::sanitize_title`], but keeps only the last component of a
    /// path-like input first (`a/b/c.png` -> `c.png`).
    pub fn sanitize_filename(&self, name: &str) -> VaultResult<String> {
        if name.is_empty() {
            return Err(VaultError::validation("filename cannot be empty"));
        }
        check_traversal(name).map_err(|e| e.with_field(name))?;

        let cleaned = clean(base_component(name), self.max_filename_len);
        if cleaned.is_empty() || cleaned == "." {
            return Err(VaultError::validation("filename is empty after sanitization").with_field(name));
        }
        check_traversal(&cleaned).map_err(|e| e.with_field(name))?;
        Ok(cleaned)
    }

    /// Asset names are written verbatim, so this only checks and never
    /// rewrites.
    pub fn validate_asset_filename(&self, name: &str) -> VaultResult<()> {
        if name.is_empty() {
            return Err(VaultError::validation("asset filename cannot be empty"));
        }
        if let Err(err) = check_traversal(name) {
            return Err(VaultError::security(format!("invalid filename: {}", err.message)).with_field(name));
        }
        if name.contains(is_separator) {
            return Err(VaultError::security(format!(
                "invalid filename: path traversal detected in '{name}'"
            ))
            .with_field(name));
        }
        let len = name.chars().count();
        if len > self.max_filename_len {
            return Err(VaultError::validation(format!(
                "filename too long: {len} characters (max {})",
                self.max_filename_len
            ))
            .with_field(name));
        }
        Ok(())
    }

    /// Joins `components` onto `base` and refuses any result that lexically
    /// leaves `base`.
    pub fn build_safe_path(&self, base: &Path, components: &[&str]) -> VaultResult<PathBuf> {
        let root = normalize_lexically(base);
        let mut full = root.clone();
        for component in components {
            check_traversal(component).map_err(|e| e.with_field(*component))?;
            full.push(component);
        }
        let full = normalize_lexically(&full);

        match full.strip_prefix(&root) {
            Ok(rel) if !matches!(rel.components().next(), Some(Component::ParentDir)) => Ok(full),
            _ => Err(VaultError::security(
                "path traversal detected: result would be outside base directory",
            )),
        }
    }
}

fn check_traversal(input: &str) -> VaultResult<()> {
    match TRAVERSAL_PATTERNS.iter().find(|p| input.contains(**p)) {
        Some(pattern) => Err(VaultError::security(format!("path traversal detected: '{pattern}'"))),
        None => Ok(()),
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

fn base_component(name: &str) -> &str {
    name.trim_end_matches(is_separator)
        .rsplit(is_separator)
        .next()
        .unwrap_or_default()
}

fn clean(input: &str, max_len: usize) -> String {
    let stripped: String = input.chars().filter(|c| !is_illegal(*c)).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_len) {
        Some((cut, _)) => collapsed[..cut].trim_end().to_string(),
        None => collapsed,
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
