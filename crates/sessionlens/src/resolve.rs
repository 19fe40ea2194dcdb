//! Resolve a session id (or path) to a session log file.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

lazy_static! {
    static ref SESSION_ID: Regex = Regex::new(r"^[a-f0-9-]+$").unwrap();
}

/// Environment variable that overrides the session log root
pub const CONFIG_DIR_ENV: &str = "CLAUDE_CONFIG_DIR";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid session ID: {0}")]
    InvalidSessionId(String),

    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Roots to search, in order: `$CLAUDE_CONFIG_DIR`, then `claude_dir`.
pub fn search_roots(claude_dir: Option<PathBuf>) -> Vec<PathBuf> {
    let env_dir = std::env::var_os(CONFIG_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    let mut roots: Vec<PathBuf> = Vec::new();
    for root in env_dir.into_iter().chain(claude_dir) {
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

/// Resolve `input` to a session log path.
///
/// An existing file resolves to itself. Anything else must look like a
/// session id and is matched as a prefix against `projects/*/<id>*.jsonl`
/// under each root.
pub fn resolve_session(input: &str, roots: &[PathBuf]) -> Result<PathBuf, ResolveError> {
    let as_path = Path::new(input);
    if as_path.is_file() {
        return Ok(as_path.to_path_buf());
    }

    if !SESSION_ID.is_match(input) {
        return Err(ResolveError::InvalidSessionId(input.to_string()));
    }

    for root in roots {
        let mut matches = find_in_root(root, input);
        matches.sort();
        if let Some(first) = matches.into_iter().next() {
            debug!(input, path = %first.display(), "Resolved session");
            return Ok(first);
        }
    }

    Err(ResolveError::NotFound(input.to_string()))
}

fn find_in_root(root: &Path, prefix: &str) -> Vec<PathBuf> {
    let projects = root.join("projects");
    let Ok(entries) = std::fs::read_dir(&projects) else {
        debug!(path = %projects.display(), "No projects directory");
        return Vec::new();
    };

    let mut found = Vec::new();
    for project in entries.flatten() {
        let project_path = project.path();
        if !project_path.is_dir() {
            continue;
        }
        let Ok(files) = std::fs::read_dir(&project_path) else {
            continue;
        };
        for file in files.flatten() {
            let name = file.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(prefix) && name.ends_with(".jsonl") {
                found.push(file.path());
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Helper: lay out `projects/<project>/<file>` under a fresh root.
    fn create_claude_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (project, file) in files {
            let project_dir = dir.path().join("projects").join(project);
            std::fs::create_dir_all(&project_dir).unwrap();
            std::fs::write(project_dir.join(file), "{}\n").unwrap();
        }
        dir
    }

    #[test]
    fn test_existing_file_resolves_to_itself() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        std::fs::write(&path, "").unwrap();

        let input = path.to_string_lossy().to_string();
        assert_eq!(resolve_session(&input, &[]).unwrap(), path);
    }

    #[test]
    fn test_invalid_session_id() {
        let err = resolve_session("not/a-session!", &[]).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidSessionId(ref s) if s == "not/a-session!"));

        assert!(matches!(
            resolve_session("ABCDEF", &[]),
            Err(ResolveError::InvalidSessionId(_))
        ));
    }

    #[test]
    fn test_prefix_match_picks_lexicographically_first() {
        let root = create_claude_dir(&[
            ("-home-b", "abc123-2222.jsonl"),
            ("-home-a", "abc123-1111.jsonl"),
            ("-home-a", "abc999.jsonl"),
            ("-home-a", "abc123-0000.txt"),
        ]);

        let path = resolve_session("abc123", &[root.path().to_path_buf()]).unwrap();
        assert!(path.ends_with("projects/-home-a/abc123-1111.jsonl"));
    }

    #[test]
    fn test_earlier_root_wins() {
        let first = create_claude_dir(&[("-p", "fff-2.jsonl")]);
        let second = create_claude_dir(&[("-p", "fff-1.jsonl")]);

        let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let path = resolve_session("fff", &roots).unwrap();
        assert!(path.starts_with(first.path()));
    }

    #[test]
    fn test_not_found() {
        let root = create_claude_dir(&[("-p", "aaa.jsonl")]);
        let missing = TempDir::new().unwrap();

        let roots = vec![missing.path().to_path_buf(), root.path().to_path_buf()];
        let err = resolve_session("bbb", &roots).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(ref s) if s == "bbb"));
        assert_eq!(err.to_string(), "Session not found: bbb");
    }
}
