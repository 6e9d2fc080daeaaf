use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// One directory entry as seen through a `SiteFs`.
#[derive(Debug, Clone)]
pub struct FsEntry {
    /// Name relative to the listed directory. Recursive listings use the
    /// relative sub-path here.
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
}

/// Read-only file access used by every detector.
///
/// The scan runs against the local disk in the common case; in remote-agent
/// mode the same calls go over the agent RPC. Only the capabilities the
/// scanner needs are exposed.
pub trait SiteFs {
    fn read_to_string(&self, path: &Path) -> Result<String, String>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    /// Entries of one directory, sorted by name so scans are deterministic.
    fn read_dir(&self, path: &Path) -> Result<Vec<FsEntry>, String>;

    /// Files under `path`, recursively, with names relative to `path`.
    fn read_dir_recursive(&self, path: &Path) -> Result<Vec<FsEntry>, String> {
        let mut out = Vec::new();
        let mut stack = vec![(path.to_path_buf(), String::new())];
        while let Some((dir, prefix)) = stack.pop() {
            for entry in self.read_dir(&dir)? {
                let rel = if prefix.is_empty() {
                    entry.name.clone()
                } else {
                    format!("{}/{}", prefix, entry.name)
                };
                if entry.is_dir {
                    stack.push((entry.path.clone(), rel));
                } else {
                    out.push(FsEntry { name: rel, ..entry });
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

/// Local disk implementation.
pub struct LocalFs;

impl SiteFs for LocalFs {
    fn read_to_string(&self, path: &Path) -> Result<String, String> {
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<FsEntry>, String> {
        let entries = fs::read_dir(path)
            .map_err(|e| format!("Failed to read directory {}: {}", path.display(), e))?;
        let mut out = Vec::new();
        for entry in entries.flatten() {
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(_) => continue,
            };
            out.push(FsEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry.path(),
                is_dir: meta.is_dir(),
                size: meta.len(),
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn read_dir_recursive(&self, path: &Path) -> Result<Vec<FsEntry>, String> {
        let mut out = Vec::new();
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if !entry.path().is_file() {
                continue;
            }
            let rel = match entry.path().strip_prefix(path) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            out.push(FsEntry {
                name: rel,
                path: entry.path().to_path_buf(),
                is_dir: false,
                size,
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

/// Drop the query string and fragment of an href.
pub fn strip_query_fragment(href: &str) -> &str {
    let href = href.split('?').next().unwrap_or(href);
    href.split('#').next().unwrap_or(href)
}

/// Resolve an href against the directory of a page, lexically.
///
/// `..` components walk up inside the joined path only; there is no
/// symlink resolution, matching how the report URLs are later built.
pub fn resolve_relative(base_dir: &Path, href: &str) -> PathBuf {
    let cleaned = strip_query_fragment(href).replace('\\', "/");
    lexical_normalize(&base_dir.join(cleaned))
}

/// Lexically normalize a path: fold `.` away and apply `..` against the
/// accumulated components.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Join `relative` under `base` and refuse any result escaping `base`.
/// Used by the report proxy route (path traversal guard).
pub fn resolve_within(base: &Path, relative: &str) -> Option<PathBuf> {
    let base = lexical_normalize(base);
    let joined = lexical_normalize(&base.join(relative.replace('\\', "/")));
    if joined.starts_with(&base) {
        Some(joined)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_strip_query_fragment() {
        assert_eq!(strip_query_fragment("img/a.png?v=2#top"), "img/a.png");
        assert_eq!(strip_query_fragment("a.html"), "a.html");
    }

    #[test]
    fn test_resolve_relative_parent() {
        let p = resolve_relative(Path::new("/site/pages"), "../img/logo.png");
        assert_eq!(p, PathBuf::from("/site/img/logo.png"));
    }

    #[test]
    fn test_resolve_within_rejects_escape() {
        assert!(resolve_within(Path::new("/base"), "site/index.html").is_some());
        assert!(resolve_within(Path::new("/base"), "../etc/passwd").is_none());
        assert!(resolve_within(Path::new("/base"), "site/../../etc/passwd").is_none());
    }

    #[test]
    fn test_read_dir_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.html", "a.html", "c.html"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let entries = LocalFs.read_dir(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.html", "b.html", "c.html"]);
    }

    #[test]
    fn test_read_dir_recursive_relative_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        let mut f = File::create(dir.path().join("sub/pic.png")).unwrap();
        f.write_all(b"x").unwrap();
        File::create(dir.path().join("top.jpg")).unwrap();
        let entries = LocalFs.read_dir_recursive(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["sub/pic.png", "top.jpg"]);
    }
}
