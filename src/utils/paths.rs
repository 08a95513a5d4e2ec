use std::io;
use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` to the user's home directory.
///
/// Paths without a tilde prefix (and the rare case where no home directory
/// can be determined) are returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Make a path absolute relative to the current directory and normalize it
/// lexically (`.` and `..` components are resolved without touching the
/// filesystem, so the path does not need to exist).
pub fn absolutize(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root.
                if result.parent().is_some() {
                    result.pop();
                }
            }
            other => result.push(other),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dot_components() {
        assert_eq!(normalize(Path::new("/a/./b")), PathBuf::from("/a/b"));
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a/b/..")), PathBuf::from("/a"));
    }

    #[test]
    fn normalize_stops_at_root() {
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn absolutize_keeps_absolute_paths() {
        let path = absolutize("/opt/tools").unwrap();
        assert_eq!(path, PathBuf::from("/opt/tools"));
    }

    #[test]
    fn absolutize_anchors_relative_paths_at_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolutize("sub/dir").unwrap(), cwd.join("sub/dir"));
        assert_eq!(absolutize("./sub").unwrap(), cwd.join("sub"));
    }

    #[test]
    fn expand_tilde_leaves_plain_paths_alone() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("relative"), PathBuf::from("relative"));
    }

    #[test]
    fn expand_tilde_prefixes_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/.fpgabox"), home.join(".fpgabox"));
            assert_eq!(expand_tilde("~"), home);
        }
    }
}
