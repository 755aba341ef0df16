//! Directory links between modules.
//!
//! Unix uses relative symlinks so a development root can be moved or checked out
//! elsewhere. Windows uses junctions, which need no elevated privileges but must
//! point at an absolute target.

use std::io;
use std::path::Path;

use tracing::debug;

use super::paths::relative_path;

/// Create a directory link at `link` pointing to `target`.
///
/// The parent of `link` is created if missing.
pub fn link_dir(target: &Path, link: &Path) -> io::Result<()> {
  let parent = link
    .parent()
    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "link path has no parent"))?;
  std::fs::create_dir_all(parent)?;

  let relative = relative_path(parent, target);
  debug!(link = %link.display(), target = %relative.display(), "creating link");

  #[cfg(unix)]
  {
    std::os::unix::fs::symlink(&relative, link)
  }

  #[cfg(windows)]
  {
    let _ = relative;
    junction::create(target, link)
  }
}

/// True if something (a link, even a dangling one, or a real entry) exists at `path`.
pub fn entry_exists(path: &Path) -> bool {
  std::fs::symlink_metadata(path).is_ok()
}
