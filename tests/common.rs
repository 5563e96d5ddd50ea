use std::fs;
use std::path::Path;

// Writes `files` (relative path, contents) under `root`, creating directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
  for (relative, contents) in files {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
  }
}

// Every file under `root`, as sorted `/`-separated relative paths.
#[allow(dead_code)]
pub fn list_tree(root: &Path) -> Vec<String> {
  let mut files: Vec<String> = walkdir::WalkDir::new(root)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .map(|e| {
      e.path()
        .strip_prefix(root)
        .unwrap()
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
    })
    .collect();
  files.sort();
  files
}
