//! Daily log files and their rotation.

use std::{
  fs::{self, File, OpenOptions},
  io,
  path::{Path, PathBuf},
  time::SystemTime,
};

use chrono::NaiveDate;

use crate::config::APP_NAME;

/// `<dir>/adpass_<dd.mm.yyyy>.log`.
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
  dir.join(format!("{APP_NAME}_{}.log", date.format("%d.%m.%Y")))
}

/// Create `dir` if needed and open today's log file for appending.
pub fn open_log_file(path: &Path) -> io::Result<File> {
  if let Some(dir) = path.parent() {
    fs::create_dir_all(dir)?;
  }
  OpenOptions::new().create(true).append(true).open(path)
}

/// Delete all but the `keep` most recently modified log files in `dir`.
/// Only files named like our own logs are considered. Returns the removed
/// paths.
pub fn rotate_by_mtime(dir: &Path, keep: usize) -> io::Result<Vec<PathBuf>> {
  let mut logs: Vec<(SystemTime, PathBuf)> = Vec::new();
  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    let meta = entry.metadata()?;
    if !meta.is_file() || !is_own_log(&entry.path()) {
      continue;
    }
    logs.push((meta.modified()?, entry.path()));
  }

  // Newest first.
  logs.sort_by(|a, b| b.0.cmp(&a.0));

  let mut removed = Vec::new();
  for (_, path) in logs.into_iter().skip(keep) {
    fs::remove_file(&path)?;
    removed.push(path);
  }
  Ok(removed)
}

fn is_own_log(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|n| n.to_str())
    .is_some_and(|n| n.starts_with(&format!("{APP_NAME}_")) && n.ends_with(".log"))
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mtime = SystemTime::now() - Duration::from_secs(age_secs);
    file.set_modified(mtime).unwrap();
    path
  }

  #[test]
  fn path_uses_day_month_year() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
    assert_eq!(
      log_file_path(Path::new("/var/log/adpass"), date),
      PathBuf::from("/var/log/adpass/adpass_07.03.2024.log")
    );
  }

  #[test]
  fn open_creates_missing_directory_and_appends() {
    use std::io::Write as _;

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("adpass_01.01.2024.log");
    writeln!(open_log_file(&path).unwrap(), "first").unwrap();
    writeln!(open_log_file(&path).unwrap(), "second").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
  }

  #[test]
  fn keeps_newest_files() {
    let tmp = tempfile::tempdir().unwrap();
    let newest = touch(tmp.path(), "adpass_03.01.2024.log", 10);
    let middle = touch(tmp.path(), "adpass_02.01.2024.log", 100);
    let oldest = touch(tmp.path(), "adpass_01.01.2024.log", 1000);

    let removed = rotate_by_mtime(tmp.path(), 2).unwrap();

    assert_eq!(removed, [oldest.clone()]);
    assert!(newest.exists());
    assert!(middle.exists());
    assert!(!oldest.exists());
  }

  #[test]
  fn ignores_foreign_files() {
    let tmp = tempfile::tempdir().unwrap();
    let foreign = touch(tmp.path(), "notes.txt", 5000);
    touch(tmp.path(), "adpass_01.01.2024.log", 10);

    let removed = rotate_by_mtime(tmp.path(), 0).unwrap();

    assert_eq!(removed.len(), 1);
    assert!(foreign.exists());
  }

  #[test]
  fn nothing_to_rotate() {
    let tmp = tempfile::tempdir().unwrap();
    touch(tmp.path(), "adpass_01.01.2024.log", 10);
    assert!(rotate_by_mtime(tmp.path(), 7).unwrap().is_empty());
  }
}
