use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::{env, fs, io};

use log::debug;

/// Cache of executable name to full path, built by scanning `$PATH` once.
///
/// Lets the shell detect "command not found" in the parent, before any fork.
/// The first directory on `$PATH` that provides a name wins. A lookup miss
/// triggers one re-scan so binaries installed mid-session are still found.
pub struct SearchCache {
    imp: HashMap<OsString, PathBuf>,
}

const PATH_KEY: &str = "PATH";

impl SearchCache {
    pub fn new() -> SearchCache {
        let mut this = SearchCache { imp: HashMap::new() };
        this.rehash();
        this
    }

    fn add_entry(&mut self, entry: io::Result<fs::DirEntry>) -> io::Result<()> {
        let e = entry?;
        self.imp.entry(e.file_name()).or_insert_with(|| e.path());
        Ok(())
    }

    pub fn rehash(&mut self) {
        self.imp.clear();
        let path_var = env::var_os(PATH_KEY).unwrap_or_default();
        for dir in env::split_paths(&path_var) {
            if let Ok(entries) = fs::read_dir(dir) {
                for entry in entries {
                    let _ = self.add_entry(entry);
                }
            }
        }
        debug!("search cache rebuilt, {} entries", self.imp.len());
    }

    /// Resolve a command name to the program path to exec. Names containing a
    /// slash bypass the cache and are taken as paths.
    pub fn resolve(&mut self, name: &str) -> Option<PathBuf> {
        if name.contains('/') {
            return Some(PathBuf::from(name));
        }
        if let Some(path) = self.imp.get(OsStr::new(name)) {
            return Some(path.clone());
        }
        self.rehash();
        self.imp.get(OsStr::new(name)).cloned()
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_sh_on_path() {
        let mut cache = SearchCache::new();
        let path = cache.resolve("sh").expect("sh should be on PATH");
        assert!(path.ends_with("sh"));
    }

    #[test]
    fn slash_names_bypass_the_cache() {
        let mut cache = SearchCache::new();
        assert_eq!(
            cache.resolve("/bin/sh"),
            Some(PathBuf::from("/bin/sh"))
        );
        assert_eq!(
            cache.resolve("./relative/prog"),
            Some(PathBuf::from("./relative/prog"))
        );
    }

    #[test]
    fn unknown_name_is_none() {
        let mut cache = SearchCache::new();
        assert_eq!(cache.resolve("minish-no-such-binary-xyz"), None);
    }
}
