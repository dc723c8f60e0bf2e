//! Filter set construction from configured sources.

use std::path::{Path, PathBuf};

use crate::config::FiltersConfig;
use crate::filters::{catalog, AgentFilter, AgentFilterDef, FilterError, FilterSet};
use crate::filters::store::FilterStore;
use crate::observability::metrics;

/// Builds [`FilterSet`]s from inline definitions, a directory of JSON files
/// and, optionally, the built-in catalog.
///
/// Order: inline definitions, then directory files sorted by file name, then
/// catalog families not already present. Earlier sources win name clashes.
#[derive(Debug, Clone, Default)]
pub struct FilterLoader {
    inline: Vec<AgentFilterDef>,
    directory: Option<PathBuf>,
    use_builtin: bool,
}

impl FilterLoader {
    pub fn new(inline: Vec<AgentFilterDef>, directory: Option<PathBuf>, use_builtin: bool) -> Self {
        Self {
            inline,
            directory,
            use_builtin,
        }
    }

    pub fn from_config(config: &FiltersConfig) -> Self {
        Self::new(
            config.agents.clone(),
            config.directory.as_ref().map(PathBuf::from),
            config.use_builtin,
        )
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Build a fresh set. Fails only if the directory cannot be listed;
    /// individual bad records are skipped with a warning.
    pub fn load(&self) -> Result<FilterSet, FilterError> {
        let mut filters: Vec<AgentFilter> = Vec::new();

        for def in &self.inline {
            match AgentFilter::from_def(def.clone(), None) {
                Ok(filter) => push_unique(&mut filters, filter, "config"),
                Err(e) => tracing::warn!(error = %e, "Skipping inline filter"),
            }
        }

        if let Some(dir) = &self.directory {
            for (path, result) in read_directory(dir)? {
                match result {
                    Ok(filter) => push_unique(&mut filters, filter, &path.display().to_string()),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping filter file"),
                }
            }
        }

        if self.use_builtin {
            for filter in catalog::builtin_filters() {
                if filters.iter().all(|f| f.name() != filter.name()) {
                    filters.push(filter);
                }
            }
        }

        FilterSet::new(filters)
    }

    /// Load and swap into `store`. On failure the current set stays active.
    pub fn reload(&self, store: &FilterStore) -> Result<usize, FilterError> {
        match self.load() {
            Ok(set) => {
                let count = set.len();
                store.replace(set);
                metrics::record_filter_reload("success");
                Ok(count)
            }
            Err(e) => {
                metrics::record_filter_reload("failure");
                tracing::error!(error = %e, "Filter reload failed; keeping current filter set");
                Err(e)
            }
        }
    }
}

fn push_unique(filters: &mut Vec<AgentFilter>, filter: AgentFilter, origin: &str) {
    if filters.iter().any(|f| f.name() == filter.name()) {
        tracing::warn!(filter = %filter.name(), origin = %origin, "Skipping duplicate filter name");
        return;
    }
    filters.push(filter);
}

/// Parse every `*.json` file in `dir`, sorted by file name.
///
/// The outer error covers listing the directory; per-file results are
/// returned so callers can report or skip bad files individually.
pub fn read_directory(dir: &Path) -> Result<Vec<(PathBuf, Result<AgentFilter, FilterError>)>, FilterError> {
    let io_err = |source| FilterError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(paths
        .into_iter()
        .map(|path| {
            let result = read_file(&path);
            (path, result)
        })
        .collect())
}

/// Parse one filter file. The file stem names records without a `name`.
pub fn read_file(path: &Path) -> Result<AgentFilter, FilterError> {
    let content = std::fs::read_to_string(path).map_err(|source| FilterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let def: AgentFilterDef = serde_json::from_str(&content).map_err(|source| FilterError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path.file_stem().and_then(|s| s.to_str());
    AgentFilter::from_def(def, stem)
}

/// Write a filter record in the on-disk format to `<dir>/<name>.json`.
///
/// The record goes to a hidden temp file in `dir` first and is renamed into
/// place, so a watcher or reload never reads a half-written file.
pub fn write_file(dir: &Path, filter: &AgentFilter) -> Result<PathBuf, FilterError> {
    let io_err = |source| FilterError::Io {
        path: dir.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let path = dir.join(format!("{}.json", filter.name()));
    let body = serde_json::to_vec_pretty(&filter.to_def()).map_err(|source| FilterError::Parse {
        path: path.clone(),
        source,
    })?;

    let tmp = dir.join(format!(".{}.json.tmp", filter.name()));
    let written = std::fs::write(&tmp, body).and_then(|()| std::fs::rename(&tmp, &path));
    if let Err(source) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(FilterError::Io {
            path: path.clone(),
            source,
        });
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("doppler-filters-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, file: &str, body: &str) {
        std::fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn test_directory_sorted_by_file_name() {
        let dir = temp_dir();
        write(&dir, "perplexity.json", r#"{"name":"perplexity","ips":[],"userAgents":["PerplexityBot"],"utm":[]}"#);
        write(&dir, "bing.json", r#"{"name":"bing","ips":["157.55.39.0/24"],"userAgents":["bingbot"],"utm":[]}"#);
        write(&dir, "openai.json", r#"{"name":"openai","ips":[],"userAgents":[],"utm":["chatgpt.com"]}"#);
        write(&dir, "notes.txt", "not a filter");

        let set = FilterLoader::new(vec![], Some(dir.clone()), false).load().unwrap();
        let names: Vec<_> = set.filters().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["bing", "openai", "perplexity"]);

        std::fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn test_bad_files_skipped() {
        let dir = temp_dir();
        write(&dir, "a.json", "{ not json");
        write(&dir, "b.json", r#"{"name":"empty","ips":[""],"userAgents":[],"utm":[]}"#);
        write(&dir, "c.json", r#"{"ips":["66.249.64.0/19"],"userAgents":["Googlebot"]}"#);

        let set = FilterLoader::new(vec![], Some(dir.clone()), false).load().unwrap();
        assert_eq!(set.len(), 1);
        // Name falls back to the file stem.
        assert_eq!(set.filters()[0].name(), "c");

        std::fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn test_source_precedence() {
        let dir = temp_dir();
        write(&dir, "openai.json", r#"{"name":"openai","ips":["20.0.0.0/8"],"userAgents":["GPTBot"],"utm":[]}"#);
        write(&dir, "google.json", r#"{"name":"google","ips":["66.249.64.0/19"],"userAgents":["Googlebot"],"utm":[]}"#);

        let inline = vec![AgentFilterDef {
            name: "openai".into(),
            utm: vec!["chatgpt.com".into()],
            ..Default::default()
        }];
        let set = FilterLoader::new(inline, Some(dir.clone()), true).load().unwrap();
        let names: Vec<_> = set.filters().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["openai", "google", "bing", "perplexity"]);
        // Inline definition wins over the file of the same name.
        assert!(set.get("openai").unwrap().ip_ranges().is_empty());
        // Directory definition wins over the catalog.
        assert_eq!(set.get("google").unwrap().ip_ranges(), &["66.249.64.0/19".to_string()]);

        std::fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn test_missing_directory_keeps_current_set() {
        let store = FilterStore::new(FilterLoader::new(vec![], None, true).load().unwrap());
        let loader = FilterLoader::new(vec![], Some(std::env::temp_dir().join("doppler-does-not-exist")), false);

        assert!(matches!(loader.reload(&store), Err(FilterError::Io { .. })));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_write_then_read() {
        let dir = temp_dir();
        let filter = catalog::lookup("bing").unwrap().to_filter(vec!["157.55.39.0/24".into()]);
        let path = write_file(&dir, &filter).unwrap();
        assert!(path.ends_with("bing.json"));

        let read = read_file(&path).unwrap();
        assert_eq!(read.to_def(), filter.to_def());

        std::fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn test_write_replaces_existing_file_without_leftovers() {
        let dir = temp_dir();
        write(&dir, "bing.json", r#"{"name":"bing","ips":["1.2.3.0/24"],"userAgents":["old"],"utm":[]}"#);

        let filter = catalog::lookup("bing").unwrap().to_filter(vec!["157.55.39.0/24".into()]);
        let path = write_file(&dir, &filter).unwrap();

        assert_eq!(read_file(&path).unwrap().to_def(), filter.to_def());
        let entries: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, ["bing.json"]);
        // The loader sees exactly one record.
        assert_eq!(FilterLoader::new(vec![], Some(dir.clone()), false).load().unwrap().len(), 1);

        std::fs::remove_dir_all(dir).unwrap_or_default();
    }
}
