//! Process-wide type resolution.
//!
//! Decoding an object value requires the field layout of its type, and
//! that layout is not part of the payload: it comes from an external set
//! of type-definition archives on disk. The [`TypeResolver`] owns that
//! lookup. On the first `resolve` call it scans the configured search
//! paths exactly once, building a type-name to archive index; subsequent
//! calls hit an insert-only cache of [`TypeDescriptor`]s.
//!
//! The resolver is the only state shared between concurrently open edit
//! sessions, so its discipline is initialize-once-then-read-only: the
//! index build is guarded by a `OnceCell` (concurrent first users wait for
//! or reuse the single scan) and the cache by a `Mutex` whose only
//! mutation is insertion.

/// Archive backends.
pub mod source;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::ResolutionError;
use crate::graph::TypeDescriptor;
use source::{JsonArchiveSource, TypeDefinitionSource};

/// Directory scanned for archives when nothing else is configured.
pub const DEFAULT_ARCHIVE_DIR: &str = "./libs";

/// Where type-definition archives live.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Directories scanned (recursively) for archives, in order. Earlier
    /// paths win when two archives define the same type name.
    pub search_paths: Vec<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from(DEFAULT_ARCHIVE_DIR)],
        }
    }
}

/// Entry of the type-name index: which archive defines the name, and
/// which backend understands that archive.
#[derive(Debug, Clone)]
struct IndexEntry {
    archive: PathBuf,
    source: usize,
}

/// Maps requested type names to loadable [`TypeDescriptor`]s.
#[derive(Debug)]
pub struct TypeResolver {
    config: ResolverConfig,
    sources: Vec<Box<dyn TypeDefinitionSource>>,
    index: OnceCell<HashMap<String, IndexEntry>>,
    cache: Mutex<HashMap<String, Arc<TypeDescriptor>>>,
    scans: AtomicUsize,
}

static SHARED: OnceCell<Arc<TypeResolver>> = OnceCell::new();

impl TypeResolver {
    /// Creates a resolver with the production archive backends. Nothing is
    /// scanned until the first [`TypeResolver::resolve`] call.
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_sources(config, vec![Box::new(JsonArchiveSource)])
    }

    /// Creates a resolver with explicit backends.
    pub fn with_sources(
        config: ResolverConfig,
        sources: Vec<Box<dyn TypeDefinitionSource>>,
    ) -> Self {
        Self {
            config,
            sources,
            index: OnceCell::new(),
            cache: Mutex::new(HashMap::new()),
            scans: AtomicUsize::new(0),
        }
    }

    /// Returns the process-wide resolver, creating it on first use.
    ///
    /// The configuration argument is honored by whichever call gets there
    /// first; later calls receive the already initialized instance
    /// unchanged. Rebuilding resolution context is expensive, so it is
    /// deliberately impossible to tear the shared instance down.
    pub fn shared(config: ResolverConfig) -> Arc<TypeResolver> {
        SHARED
            .get_or_init(|| Arc::new(TypeResolver::new(config)))
            .clone()
    }

    /// Resolves a type name to its descriptor.
    ///
    /// The first call triggers the one-time archive scan. Fails with
    /// [`ResolutionError::NotFound`] when no archive defines the name, or
    /// [`ResolutionError::LoadFailed`] when the owning archive cannot be
    /// read or parsed at load time.
    pub fn resolve(&self, type_name: &str) -> Result<Arc<TypeDescriptor>, ResolutionError> {
        if let Some(hit) = self.lock_cache().get(type_name) {
            return Ok(hit.clone());
        }

        let index = self.index.get_or_init(|| self.build_index());
        let entry = index
            .get(type_name)
            .ok_or_else(|| ResolutionError::NotFound(type_name.to_string()))?;

        let descriptor = self
            .sources
            .get(entry.source)
            .ok_or_else(|| ResolutionError::NotFound(type_name.to_string()))?
            .load(&entry.archive, type_name)?;

        let shared = Arc::new(descriptor);
        self.lock_cache()
            .insert(type_name.to_string(), shared.clone());
        Ok(shared)
    }

    /// Number of full archive scans performed so far (0 or 1 in normal
    /// operation). Instrumentation hook for cache behavior.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<TypeDescriptor>>> {
        // The cache is an insert-only map; it stays consistent even if a
        // previous holder panicked mid-insert.
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn build_index(&self) -> HashMap<String, IndexEntry> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let mut index = HashMap::new();

        for dir in &self.config.search_paths {
            if !dir.is_dir() {
                debug!(path = %dir.display(), "archive search path absent, skipping");
                continue;
            }
            let walk = WalkDir::new(dir).sort_by_file_name();
            for entry in walk.into_iter().filter_map(Result::ok) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let Some(source_idx) = self.sources.iter().position(|s| s.matches(path)) else {
                    continue;
                };
                match self.sources[source_idx].index(path) {
                    Ok(names) => {
                        info!(
                            archive = %path.display(),
                            types = names.len(),
                            "indexed type archive"
                        );
                        for name in names {
                            index.entry(name).or_insert_with(|| IndexEntry {
                                archive: path.to_path_buf(),
                                source: source_idx,
                            });
                        }
                    }
                    Err(error) => {
                        // Advisory only: a broken archive must not poison
                        // resolution of types defined elsewhere.
                        warn!(
                            archive = %path.display(),
                            %error,
                            "skipping unloadable type archive"
                        );
                    }
                }
            }
        }
        index
    }
}
