//! Session-wide asset deduplication.
//!
//! [`AssetCache`] replaces process-global "already loaded" lists: it is created once for a
//! loading session and passed by reference to every [`crate::model::Model::load`] call, so a
//! texture shared by several meshes or models is decoded and uploaded only once.

use std::{rc::Rc, sync::Arc};

use fxhash::FxHashMap;

use crate::{
    abs::{Texture, TextureError, TextureKind, TextureOptions},
    import::ImportOptions,
};

/// A map from path strings to shared, lazily loaded values.
///
/// Lookups use exact string equality; no normalization is applied to the key.
#[derive(Debug)]
pub struct PathCache<T> {
    entries: FxHashMap<String, Rc<T>>,
}

impl<T> Default for PathCache<T> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<T> PathCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, or runs `load` and caches its result.
    ///
    /// Failed loads are not cached.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: &str,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<Rc<T>, E> {
        if let Some(value) = self.entries.get(key) {
            return Ok(Rc::clone(value));
        }
        let value = Rc::new(load()?);
        self.entries.insert(key.to_string(), Rc::clone(&value));
        Ok(value)
    }

    pub fn get(&self, key: &str) -> Option<Rc<T>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops the cache's references. Values still held elsewhere stay alive.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// GPU assets shared across a loading session.
///
/// The cache also carries the import options of the session, so texture flipping and UV flipping
/// are decided in one place.
pub struct AssetCache {
    gl: Arc<glow::Context>,
    options: TextureOptions,
    import_options: ImportOptions,
    textures: PathCache<Texture>,
}

impl AssetCache {
    /// Creates an empty cache. Every texture it loads uses `options`.
    pub fn new(gl: &Arc<glow::Context>, options: TextureOptions) -> Self {
        Self {
            gl: Arc::clone(gl),
            options,
            import_options: ImportOptions::default(),
            textures: PathCache::new(),
        }
    }

    /// Replaces the options passed to the scene importers.
    pub fn with_import_options(mut self, import_options: ImportOptions) -> Self {
        self.import_options = import_options;
        self
    }

    /// Returns the texture options shared by this session.
    pub fn options(&self) -> &TextureOptions {
        &self.options
    }

    /// Returns the importer options shared by this session.
    pub fn import_options(&self) -> &ImportOptions {
        &self.import_options
    }

    /// Returns the texture stored for `path`, loading it on first use.
    ///
    /// A cache hit returns the texture as first loaded, including its kind.
    pub fn texture(&mut self, path: &str, kind: TextureKind) -> Result<Rc<Texture>, TextureError> {
        if let Some(texture) = self.textures.get(path) {
            if texture.kind() != kind {
                log::debug!(
                    "texture '{}' requested as {:?} but cached as {:?}",
                    path,
                    kind,
                    texture.kind()
                );
            }
            return Ok(texture);
        }
        let gl = &self.gl;
        let options = &self.options;
        self.textures
            .get_or_try_insert_with(path, || Texture::load(gl, path, kind, options))
    }

    /// Number of distinct textures uploaded through this cache.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}
