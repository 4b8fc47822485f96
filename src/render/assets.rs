//! Image sources for backgrounds and photo elements.
//!
//! A source string is one of:
//!
//! | Form | Example | Loaded from |
//! |------|---------|-------------|
//! | data URL | `data:image/png;base64,iVBOR...` | decoded inline |
//! | http(s) URL | `https://example.com/logo.png` | downloaded |
//! | asset path | `templates/corporate-blue.png` | the asset directory |
//!
//! [`AssetLoader::load_template`] gathers everything a render needs up front
//! so composition itself stays synchronous and can run on a blocking thread.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::DynamicImage;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::document::{ElementKind, FieldValues, Template};
use crate::error::CardpressError;

/// Decoded images cached across requests.
const CACHE_CAPACITY: usize = 64;

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// Inline `data:` URL: media type and payload bytes.
    Data { mime: String, bytes: Vec<u8> },
    /// Remote http(s) URL.
    Remote(&'a str),
    /// Path relative to the asset directory.
    Asset(&'a str),
}

impl<'a> ImageSource<'a> {
    /// Classify a source string.
    pub fn parse(src: &'a str) -> Result<Self, CardpressError> {
        let src = src.trim();
        if let Some(rest) = src.strip_prefix("data:") {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| CardpressError::Image("Malformed data URL".into()))?;
            let mime = meta.split(';').next().unwrap_or_default().to_string();
            let bytes = if meta.ends_with(";base64") {
                STANDARD
                    .decode(payload.trim())
                    .map_err(|e| CardpressError::Image(format!("Invalid base64 in data URL: {}", e)))?
            } else {
                payload.as_bytes().to_vec()
            };
            return Ok(ImageSource::Data { mime, bytes });
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Ok(ImageSource::Remote(src));
        }
        if src.is_empty() {
            return Err(CardpressError::Image("Empty image source".into()));
        }
        Ok(ImageSource::Asset(src))
    }
}

/// Encode bytes as a `data:` URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Fetches remote image bytes.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CardpressError>;
}

/// [`Fetcher`] backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, CardpressError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cardpress/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CardpressError::Transport(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CardpressError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CardpressError::Transport(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(CardpressError::Transport(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CardpressError::Transport(format!("Failed to read image data: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

struct CachedImage {
    image: Arc<DynamicImage>,
    last_used: Instant,
}

/// Images resolved for one render, keyed by source string.
#[derive(Default, Clone)]
pub struct LoadedImages {
    images: HashMap<String, Arc<DynamicImage>>,
}

impl LoadedImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, src: &str) -> Option<&DynamicImage> {
        self.images.get(src).map(|i| i.as_ref())
    }

    pub fn insert(&mut self, src: impl Into<String>, image: DynamicImage) {
        self.images.insert(src.into(), Arc::new(image));
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Resolves image sources to decoded images, with a small LRU cache for
/// remote and asset images.
pub struct AssetLoader {
    fetcher: Arc<dyn Fetcher>,
    asset_dir: Option<PathBuf>,
    cache: RwLock<HashMap<String, CachedImage>>,
}

impl AssetLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>, asset_dir: Option<PathBuf>) -> Self {
        Self {
            fetcher,
            asset_dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Loader with an HTTP fetcher.
    pub fn http(asset_dir: Option<PathBuf>) -> Result<Self, CardpressError> {
        Ok(Self::new(Arc::new(HttpFetcher::new()?), asset_dir))
    }

    /// Load and decode one source.
    pub async fn load(&self, src: &str) -> Result<Arc<DynamicImage>, CardpressError> {
        let bytes = match ImageSource::parse(src)? {
            ImageSource::Data { bytes, .. } => {
                return Ok(Arc::new(image::load_from_memory(&bytes)?));
            }
            ImageSource::Remote(url) => {
                if let Some(hit) = self.cached(src).await {
                    return Ok(hit);
                }
                self.fetcher.fetch(url).await?
            }
            ImageSource::Asset(path) => {
                if let Some(hit) = self.cached(src).await {
                    return Ok(hit);
                }
                let full = self.asset_path(path)?;
                tokio::fs::read(&full)
                    .await
                    .map_err(|e| CardpressError::NotFound(format!("asset '{}': {}", path, e)))?
            }
        };
        let image = Arc::new(image::load_from_memory(&bytes)?);

        let mut cache = self.cache.write().await;
        if cache.len() >= CACHE_CAPACITY
            && let Some(oldest) = cache
                .iter()
                .min_by_key(|(_, v)| v.last_used)
                .map(|(k, _)| k.clone())
        {
            cache.remove(&oldest);
        }
        cache.insert(
            src.to_string(),
            CachedImage {
                image: image.clone(),
                last_used: Instant::now(),
            },
        );
        Ok(image)
    }

    async fn cached(&self, src: &str) -> Option<Arc<DynamicImage>> {
        let mut cache = self.cache.write().await;
        let entry = cache.get_mut(src)?;
        entry.last_used = Instant::now();
        Some(entry.image.clone())
    }

    /// Resolve an asset path inside the asset directory, refusing traversal.
    fn asset_path(&self, path: &str) -> Result<PathBuf, CardpressError> {
        let root = self
            .asset_dir
            .as_ref()
            .ok_or_else(|| CardpressError::NotFound(format!("asset '{}' (no asset directory)", path)))?;
        let rel = Path::new(path.trim_start_matches('/'));
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(CardpressError::Validation(format!("Invalid asset path '{}'", path)));
        }
        Ok(root.join(rel))
    }

    /// Every image a render of `template` with `values` will draw.
    ///
    /// Sources that fail to load are logged and skipped; the renderer draws
    /// a placeholder in their place.
    pub async fn load_template(&self, template: &Template, values: &FieldValues) -> LoadedImages {
        let mut sources: Vec<&str> = Vec::new();
        if let Some(bg) = template.canvas.background_image.as_deref()
            && !bg.trim().is_empty()
        {
            sources.push(bg);
        }
        for element in &template.elements {
            if matches!(element.kind, ElementKind::Image(_))
                && let Some(src) = values.image_for(element)
            {
                sources.push(src);
            }
        }

        let mut loaded = LoadedImages::new();
        for src in sources {
            if loaded.images.contains_key(src) {
                continue;
            }
            match self.load(src).await {
                Ok(image) => {
                    loaded.images.insert(src.to_string(), image);
                }
                Err(e) => {
                    tracing::warn!(source = %abbreviate(src), error = %e, "Image unavailable, drawing placeholder");
                }
            }
        }
        loaded
    }
}

/// Shorten data URLs for log output.
fn abbreviate(src: &str) -> String {
    if src.len() > 80 {
        let cut = (0..=80).rev().find(|i| src.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &src[..cut])
    } else {
        src.to_string()
    }
}
