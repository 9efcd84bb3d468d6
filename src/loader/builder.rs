use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::file::{read_local, resolve_top_level, Location};
use super::source::{default_fetcher, RemoteFetcher};
use crate::annotation::AnnotationRegistry;
use crate::context::IniContext;
use crate::host::{HostIdentity, SystemHost};
use crate::parser::parse_into;
use crate::preprocess::preprocess;
use crate::Error;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Loads INI documents into an [`IniContext`].
///
/// A load reads the document, resolves `#@if` blocks, expands `#@for`
/// blocks, then parses sections, items, `#include` and `#@function` lines.
/// Included documents go through the same pipeline and merge into the same
/// context. Once everything is read, each section's items are sorted by
/// name.
///
/// Any hard failure discards the partially built context and returns the
/// error.
///
/// ## Example
///
/// ```no_run
/// use ini_directives::{AnnotationRegistry, Loader};
/// use std::sync::Arc;
///
/// let registry = AnnotationRegistry::new()
///     .register_fn("split", |raw: &str| raw.split(',').map(str::to_string).collect());
///
/// let ctx = Loader::builder()
///     .with_annotations(Arc::new(registry))
///     .load_file("conf/server.conf")?;
///
/// let port = ctx.get_int("server", "port", 8080);
/// # Ok::<(), ini_directives::Error>(())
/// ```
#[derive(Debug, Clone)]
#[must_use = "loaders do nothing until a load method is called"]
pub struct Loader {
    annotations: Option<Arc<AnnotationRegistry>>,
    annotations_enabled: bool,
    host: Arc<dyn HostIdentity>,
    fetcher: Option<Arc<dyn RemoteFetcher>>,
    connect_timeout: Duration,
    network_timeout: Duration,
    base_dir: Option<PathBuf>,
    max_include_depth: usize,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            annotations: None,
            annotations_enabled: true,
            host: Arc::new(SystemHost),
            fetcher: default_fetcher(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
            base_dir: None,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl Loader {
    /// Creates a loader with default settings.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Functions available to `#@function` lines.
    pub fn with_annotations(mut self, registry: Arc<AnnotationRegistry>) -> Self {
        self.annotations = Some(registry);
        self
    }

    /// When `true`, `#@function` lines are skipped and the following
    /// key=value line is read as-is.
    pub fn ignore_annotations(mut self, ignore: bool) -> Self {
        self.annotations_enabled = !ignore;
        self
    }

    /// Identity that `%{LOCAL_HOST}` and `%{LOCAL_IP}` are compared against.
    pub fn with_host(mut self, host: Arc<dyn HostIdentity>) -> Self {
        self.host = host;
        self
    }

    /// Fetcher for `http://` and `https://` documents.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Timeouts passed to the remote fetcher.
    pub fn with_timeouts(mut self, connect: Duration, network: Duration) -> Self {
        self.connect_timeout = connect;
        self.network_timeout = network;
        self
    }

    /// Directory for relative includes of in-memory documents. Defaults to
    /// the working directory. A directory longer than
    /// [`MAX_PATH_LEN`](super::MAX_PATH_LEN) fails only once a relative
    /// `#include` is resolved against it.
    pub fn with_base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Deepest include nesting accepted before the load fails.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub(crate) fn annotations(&self) -> Option<&AnnotationRegistry> {
        self.annotations.as_deref()
    }

    /// Loads a local file or a remote URL.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<IniContext, Error> {
        let path = path.as_ref();
        let (location, base_dir) = resolve_top_level(path)?;

        let mut ctx = IniContext::new(base_dir, self.annotations_enabled);
        let result = self.load_location(&mut ctx, &location, 0);
        self.finish(ctx, result, &location.to_string())
    }

    /// Loads an in-memory document.
    pub fn load_str(&self, content: &str) -> Result<IniContext, Error> {
        let base_dir = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(Error::CurrentDir)?,
        };

        let mut ctx = IniContext::new(base_dir, self.annotations_enabled);
        let result = self.load_content(&mut ctx, Arc::from(content), 0);
        self.finish(ctx, result, "<memory>")
    }

    /// Loads an in-memory document given as bytes. Invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn load_bytes(&self, content: &[u8]) -> Result<IniContext, Error> {
        self.load_str(&String::from_utf8_lossy(content))
    }

    fn finish(
        &self,
        mut ctx: IniContext,
        result: Result<(), Error>,
        source: &str,
    ) -> Result<IniContext, Error> {
        match result {
            Ok(()) => {
                ctx.sort_items();
                tracing::debug!(
                    source,
                    sections = ctx.section_names().len(),
                    scratch_buffers = ctx.scratch().len(),
                    "ini context loaded"
                );
                Ok(ctx)
            }
            Err(e) => {
                tracing::error!(source, error = %e, "failed to load ini context");
                ctx.destroy();
                Err(e)
            }
        }
    }

    pub(crate) fn load_location(
        &self,
        ctx: &mut IniContext,
        location: &Location,
        depth: usize,
    ) -> Result<(), Error> {
        if depth > self.max_include_depth {
            return Err(Error::IncludeDepthExceeded(self.max_include_depth));
        }

        let content = match location {
            Location::Local(path) => read_local(path)?,
            Location::Remote(url) => self.fetch_remote(url)?,
        };
        tracing::debug!(%location, depth, bytes = content.len(), "reading ini document");

        self.load_content(ctx, Arc::from(content), depth)
    }

    fn load_content(&self, ctx: &mut IniContext, content: Arc<str>, depth: usize) -> Result<(), Error> {
        let expanded = preprocess(content, ctx.arena_mut(), self.host.as_ref())?;
        parse_into(self, ctx, &expanded, depth)
    }

    fn fetch_remote(&self, url: &str) -> Result<String, Error> {
        let fetcher = self
            .fetcher
            .as_ref()
            .ok_or_else(|| Error::NoFetcher(url.to_string()))?;

        let response = fetcher
            .fetch(url, self.connect_timeout, self.network_timeout)
            .map_err(|source| Error::Fetch {
                url: url.to_string(),
                source,
            })?;
        if response.status != 200 {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(String::from_utf8_lossy(&response.body).into_owned())
    }
}
