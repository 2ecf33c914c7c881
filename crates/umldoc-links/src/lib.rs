//! External apidoc cross-reference resolution.
//!
//! An [`ExternalLink`] represents one externally hosted documentation root.
//! Given a `(package, type)` pair it decides whether that target is
//! documented at the external root and, if so, builds the reference to its
//! page. The decision is backed by the root's package list: a line-oriented
//! text resource naming every documented package, fetched lazily on the
//! first lookup and cached for the lifetime of the run.
//!
//! Package-list failures are recoverable: the resolver logs a warning and
//! caches an empty set, so broken external-link configuration costs the
//! cross-references but never the run (and never a second fetch attempt).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use umldoc_config::ExternalLinkSpec;
use ureq::Agent;

/// Conventional filename of the package list below an apidoc root.
const PACKAGE_LIST_FILENAME: &str = "package-list";

/// Query parameter marking a link as external, appended for online-style
/// configurations (mirrors the standard doclet's link marker).
const EXTERNAL_MARKER: &str = "is-external=true";

/// HTTP timeout for package-list fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A documentation location: a remote HTTP root or a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LinkLocation {
    Remote(String),
    Local(PathBuf),
}

impl LinkLocation {
    /// Parse a configured URI string.
    ///
    /// `http(s)` URIs are remote. Anything else is tried as a literal
    /// filesystem path (relative paths resolve against the destination
    /// directory); a path that does not exist is a configuration error.
    fn parse(uri: &str, destination_dir: &Path) -> Result<Self, LinkError> {
        if is_remote(uri) {
            return Ok(LinkLocation::Remote(uri.trim_end_matches('/').to_owned()));
        }
        let path = resolve_path(uri, destination_dir);
        if path.exists() {
            Ok(LinkLocation::Local(path))
        } else {
            Err(LinkError::InvalidConfig {
                uri: uri.to_owned(),
            })
        }
    }

    /// Parse a configured package-list URI string.
    ///
    /// Unlike [`LinkLocation::parse`] this never fails: a missing local
    /// file surfaces later as a recoverable fetch failure, not as a
    /// configuration error.
    fn parse_lenient(uri: &str, destination_dir: &Path) -> Self {
        if is_remote(uri) {
            LinkLocation::Remote(uri.trim_end_matches('/').to_owned())
        } else {
            LinkLocation::Local(resolve_path(uri, destination_dir))
        }
    }

    /// Human-readable form for log messages.
    fn display(&self) -> String {
        match self {
            LinkLocation::Remote(url) => url.clone(),
            LinkLocation::Local(path) => path.display().to_string(),
        }
    }
}

fn is_remote(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

fn resolve_path(uri: &str, destination_dir: &Path) -> PathBuf {
    let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        destination_dir.join(path)
    }
}

/// A resolved cross-reference target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLink {
    /// Absolute URL, ready to embed as-is.
    Remote(String),
    /// Local file; callers relativize it against the embedding location.
    Local(PathBuf),
}

/// Errors from external-link configuration.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The configured URI is neither a supported URL nor an existing path.
    #[error("external link is not a valid URI or existing path: {uri}")]
    InvalidConfig { uri: String },
}

/// One externally hosted documentation root.
///
/// Online style (`apidoc` only): the package list lives at
/// `<apidoc>/package-list` and resolved references carry the external
/// marker query parameter. Offline style (`apidoc` + `package_list`): the
/// list location is configured independently, for setups where the list is
/// not reachable from the same root as the documents.
pub struct ExternalLink {
    doc_base: LinkLocation,
    package_list: LinkLocation,
    online: bool,
    agent: Agent,
    packages: OnceLock<HashSet<String>>,
}

impl ExternalLink {
    /// Build a resolver from one configured declaration.
    ///
    /// Fails fast, before any rendering work begins, when the apidoc base
    /// is neither a supported URL nor an existing filesystem path.
    pub fn from_spec(
        spec: &ExternalLinkSpec,
        destination_dir: &Path,
    ) -> Result<Self, LinkError> {
        let doc_base = LinkLocation::parse(&spec.apidoc, destination_dir)?;
        let (package_list, online) = match &spec.package_list {
            Some(uri) => (LinkLocation::parse_lenient(uri, destination_dir), false),
            None => (
                match &doc_base {
                    LinkLocation::Remote(url) => {
                        LinkLocation::Remote(format!("{url}/{PACKAGE_LIST_FILENAME}"))
                    }
                    LinkLocation::Local(dir) => {
                        LinkLocation::Local(dir.join(PACKAGE_LIST_FILENAME))
                    }
                },
                true,
            ),
        };
        Ok(Self {
            doc_base,
            package_list,
            online,
            agent: create_agent(FETCH_TIMEOUT),
            packages: OnceLock::new(),
        })
    }

    /// Resolve a `(package, type)` pair to an external reference.
    ///
    /// Returns `None` when the package is not documented at this root.
    /// The first call fetches and caches the package list; subsequent
    /// calls reuse the cache without refetching, even after a failed
    /// fetch.
    pub fn resolve_type(&self, package: &str, type_name: &str) -> Option<ResolvedLink> {
        if !self.packages().contains(package) {
            return None;
        }
        let document = format!("{}/{type_name}.html", package.replace('.', "/"));
        Some(match &self.doc_base {
            LinkLocation::Remote(base) => {
                let mut url = format!("{base}/{document}");
                if self.online {
                    let sep = if url.contains('?') { '&' } else { '?' };
                    url.push(sep);
                    url.push_str(EXTERNAL_MARKER);
                }
                ResolvedLink::Remote(url)
            }
            LinkLocation::Local(dir) => ResolvedLink::Local(dir.join(document)),
        })
    }

    /// The cached package set, fetched on first use.
    fn packages(&self) -> &HashSet<String> {
        self.packages.get_or_init(|| match self.fetch_package_list() {
            Ok(packages) => packages,
            Err(message) => {
                tracing::warn!(
                    resource = %self.package_list.display(),
                    target = %self.doc_base.display(),
                    error = %message,
                    "Failed to read package list; external references disabled for this target"
                );
                HashSet::new()
            }
        })
    }

    /// Fetch the package-list resource: one package name per non-blank
    /// line, surrounding whitespace trimmed.
    fn fetch_package_list(&self) -> Result<HashSet<String>, String> {
        let text = match &self.package_list {
            LinkLocation::Remote(url) => fetch_remote(&self.agent, url)?,
            LinkLocation::Local(path) => {
                std::fs::read_to_string(path).map_err(|e| e.to_string())?
            }
        };
        Ok(parse_package_list(&text))
    }

    /// Pre-seed the package cache, bypassing the fetch.
    #[cfg(test)]
    fn with_packages(mut self, packages: impl IntoIterator<Item = &'static str>) -> Self {
        let set: HashSet<String> = packages.into_iter().map(str::to_owned).collect();
        self.packages = OnceLock::from(set);
        self
    }
}

/// Create an HTTP agent with the specified timeout.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

fn fetch_remote(agent: &Agent, url: &str) -> Result<String, String> {
    let response = agent.get(url).call().map_err(|e| e.to_string())?;
    let status = response.status().as_u16();
    let mut body = response.into_body();
    if status >= 400 {
        return Err(format!("HTTP {status}"));
    }
    body.read_to_string().map_err(|e| e.to_string())
}

fn parse_package_list(text: &str) -> HashSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
