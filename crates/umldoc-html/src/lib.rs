//! Postprocessing of generated documentation pages.
//!
//! After the diagrams are rendered, this crate walks the generated pages,
//! decides which diagram (if any) belongs to each page, splices the
//! diagram reference in, and atomically replaces the page on disk:
//! - [`GeneratedPage`]: one page, read in the configured encoding and
//!   replaced via a staging file (rename, with a copy fallback)
//! - [`PendingInsertion`]: a single-use claim binding one diagram to one
//!   page
//! - [`postprocess`]: the pipeline over all pages below the destination
//!   root
//!
//! The write path is crash-tolerant up to the deletion of the original: a
//! staging artifact survives a crash before the replace. A crash between
//! delete and rename can leave the page absent; that window is an accepted
//! limitation of the delete-then-rename strategy.

mod page;
mod processor;

pub use page::GeneratedPage;
pub use processor::{PageOutcome, PendingInsertion, PostprocessSummary, postprocess, process_page};

use std::path::PathBuf;

/// Errors that abort a postprocessing pass.
///
/// Every variant is fatal: the pipeline never leaves a page half-replaced
/// as its intended final state, so any failure unwinds the whole run.
#[derive(Debug, thiserror::Error)]
pub enum PostprocessError {
    /// A generated page could not be read or decoded.
    #[error("cannot read generated page {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },
    /// The original page could not be deleted before the replace; going
    /// on could leave orphaned or duplicated content.
    #[error("cannot delete {} before replacing it: {reason}", .path.display())]
    Delete { path: PathBuf, reason: String },
    /// The staging artifact could not be created, written or copied.
    #[error("staging failure at {}: {reason}", .path.display())]
    Staging { path: PathBuf, reason: String },
    /// The staging artifact could not be deleted after the copy fallback;
    /// it would be left behind as a resource leak.
    #[error("cannot delete staging file {} after copying: {reason}", .path.display())]
    StagingLeak { path: PathBuf, reason: String },
    /// The destination tree could not be scanned for pages.
    #[error("cannot scan {}: {reason}", .path.display())]
    Scan { path: PathBuf, reason: String },
    /// No relative reference from a claimed page to its diagram could be
    /// computed.
    #[error("cannot build diagram reference for {}: {reason}", .page.display())]
    Reference { page: PathBuf, reason: String },
}
