//! UML diagram rendering for umldoc.
//!
//! This crate walks the documentable-element model and emits the textual
//! diagram notation:
//! - [`Diagram`] scopes one diagram to a package or the global overview
//!   and drives a render pass over the model
//! - the render tree orders members deterministically and resolves type
//!   names against the diagram context
//! - [`path::relativize`] computes forward-slash relative references for
//!   embedded links
//!
//! Rendering is all-or-nothing: malformed model data fails the pass with
//! [`RenderError`] and no partial diagram text is produced.

mod diagram;
mod node;
pub mod path;
mod writer;

pub use diagram::{Diagram, DiagramScope};
pub use node::TypeKey;

/// Errors that abort a render pass.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The model handed over by the documentation generator is missing
    /// required data.
    #[error("invalid model data: {0}")]
    InvalidModel(String),
    /// A package diagram's scope does not occur in the model.
    #[error("model contains no package named {0}")]
    UnknownPackage(String),
}
