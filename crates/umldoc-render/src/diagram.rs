//! Diagram scopes and the diagram rendering entry point.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use umldoc_config::Config;
use umldoc_links::ExternalLink;
use umldoc_model::Model;

use crate::RenderError;
use crate::node::{ClassNode, PackageNode, ParentScope, RenderContext, TypeKey};
use crate::writer::IndentingWriter;

/// The documentable unit a diagram covers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagramScope {
    /// One documented package.
    Package(String),
    /// The global overview of every documented type.
    Overview,
}

impl DiagramScope {
    /// Location of the diagram source file below the destination root:
    /// `overview.puml`, or `com/acme/package.puml` for package `com.acme`.
    #[must_use]
    pub fn diagram_file(&self, destination_dir: &Path) -> PathBuf {
        match self {
            DiagramScope::Overview => destination_dir.join("overview.puml"),
            DiagramScope::Package(name) => destination_dir
                .join(name.replace('.', "/"))
                .join("package.puml"),
        }
    }

    /// Location of the generated page this scope corresponds to:
    /// `overview-summary.html`, or `com/acme/package-summary.html`.
    #[must_use]
    pub fn page_file(&self, destination_dir: &Path) -> PathBuf {
        match self {
            DiagramScope::Overview => destination_dir.join("overview-summary.html"),
            DiagramScope::Package(name) => destination_dir
                .join(name.replace('.', "/"))
                .join("package-summary.html"),
        }
    }
}

/// One logical UML diagram scoped to a documentable unit.
///
/// Rendering accumulates the set of encountered type names, which is read
/// after rendering completes to avoid drawing references to types that
/// were never written.
#[derive(Debug)]
pub struct Diagram {
    scope: DiagramScope,
    output: PathBuf,
    encountered: HashSet<TypeKey>,
}

impl Diagram {
    /// Create a diagram for a scope, with its output file below the
    /// destination root.
    #[must_use]
    pub fn new(scope: DiagramScope, destination_dir: &Path) -> Self {
        let output = scope.diagram_file(destination_dir);
        Self {
            scope,
            output,
            encountered: HashSet::new(),
        }
    }

    #[must_use]
    pub fn scope(&self) -> &DiagramScope {
        &self.scope
    }

    /// Path of the diagram source file.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Fully qualified names of every type rendered into this diagram.
    /// Only meaningful after [`Diagram::render`] has run.
    #[must_use]
    pub fn encountered_types(&self) -> &HashSet<TypeKey> {
        &self.encountered
    }

    /// Render the diagram body for this scope.
    ///
    /// The output is deterministic for identical input: children follow
    /// model order plus the fixed member ordering, with no dependence on
    /// map iteration order or timestamps. Rendering twice yields
    /// byte-identical text.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidModel`] on malformed model data and
    /// [`RenderError::UnknownPackage`] when a package diagram's scope is
    /// absent from the model. No partial diagram text is produced on
    /// error.
    pub fn render(
        &mut self,
        model: &Model,
        config: &Config,
        links: &[ExternalLink],
    ) -> Result<String, RenderError> {
        let diagram_dir = self.output.parent().unwrap_or(Path::new("."));
        let mut ctx = RenderContext {
            config,
            links,
            diagram_dir,
            encountered: &mut self.encountered,
        };
        let mut writer = IndentingWriter::new();
        writer.line("@startuml");

        match &self.scope {
            DiagramScope::Overview => {
                // Types are written directly under the diagram root, in
                // model order, deduplicated by qualified name.
                let mut seen: HashSet<TypeKey> = HashSet::new();
                for package in &model.packages {
                    for element in &package.types {
                        let node = ClassNode::from_element(element)?;
                        if seen.insert(node.key().clone()) {
                            writer.blank();
                            node.write_to(&mut ctx, ParentScope::DiagramRoot, &mut writer);
                        }
                    }
                }
            }
            DiagramScope::Package(name) => {
                let package = model
                    .packages
                    .iter()
                    .find(|p| &p.name == name)
                    .ok_or_else(|| RenderError::UnknownPackage(name.clone()))?;
                let node = PackageNode::from_types(&package.name, &package.types)?;
                writer.blank();
                node.write_to(&mut ctx, &mut writer);
            }
        }

        writer.blank();
        writer.line("@enduml");
        Ok(writer.into_string())
    }
}
