//! umldoc augments generated API documentation with structural UML
//! diagrams.
//!
//! Given the documentable-element model handed over by the documentation
//! generator and the run configuration, [`run`] performs one complete
//! pass:
//!
//! 1. build the external link resolvers (failing fast on broken link
//!    configuration),
//! 2. render one diagram per documented package plus a global overview
//!    and write the diagram source files below the destination root,
//! 3. postprocess the generated pages, splicing a diagram reference into
//!    every page a diagram claims.
//!
//! The pass either completes with all claimed pages updated and all
//! diagrams emitted, or stops with a fatal error identifying the
//! offending file or resource. Broken external-link package lists never
//! abort the run; those cross-references are simply omitted (with a
//! warning).

use std::path::PathBuf;

use umldoc_config::{Config, ConfigError};
use umldoc_html::{PostprocessError, postprocess};
use umldoc_links::{ExternalLink, LinkError};
use umldoc_model::Model;
use umldoc_render::{Diagram, DiagramScope, RenderError};

pub use umldoc_config as config;
pub use umldoc_html as html;
pub use umldoc_links as links;
pub use umldoc_model as model;
pub use umldoc_render as render;

/// Everything that can abort a generation pass.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Postprocess(#[from] PostprocessError),
    /// A diagram source file could not be written.
    #[error("cannot write diagram {}: {reason}", .path.display())]
    DiagramWrite { path: PathBuf, reason: String },
}

/// Counters for one completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Diagram source files written.
    pub diagrams: usize,
    /// Pages replaced with an inserted diagram reference.
    pub pages_replaced: usize,
    /// Pages no diagram claimed.
    pub pages_skipped: usize,
}

/// Run one complete documentation-augmentation pass.
pub fn run(config: &Config, model: &Model) -> Result<RunSummary, Error> {
    config.validate()?;

    let links = config
        .external_links
        .iter()
        .map(|spec| ExternalLink::from_spec(spec, &config.destination_dir))
        .collect::<Result<Vec<_>, _>>()?;

    let mut diagrams = Vec::with_capacity(model.packages.len() + 1);
    for package in &model.packages {
        diagrams.push(Diagram::new(
            DiagramScope::Package(package.name.clone()),
            &config.destination_dir,
        ));
    }
    diagrams.push(Diagram::new(DiagramScope::Overview, &config.destination_dir));

    for diagram in &mut diagrams {
        write_diagram(diagram, model, config, &links)?;
    }

    let summary = postprocess(config, &diagrams)?;
    tracing::info!(
        diagrams = diagrams.len(),
        replaced = summary.replaced,
        skipped = summary.skipped,
        "Documentation pass completed"
    );
    Ok(RunSummary {
        diagrams: diagrams.len(),
        pages_replaced: summary.replaced,
        pages_skipped: summary.skipped,
    })
}

/// Render one diagram and write its source file, creating parent
/// directories as needed.
fn write_diagram(
    diagram: &mut Diagram,
    model: &Model,
    config: &Config,
    links: &[ExternalLink],
) -> Result<(), Error> {
    if let Some(parent) = diagram.output().parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::DiagramWrite {
            path: diagram.output().to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    let text = diagram.render(model, config, links)?;
    std::fs::write(diagram.output(), text).map_err(|e| Error::DiagramWrite {
        path: diagram.output().to_path_buf(),
        reason: e.to_string(),
    })?;
    tracing::debug!(diagram = %diagram.output().display(), "Wrote diagram source");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use umldoc_config::ExternalLinkSpec;
    use umldoc_model::{Field, PackageElement, TypeElement, TypeKind, Visibility};

    const PAGE: &str = "<html>\n<body>\n<h1>page</h1>\n</body>\n</html>\n";

    fn model() -> Model {
        Model {
            packages: vec![PackageElement {
                name: "com.acme".to_owned(),
                types: vec![TypeElement {
                    qualified_name: "com.acme.Widget".to_owned(),
                    package: "com.acme".to_owned(),
                    kind: TypeKind::Class,
                    is_abstract: false,
                    is_deprecated: false,
                    type_params: Vec::new(),
                    enum_constants: Vec::new(),
                    fields: vec![Field {
                        name: "name".to_owned(),
                        type_name: Some("String".to_owned()),
                        is_static: false,
                        visibility: Visibility::Private,
                    }],
                    constructors: Vec::new(),
                    methods: Vec::new(),
                    tags: Vec::new(),
                }],
            }],
        }
    }

    fn destination() -> tempfile::TempDir {
        let dest = tempfile::tempdir().unwrap();
        let pkg_dir = dest.path().join("com/acme");
        std::fs::create_dir_all(&pkg_dir).unwrap();
        std::fs::write(pkg_dir.join("package-summary.html"), PAGE).unwrap();
        std::fs::write(pkg_dir.join("Widget.html"), PAGE).unwrap();
        std::fs::write(dest.path().join("overview-summary.html"), PAGE).unwrap();
        dest
    }

    #[test]
    fn test_full_pass() {
        let dest = destination();
        let config = Config::new(dest.path());

        let summary = run(&config, &model()).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                diagrams: 2,
                pages_replaced: 2,
                pages_skipped: 1
            }
        );

        // Diagram sources exist and carry the expected scopes.
        let package_diagram =
            std::fs::read_to_string(dest.path().join("com/acme/package.puml")).unwrap();
        assert!(package_diagram.contains("package com.acme {"));
        assert!(package_diagram.contains("class Widget {"));
        let overview =
            std::fs::read_to_string(dest.path().join("overview.puml")).unwrap();
        assert!(overview.contains("class com.acme.Widget {"));

        // Claimed pages carry exactly one reference each.
        let package_page =
            std::fs::read_to_string(dest.path().join("com/acme/package-summary.html")).unwrap();
        assert_eq!(package_page.matches("umldoc-diagram").count(), 1);
        assert!(package_page.contains(r#"href="package.puml""#));
        let overview_page =
            std::fs::read_to_string(dest.path().join("overview-summary.html")).unwrap();
        assert!(overview_page.contains(r#"href="overview.puml""#));

        // The class page is not claimed and stays untouched.
        assert_eq!(
            std::fs::read_to_string(dest.path().join("com/acme/Widget.html")).unwrap(),
            PAGE
        );
    }

    #[test]
    fn test_two_passes_render_identically() {
        let dest_a = destination();
        let dest_b = destination();
        run(&Config::new(dest_a.path()), &model()).unwrap();
        run(&Config::new(dest_b.path()), &model()).unwrap();

        let a = std::fs::read_to_string(dest_a.path().join("overview.puml")).unwrap();
        let b = std::fs::read_to_string(dest_b.path().join("overview.puml")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_link_configuration_fails_before_rendering() {
        let dest = destination();
        let mut config = Config::new(dest.path());
        config.external_links.push(ExternalLinkSpec {
            apidoc: "no/such/path".to_owned(),
            package_list: None,
        });

        let result = run(&config, &model());
        assert!(matches!(result, Err(Error::Link(_))));
        // Fail fast: nothing was rendered.
        assert!(!dest.path().join("overview.puml").exists());
    }

    #[test]
    fn test_broken_package_list_does_not_abort() {
        let dest = destination();
        let mut config = Config::new(dest.path());
        // The apidoc base resolves to an existing directory, but its
        // package list is missing: references degrade, the run completes.
        std::fs::create_dir(dest.path().join("other-api")).unwrap();
        config.external_links.push(ExternalLinkSpec {
            apidoc: "other-api".to_owned(),
            package_list: None,
        });

        let summary = run(&config, &model()).unwrap();
        assert_eq!(summary.pages_replaced, 2);
        let overview = std::fs::read_to_string(dest.path().join("overview.puml")).unwrap();
        assert!(!overview.contains("[["));
    }

    #[test]
    fn test_malformed_model_aborts() {
        let dest = destination();
        let mut bad = model();
        bad.packages[0].types[0].qualified_name = String::new();

        let result = run(&Config::new(dest.path()), &bad);
        assert!(matches!(result, Err(Error::Render(RenderError::InvalidModel(_)))));
    }
}
