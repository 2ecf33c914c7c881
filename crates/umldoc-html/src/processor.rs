//! The page postprocessing pipeline.
//!
//! For every generated page below the destination root, the pipeline asks
//! each diagram (in stable order) whether it claims the page. The first
//! claim produces a [`PendingInsertion`]; applying it splices a diagram
//! reference into the page and atomically replaces the file. Unclaimed
//! pages are skipped untouched.

use std::path::{Path, PathBuf};

use umldoc_config::Config;
use umldoc_render::Diagram;
use umldoc_render::path::relativize;

use crate::PostprocessError;
use crate::page::GeneratedPage;

/// Terminal state of one processed page. Failures surface as errors and
/// abort the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// No diagram claimed the page; nothing was touched.
    Skipped,
    /// The page was replaced with content carrying one diagram reference.
    Replaced,
}

/// Counters for one postprocessing pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PostprocessSummary {
    pub replaced: usize,
    pub skipped: usize,
}

/// A deferred, single-use insertion binding one diagram to one page.
#[derive(Debug)]
pub struct PendingInsertion {
    page: GeneratedPage,
    reference: String,
}

impl PendingInsertion {
    /// Read the page, splice the reference at its anchor, and atomically
    /// replace the page file.
    pub fn apply(self) -> Result<(), PostprocessError> {
        let mut lines = self.page.read_lines()?;
        let anchor = insertion_anchor(&lines);
        lines.insert(anchor, self.reference);
        self.page.replace_content(&lines)
    }
}

/// Index at which the reference is spliced: immediately before the page's
/// closing body tag, or at the end when the page has none.
fn insertion_anchor(lines: &[String]) -> usize {
    lines
        .iter()
        .position(|line| line.trim_start().starts_with("</body>"))
        .unwrap_or(lines.len())
}

/// Ask a diagram whether it owns a page.
///
/// Ownership is path correspondence between the diagram's scope and the
/// page's location. On a claim the returned insertion carries the
/// reference markup with a relative link from the page to the diagram
/// source file.
fn claim(
    diagram: &Diagram,
    page: &GeneratedPage,
    config: &Config,
) -> Result<Option<PendingInsertion>, PostprocessError> {
    if diagram.scope().page_file(&config.destination_dir) != page.path() {
        return Ok(None);
    }
    let relative =
        relativize(page.path(), diagram.output()).map_err(|e| PostprocessError::Reference {
            page: page.path().to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(Some(PendingInsertion {
        page: page.clone(),
        reference: format!(r#"<a class="umldoc-diagram" href="{relative}">UML diagram</a>"#),
    }))
}

/// Process one page against the given diagrams, first claim wins.
pub fn process_page(
    page: &GeneratedPage,
    diagrams: &[&Diagram],
    config: &Config,
) -> Result<PageOutcome, PostprocessError> {
    for diagram in diagrams {
        if let Some(insertion) = claim(diagram, page, config)? {
            tracing::info!(page = %page.path().display(), "Adding UML reference");
            insertion.apply()?;
            return Ok(PageOutcome::Replaced);
        }
    }
    tracing::debug!(page = %page.path().display(), "No diagram claims page; skipping");
    Ok(PageOutcome::Skipped)
}

/// Postprocess every generated page below the destination root.
///
/// Diagrams are consulted in a fixed order (sorted by scope) so that runs
/// are reproducible; pages are processed strictly one at a time.
pub fn postprocess(
    config: &Config,
    diagrams: &[Diagram],
) -> Result<PostprocessSummary, PostprocessError> {
    let mut ordered: Vec<&Diagram> = diagrams.iter().collect();
    ordered.sort_by(|a, b| a.scope().cmp(b.scope()));

    let mut summary = PostprocessSummary::default();
    for path in scan_pages(&config.destination_dir)? {
        let page = GeneratedPage::new(path, config.encoding);
        match process_page(&page, &ordered, config)? {
            PageOutcome::Replaced => summary.replaced += 1,
            PageOutcome::Skipped => summary.skipped += 1,
        }
    }
    Ok(summary)
}

/// Collect all page files below the root, sorted for stable processing
/// order.
fn scan_pages(root: &Path) -> Result<Vec<PathBuf>, PostprocessError> {
    let mut pages = Vec::new();
    scan_directory(root, &mut pages)?;
    pages.sort();
    Ok(pages)
}

fn scan_directory(dir: &Path, pages: &mut Vec<PathBuf>) -> Result<(), PostprocessError> {
    let entries = std::fs::read_dir(dir).map_err(|e| PostprocessError::Scan {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| PostprocessError::Scan {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        let path = entry.path();
        if path.is_dir() {
            scan_directory(&path, pages)?;
        } else if GeneratedPage::is_page_file(&path) {
            pages.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use umldoc_config::PageEncoding;
    use umldoc_render::DiagramScope;

    const PAGE: &str = "<html>\n<body>\n<h1>com.acme</h1>\n</body>\n</html>\n";

    /// Destination tree with one package page and its rendered diagram.
    fn setup() -> (tempfile::TempDir, Config, Diagram) {
        let dest = tempfile::tempdir().unwrap();
        let pkg_dir = dest.path().join("com/acme");
        std::fs::create_dir_all(&pkg_dir).unwrap();
        std::fs::write(pkg_dir.join("package-summary.html"), PAGE).unwrap();
        std::fs::write(pkg_dir.join("package.puml"), "@startuml\n@enduml\n").unwrap();

        let config = Config::new(dest.path());
        let diagram = Diagram::new(DiagramScope::Package("com.acme".to_owned()), dest.path());
        (dest, config, diagram)
    }

    #[test]
    fn test_insertion_anchor_before_body_close() {
        let lines: Vec<String> = PAGE.lines().map(str::to_owned).collect();
        assert_eq!(insertion_anchor(&lines), 3);
    }

    #[test]
    fn test_insertion_anchor_defaults_to_end() {
        let lines = vec!["<p>no body close</p>".to_owned()];
        assert_eq!(insertion_anchor(&lines), 1);
    }

    #[test]
    fn test_claimed_page_gets_one_reference() {
        let (dest, config, diagram) = setup();
        let summary = postprocess(&config, &[diagram]).unwrap();

        assert_eq!(
            summary,
            PostprocessSummary {
                replaced: 1,
                skipped: 0
            }
        );
        let content =
            std::fs::read_to_string(dest.path().join("com/acme/package-summary.html")).unwrap();
        assert_eq!(
            content,
            "<html>\n<body>\n<h1>com.acme</h1>\n\
             <a class=\"umldoc-diagram\" href=\"package.puml\">UML diagram</a>\n\
             </body>\n</html>\n"
        );
        // No staging artifact remains beside the page.
        let leftovers: Vec<_> = std::fs::read_dir(dest.path().join("com/acme"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| !name.ends_with(".html") && !name.ends_with(".puml"))
            .collect();
        assert_eq!(leftovers, Vec::<String>::new());
    }

    #[test]
    fn test_unclaimed_page_is_skipped_untouched() {
        let (dest, config, _diagram) = setup();
        let other = dest.path().join("com/acme/Widget.html");
        std::fs::write(&other, PAGE).unwrap();

        // No diagrams at all: both pages skip.
        let summary = postprocess(&config, &[]).unwrap();
        assert_eq!(
            summary,
            PostprocessSummary {
                replaced: 0,
                skipped: 2
            }
        );
        assert_eq!(std::fs::read_to_string(&other).unwrap(), PAGE);
    }

    #[test]
    fn test_first_claim_wins() {
        let (dest, config, diagram) = setup();
        // A second diagram with the identical scope also claims the page;
        // only the first in stable order inserts.
        let twin = Diagram::new(DiagramScope::Package("com.acme".to_owned()), dest.path());
        let summary = postprocess(&config, &[diagram, twin]).unwrap();

        assert_eq!(summary.replaced, 1);
        let content =
            std::fs::read_to_string(dest.path().join("com/acme/package-summary.html")).unwrap();
        assert_eq!(content.matches("umldoc-diagram").count(), 1);
    }

    #[test]
    fn test_overview_claim() {
        let (dest, config, _diagram) = setup();
        std::fs::write(dest.path().join("overview-summary.html"), PAGE).unwrap();
        std::fs::write(dest.path().join("overview.puml"), "@startuml\n@enduml\n").unwrap();
        let overview = Diagram::new(DiagramScope::Overview, dest.path());

        let summary = postprocess(&config, &[overview]).unwrap();
        assert_eq!(summary.replaced, 1);
        let content =
            std::fs::read_to_string(dest.path().join("overview-summary.html")).unwrap();
        assert!(content.contains(r#"href="overview.puml""#));
    }

    #[test]
    fn test_unreadable_claimed_page_is_fatal() {
        let (dest, config, diagram) = setup();
        std::fs::write(
            dest.path().join("com/acme/package-summary.html"),
            [0xff, 0xfe],
        )
        .unwrap();

        let result = postprocess(&config, &[diagram]);
        assert!(matches!(result, Err(PostprocessError::Read { .. })));
    }

    #[test]
    fn test_scan_order_is_stable() {
        let dest = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dest.path().join("b")).unwrap();
        std::fs::write(dest.path().join("b/two.html"), "x").unwrap();
        std::fs::write(dest.path().join("a.html"), "x").unwrap();
        std::fs::write(dest.path().join("z.html"), "x").unwrap();

        let pages = scan_pages(dest.path()).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.strip_prefix(dest.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.html", "b/two.html", "z.html"]);
    }
}
