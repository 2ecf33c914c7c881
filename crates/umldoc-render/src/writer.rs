//! Line-oriented writer with indentation levels.
//!
//! The diagram notation is line-based; this writer owns the output string
//! and prefixes each line with the current two-space indentation.

/// Indentation width in spaces per level.
const INDENT_WIDTH: usize = 2;

/// Accumulates diagram text line by line.
#[derive(Debug, Default)]
pub(crate) struct IndentingWriter {
    out: String,
    level: usize,
}

impl IndentingWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Increase the indentation level for subsequent lines.
    pub(crate) fn indent(&mut self) {
        self.level += 1;
    }

    /// Decrease the indentation level for subsequent lines.
    pub(crate) fn outdent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Write one line at the current indentation.
    pub(crate) fn line(&mut self, text: &str) {
        for _ in 0..self.level * INDENT_WIDTH {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Write an empty line (never indented).
    pub(crate) fn blank(&mut self) {
        self.out.push('\n');
    }

    pub(crate) fn into_string(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_indentation_levels() {
        let mut writer = IndentingWriter::new();
        writer.line("a {");
        writer.indent();
        writer.line("b");
        writer.outdent();
        writer.line("}");
        assert_eq!(writer.into_string(), "a {\n  b\n}\n");
    }

    #[test]
    fn test_blank_lines_not_indented() {
        let mut writer = IndentingWriter::new();
        writer.indent();
        writer.blank();
        writer.line("x");
        assert_eq!(writer.into_string(), "\n  x\n");
    }

    #[test]
    fn test_outdent_below_zero_is_clamped() {
        let mut writer = IndentingWriter::new();
        writer.outdent();
        writer.line("x");
        assert_eq!(writer.into_string(), "x\n");
    }
}
