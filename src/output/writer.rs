//! Indentation-aware writing on top of an [`OutputSink`].

use crate::output::{OutputSink, TextTag};

/// One level of indentation
pub const INDENT: &str = "\t";

/// Writes to a sink, indenting every non-empty line by the current nesting depth.
pub struct TextWriter<'s> {
    sink: &'s mut dyn OutputSink,
    indent: usize,
    at_line_start: bool,
}

impl<'s> TextWriter<'s> {
    /// A writer at indentation level 0
    pub fn new(sink: &'s mut dyn OutputSink) -> Self {
        Self::with_indent(sink, 0)
    }

    /// A writer starting at indentation level `indent`
    pub fn with_indent(sink: &'s mut dyn OutputSink, indent: usize) -> Self {
        TextWriter {
            sink,
            indent,
            at_line_start: true,
        }
    }

    /// The current indentation level
    #[must_use]
    pub fn indentation(&self) -> usize {
        self.indent
    }

    /// The underlying sink
    pub fn sink(&mut self) -> &mut dyn OutputSink {
        &mut *self.sink
    }

    /// Appends `text`
    pub fn write(&mut self, text: &str, tag: TextTag) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            self.at_line_start = false;
            if self.indent > 0 {
                self.sink.write(&INDENT.repeat(self.indent), TextTag::Text);
            }
        }
        self.sink.write(text, tag);
    }

    /// Appends a single space
    pub fn space(&mut self) {
        self.write(" ", TextTag::Text);
    }

    /// Ends the current line; an empty line carries no indentation
    pub fn write_line(&mut self) {
        self.sink.write_line();
        self.at_line_start = true;
    }

    /// Writes `// text` as a line of its own
    pub fn comment_line(&mut self, text: &str) {
        self.write("// ", TextTag::Comment);
        self.write(text, TextTag::Comment);
        self.write_line();
    }

    /// Increases the indentation of the following lines
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Decreases the indentation of the following lines
    pub fn unindent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Writes `{` on a line of its own and indents
    pub fn open_brace(&mut self) {
        self.write("{", TextTag::Punctuation);
        self.write_line();
        self.indent();
    }

    /// Unindents and writes `}`, followed by `// comment` when given
    pub fn close_brace(&mut self, comment: Option<&str>) {
        self.unindent();
        self.write("}", TextTag::Punctuation);
        if let Some(comment) = comment {
            self.write(" // ", TextTag::Comment);
            self.write(comment, TextTag::Comment);
        }
        self.write_line();
    }
}

impl std::fmt::Debug for TextWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextWriter")
            .field("indent", &self.indent)
            .field("at_line_start", &self.at_line_start)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::StringSink;

    #[test]
    fn indents_non_empty_lines() {
        let mut sink = StringSink::new();
        let mut out = TextWriter::new(&mut sink);

        out.write(".try", TextTag::Keyword);
        out.write_line();
        out.open_brace();
        out.write("nop", TextTag::Opcode);
        out.write_line();
        out.write_line();
        out.comment_line("note");
        out.close_brace(Some("end .try"));
        assert_eq!(out.indentation(), 0);

        assert_eq!(sink.as_str(), ".try\n{\n\tnop\n\n\t// note\n} // end .try\n");
    }

    #[test]
    fn unindent_saturates() {
        let mut sink = StringSink::new();
        let mut out = TextWriter::with_indent(&mut sink, 1);
        out.unindent();
        out.unindent();
        out.write("x", TextTag::Text);
        assert_eq!(sink.as_str(), "x");
    }
}
