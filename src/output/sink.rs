//! Destinations for rendered text.

use strum::Display;

/// The semantic role of a piece of output text.
///
/// Sinks may use the tag for highlighting or hyperlinking; the text itself is always
/// complete without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TextTag {
    /// Plain text and whitespace
    Text,
    /// Comments, including annotations
    Comment,
    /// Directives and keywords (`.method`, `public`, `.try`)
    Keyword,
    /// Instruction labels (`IL_0000`)
    Label,
    /// Instruction mnemonics
    Opcode,
    /// Numeric literals
    Number,
    /// String literals
    String,
    /// Type names
    Type,
    /// Method, field, property and event names
    Member,
    /// Parameter and local names
    Local,
    /// Braces, parentheses and separators
    Punctuation,
}

/// An append-only destination for rendered output.
///
/// A sink is owned by one writer at a time. Nothing is ever taken back from a sink: output
/// of a member that fails midway is staged in a [`BufferedSink`] and only committed once
/// the member has been written completely.
pub trait OutputSink {
    /// Appends `text`, which never contains a line break
    fn write(&mut self, text: &str, tag: TextTag);

    /// Ends the current line
    fn write_line(&mut self);
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn write(&mut self, text: &str, tag: TextTag) {
        (**self).write(text, tag);
    }

    fn write_line(&mut self) {
        (**self).write_line();
    }
}

/// Collects output into a `String`, remembering the tag of every piece.
#[derive(Debug, Clone, Default)]
pub struct StringSink {
    text: String,
    spans: Vec<(std::ops::Range<usize>, TextTag)>,
}

impl StringSink {
    /// Creates an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The text written so far
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the sink, returning its text
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }

    /// The tagged pieces written so far, as byte ranges of [`StringSink::as_str`]
    #[must_use]
    pub fn spans(&self) -> &[(std::ops::Range<usize>, TextTag)] {
        &self.spans
    }

    /// The text of all pieces written with `tag`
    pub fn tagged(&self, tag: TextTag) -> impl Iterator<Item = &str> + '_ {
        self.spans
            .iter()
            .filter(move |(_, t)| *t == tag)
            .map(|(range, _)| &self.text[range.clone()])
    }

    /// The output split into lines
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.text.lines()
    }
}

impl OutputSink for StringSink {
    fn write(&mut self, text: &str, tag: TextTag) {
        if text.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(text);
        self.spans.push((start..self.text.len(), tag));
    }

    fn write_line(&mut self) {
        self.text.push('\n');
    }
}

#[derive(Debug, Clone)]
enum Chunk {
    Text(String, TextTag),
    Line,
}

/// Stages output until it is known to be complete.
///
/// [`BufferedSink::commit`] replays everything into the real sink; dropping the buffer
/// discards it.
#[derive(Debug, Clone, Default)]
pub struct BufferedSink {
    chunks: Vec<Chunk>,
}

impl BufferedSink {
    /// Creates an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing was written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Writes the staged output to `sink`
    pub fn commit(self, sink: &mut dyn OutputSink) {
        for chunk in self.chunks {
            match chunk {
                Chunk::Text(text, tag) => sink.write(&text, tag),
                Chunk::Line => sink.write_line(),
            }
        }
    }
}

impl OutputSink for BufferedSink {
    fn write(&mut self, text: &str, tag: TextTag) {
        if !text.is_empty() {
            self.chunks.push(Chunk::Text(text.to_string(), tag));
        }
    }

    fn write_line(&mut self) {
        self.chunks.push(Chunk::Line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_sink_tags() {
        let mut sink = StringSink::new();
        sink.write("IL_0000", TextTag::Label);
        sink.write(": ", TextTag::Punctuation);
        sink.write("ret", TextTag::Opcode);
        sink.write("", TextTag::Comment);
        sink.write_line();

        assert_eq!(sink.as_str(), "IL_0000: ret\n");
        assert_eq!(sink.spans().len(), 3);
        assert_eq!(sink.tagged(TextTag::Opcode).collect::<Vec<_>>(), vec!["ret"]);
    }

    #[test]
    fn buffered_sink_commits_in_order() {
        let mut buffer = BufferedSink::new();
        assert!(buffer.is_empty());
        buffer.write("a", TextTag::Text);
        buffer.write_line();
        buffer.write("b", TextTag::Comment);

        let mut sink = StringSink::new();
        sink.write("x", TextTag::Text);
        sink.write_line();
        buffer.commit(&mut sink);

        assert_eq!(sink.as_str(), "x\na\nb");
        assert_eq!(sink.tagged(TextTag::Comment).collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn dropped_buffer_writes_nothing() {
        let mut sink = StringSink::new();
        {
            let mut buffer = BufferedSink::new();
            buffer.write("partial", TextTag::Text);
        }
        sink.write_line();
        assert_eq!(sink.as_str(), "\n");
    }
}
