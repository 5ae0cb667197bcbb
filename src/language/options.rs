//! Disassembler configuration
//!
//! The options mirror the settings a host exposes for its IL view: which comments to
//! interleave with the instructions, whether to reconstruct control structures, and how
//! members are ordered.

/// Default number of instructions rendered between two cancellation polls
pub const DEFAULT_CANCELLATION_BATCH: usize = 256;

/// Configuration of a disassembly request
///
/// The annotation options gate the lookups they need: with an option off, the
/// corresponding source (opcode tables, token comments, documentation files) is never
/// consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct DisassemblerOptions {
    /// Reconstruct loops, conditionals and exception blocks (structured mode)
    pub detect_control_structure: bool,

    /// Append a one-line description of the opcode to every instruction
    pub show_opcode_docs: bool,

    /// Write the XML documentation of members as `///` lines
    pub show_xml_docs: bool,

    /// Write metadata tokens and RVAs of members, and tokens of instruction operands
    pub show_token_and_rva_comments: bool,

    /// Append the encoded bytes of every instruction
    pub show_raw_bytes: bool,

    /// Order the members of types by name instead of declaration order
    pub sort_members: bool,

    /// Instructions rendered between two cancellation polls (minimum 1)
    pub cancellation_batch: usize,
}

impl Default for DisassemblerOptions {
    fn default() -> Self {
        Self {
            detect_control_structure: true,
            show_opcode_docs: false,
            show_xml_docs: false,
            show_token_and_rva_comments: false,
            show_raw_bytes: false,
            sort_members: false,
            cancellation_batch: DEFAULT_CANCELLATION_BATCH,
        }
    }
}

impl DisassemblerOptions {
    /// Structured mode, no annotations
    #[must_use]
    pub fn structured() -> Self {
        Self::default()
    }

    /// Flat mode, no annotations
    #[must_use]
    pub fn flat() -> Self {
        Self {
            detect_control_structure: false,
            ..Self::default()
        }
    }

    /// Every annotation enabled, structured mode
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            show_opcode_docs: true,
            show_xml_docs: true,
            show_token_and_rva_comments: true,
            show_raw_bytes: true,
            ..Self::default()
        }
    }

    /// Enables or disables structured mode
    #[must_use]
    pub fn with_control_structure(mut self, enabled: bool) -> Self {
        self.detect_control_structure = enabled;
        self
    }

    /// Enables or disables opcode documentation
    #[must_use]
    pub fn with_opcode_docs(mut self, enabled: bool) -> Self {
        self.show_opcode_docs = enabled;
        self
    }

    /// Enables or disables XML documentation
    #[must_use]
    pub fn with_xml_docs(mut self, enabled: bool) -> Self {
        self.show_xml_docs = enabled;
        self
    }

    /// Enables or disables token and RVA comments
    #[must_use]
    pub fn with_token_and_rva_comments(mut self, enabled: bool) -> Self {
        self.show_token_and_rva_comments = enabled;
        self
    }

    /// Enables or disables raw instruction bytes
    #[must_use]
    pub fn with_raw_bytes(mut self, enabled: bool) -> Self {
        self.show_raw_bytes = enabled;
        self
    }

    /// Enables or disables member sorting
    #[must_use]
    pub fn with_sorted_members(mut self, enabled: bool) -> Self {
        self.sort_members = enabled;
        self
    }

    /// Sets the number of instructions between cancellation polls
    #[must_use]
    pub fn with_cancellation_batch(mut self, batch: usize) -> Self {
        self.cancellation_batch = batch.max(1);
        self
    }

    /// Returns `true` if any per-instruction annotation is enabled
    #[must_use]
    pub fn annotates_instructions(&self) -> bool {
        self.show_opcode_docs || self.show_token_and_rva_comments || self.show_raw_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = DisassemblerOptions::default();
        assert!(options.detect_control_structure);
        assert!(!options.annotates_instructions());
        assert!(!options.show_xml_docs);
        assert!(!options.sort_members);
        assert_eq!(options.cancellation_batch, DEFAULT_CANCELLATION_BATCH);
    }

    #[test]
    fn presets() {
        assert!(!DisassemblerOptions::flat().detect_control_structure);
        assert!(DisassemblerOptions::verbose().annotates_instructions());
        assert_eq!(DisassemblerOptions::structured(), DisassemblerOptions::default());
    }

    #[test]
    fn builders() {
        let options = DisassemblerOptions::flat()
            .with_raw_bytes(true)
            .with_sorted_members(true)
            .with_cancellation_batch(0);

        assert!(options.show_raw_bytes);
        assert!(options.sort_members);
        assert!(options.annotates_instructions());
        assert_eq!(options.cancellation_batch, 1);
    }
}
