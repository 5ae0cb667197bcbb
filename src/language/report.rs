//! The outcome of a disassembly request.

use strum::Display;

use crate::{analysis::IrreducibleRegionWarning, metadata::members::MemberKind, Error};

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum DisassemblyStatus {
    /// Every member was written
    #[default]
    Completed,
    /// All members were visited, some were replaced by failure comments
    CompletedWithFailures,
    /// The request was cancelled; the output is incomplete and should be discarded
    Cancelled,
}

/// A member whose disassembly failed and was replaced by a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFailure {
    /// Kind of the failed member
    pub kind: MemberKind,
    /// Name of the failed member
    pub name: String,
    /// Short class of the failure, as written in the output
    pub class: &'static str,
    /// The full error message
    pub message: String,
}

impl MemberFailure {
    pub(crate) fn new(kind: MemberKind, name: &str, error: &Error) -> Self {
        MemberFailure {
            kind,
            name: name.to_string(),
            class: error.failure_class(),
            message: error.to_string(),
        }
    }
}

/// Summary of one [`crate::language::IlLanguage::decompile`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisassemblyReport {
    /// How the request ended
    pub status: DisassemblyStatus,
    /// Number of members written completely
    pub members_written: usize,
    /// Members replaced by failure comments, in output order
    pub failures: Vec<MemberFailure>,
    /// Spans rendered flat in structured mode, in output order
    pub warnings: Vec<IrreducibleRegionWarning>,
}

impl DisassemblyReport {
    /// Returns `true` if the request was cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.status == DisassemblyStatus::Cancelled
    }

    /// Returns `true` if every member was written without failures
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.status == DisassemblyStatus::Completed
    }

    pub(crate) fn finish(&mut self, cancelled: bool) {
        self.status = if cancelled {
            DisassemblyStatus::Cancelled
        } else if self.failures.is_empty() {
            DisassemblyStatus::Completed
        } else {
            DisassemblyStatus::CompletedWithFailures
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_failures() {
        let mut report = DisassemblyReport::default();
        report.finish(false);
        assert!(report.is_clean());

        report.failures.push(MemberFailure::new(
            MemberKind::Method,
            "Main",
            &Error::Decode {
                offset: 3,
                message: "reserved opcode 24".to_string(),
            },
        ));
        report.finish(false);
        assert_eq!(report.status, DisassemblyStatus::CompletedWithFailures);
        assert_eq!(report.failures[0].class, "invalid instruction encoding");

        report.finish(true);
        assert!(report.is_cancelled());
    }
}
