//! Subcommand implementations.

use ohms_core::traits::PageHooks;

pub mod grades;
pub mod init;
pub mod load;
pub mod stats;
pub mod submit;
pub mod update_grade;
pub mod validate;

/// Page hooks for a terminal: alerts go to stderr.
pub(crate) struct ConsoleHooks;

impl PageHooks for ConsoleHooks {
    fn typeset(&self, question_id: &str) {
        tracing::debug!(question = question_id, "content changed");
    }

    fn alert(&self, question_id: &str, message: &str) {
        eprintln!("  [{question_id}] {message}");
    }
}
