pub mod parser;
pub mod reconciler;

pub use parser::{DEFAULT_CONTEXT_LINES, ParserOptions, parse, parse_with};
pub use reconciler::{draft_entries, finalize, save};
