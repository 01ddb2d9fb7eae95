//! Line protocol handling.
//!
//! Command parsing for the main loop and the side-line notation used to
//! describe sides inline.

pub mod parser;
pub mod side_line;

pub use parser::{parse_command, Command};
pub use side_line::{encode_side_line, parse_side_line};
