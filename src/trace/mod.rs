mod parser;

pub use parser::{ParseError, Reading, Record, Trace};
