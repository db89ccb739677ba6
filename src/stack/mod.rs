pub mod parse;
pub mod resolver;

pub use parse::{parse_stack_trace, RawFrame};
pub use resolver::{ResolvedFrame, StackResolver};
