pub mod parser;

pub use parser::{parse_compile_error, CompilerDiagnostic, DiagnosticLocation};
