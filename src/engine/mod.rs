//! Engine module: per-file traversal, sampling and schema output

pub mod arg_parser;
pub mod cli;
pub mod progress;
pub mod sampler;
pub mod tools;
pub mod traversal;
pub mod writer;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use sampler::sample;
pub use tools::{glob_match, is_os_hidden_file, should_include_input};
pub use traversal::Traversal;
pub use writer::{SchemaIdentity, SchemaWriter};
