pub mod analysis;
pub mod consts;
pub mod detector;
pub mod error;
pub mod layout;
pub mod parse;
pub mod sources;

// Re-export commonly used types
pub use error::PagecropError;
pub use parse::assembler::{
    ExtractorConfig, ExtractorConfigBuilder, PageAssembler, ParseResult, ParsedData,
};
