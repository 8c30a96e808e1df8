pub mod assembler;
pub mod classify;
pub mod extract;
pub mod merge;
