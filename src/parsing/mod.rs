pub mod blocks;
pub mod heuristics;
pub mod markdown;
pub mod sections;

// Re-export the entry points used by the assembler and the CLI
pub use blocks::decode;
pub use markdown::render;
pub use sections::split;
