//! Prompt assembly: instruction block, history and retrieved context.

pub mod prompt;

pub use prompt::{assemble, InstructionChannel};
