//! Roadmap Oracle
//!
//! The external generation step behind the roadmap cache:
//! - [`Oracle`]: `complete(instruction) -> raw text`
//! - [`build_instruction`]: instruction naming the closed vocabularies and the
//!   expected JSON shape
//! - [`OpenAiOracle`]: OpenAI-compatible chat-completions client

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod instruction;
pub mod openai;
pub mod oracle;

pub use error::OracleError;
pub use instruction::{build_instruction, strip_code_fences, SYSTEM_MESSAGE};
pub use openai::{OpenAiConfig, OpenAiOracle};
pub use oracle::Oracle;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
