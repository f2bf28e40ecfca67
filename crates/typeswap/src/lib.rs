//! Core library for `typeswap`.
//!
//! The crate parses a directive-gated configuration file into substitution
//! rules, discovers the files those rules apply to and computes
//! word-boundary-correct replacements line by line. Previewing and applying
//! share one span computation, so what is shown is exactly what is written.
//!
//! # Examples
//!
//! ```
//! use typeswap::{RuleSet, parse_config};
//! use typeswap::engine::scan_line;
//!
//! let parsed = parse_config(
//!     "#define WIDE\n\
//!      Folder = src\n\
//!      Files = *.h\n\
//!      Swap = {\n\
//!      #ifdef WIDE\n\
//!      u32/uint32_t\n\
//!      #endif\n\
//!      }\n",
//! )
//! .expect("configuration parses");
//! let config = parsed.config;
//! let rules = RuleSet::compile(
//!     config.swap_value().expect("swap block present"),
//!     config.line_map(),
//! )
//! .expect("rules compile");
//! let spans = scan_line("u32 count;", &rules, &[]);
//! assert_eq!(spans.len(), 1);
//! assert_eq!(spans[0].destination(), "uint32_t");
//! ```

pub mod config;
pub mod directive;
pub mod engine;
pub mod errors;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod scanner;
pub mod walker;

pub use config::{Config, ParsedConfig, parse_config};
pub use errors::{ConfigError, FileError, ValidationError};
pub use pipeline::Session;
pub use rules::RuleSet;
