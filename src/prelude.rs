// prelude.rs - Convenient re-exports for the idiomatic API.
//
//! # Prelude
//!
//! ```
//! use pcrs::prelude::*;
//!
//! let re = Regex::builder(r"\d+").option(Options::UNGREEDY).build().unwrap();
//! let m = re.find("answer: 42").unwrap();
//! assert_eq!(m.as_str(), "4");
//! ```

pub use crate::api::{Captures, CapturesIter, FindIter, Match, Regex, RegexBuilder};
pub use crate::binding::{MatchResult, CompileOutcome, ExecOutcome};
pub use crate::error::{CompileError, ExecError};
pub use crate::pcre::Options;
