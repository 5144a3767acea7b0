//! # pcrs
//!
//! Pure-Rust, byte-oriented PCRE-style regex core, with SIMD-accelerated
//! candidate search via [`memchr`](https://crates.io/crates/memchr).
//!
//! The crate exposes the three primitives a PCRE binding is built on:
//! compile a pattern, ask how many groups it captures, and run it against
//! a subject from a byte offset, receiving `(start, end)` pairs.
//!
//! ## Quick Start
//!
//! ```rust
//! use pcrs::prelude::*;
//!
//! let re = Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap();
//! let m = re.find("Date: 2026-02-12").unwrap();
//! assert_eq!(m.as_str(), "2026-02-12");
//! assert_eq!(m.start(), 6);
//! ```
//!
//! ## Binding Primitives
//!
//! ```rust
//! use pcrs::binding::{compile, captured_count, exec};
//! use pcrs::pcre::Options;
//!
//! let code = compile("ABC", Options::CASELESS).unwrap();
//! assert_eq!(captured_count(&code), 0);
//! let m = exec(&code, "xabcX", 0, Options::empty(), 3).unwrap();
//! assert_eq!(m.whole_match(), Some((1, 4)));
//! ```
//!
//! ## Low-Level API
//!
//! The engine entry points work on raw bytes and a caller-owned offset
//! vector, in the manner of `pcre_exec`:
//!
//! ```rust
//! use pcrs::pcre::Options;
//! use pcrs::regcomp::pcrs_compile;
//! use pcrs::regexec::pcrs_exec;
//!
//! let reg = pcrs_compile(b"(a)(b)", Options::empty()).unwrap();
//! let mut ovector = [0i32; 6];
//! let rc = pcrs_exec(&reg, b"xaby", 0, Options::empty(), &mut ovector);
//! assert_eq!(rc, 3);
//! assert_eq!(ovector, [1, 3, 1, 2, 2, 3]);
//! ```
//!
//! ## Module Structure
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`pcre`] | Option flags, status codes and limits |
//! | [`regparse`] | Pattern parser |
//! | [`regcomp`] | AST-to-bytecode compiler |
//! | [`regexec`] | Backtracking VM and search |
//! | [`reginfo`] | Pattern introspection |
//! | [`regint`] | Internal types and opcodes |
//! | [`regerror`] | Error messages |
//! | [`binding`] | `compile` / `captured_count` / `exec` |
//! | [`api`] | `Regex`, `Captures`, `FindIter` |

pub mod api;
pub mod binding;
pub mod error;
pub mod pcre;
pub mod prelude;
pub mod regcomp;
pub mod regerror;
pub mod regexec;
pub mod reginfo;
pub mod regint;
pub mod regparse;

#[cfg(feature = "ffi")]
pub mod ffi;
