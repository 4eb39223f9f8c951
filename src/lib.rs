//! Side-by-side report of two runs of one benchmark suite, typically the same
//! programs linked against glibc and against musl.
//!
//! Result files are loaded with [`load::load`], compared with
//! [`compare::compare`] and rendered to Markdown with [`format::format`].

pub mod compare;
pub mod env;
pub mod error;
mod ext;
pub mod format;
pub mod load;
pub mod preamble;
pub mod record;
