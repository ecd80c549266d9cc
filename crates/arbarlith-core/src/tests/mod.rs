//! Crate-level scenario tests.

mod helpers;
