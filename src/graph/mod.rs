// src/graph/mod.rs

//! The task-graph DSL.
//!
//! - [`model`] holds the parsed representation ([`TaskGraph`], [`Step`],
//!   [`ArgValue`], ...).
//! - [`parser`] turns TOML source text into a [`TaskGraph`].

pub mod model;
pub mod parser;

pub use model::{
    ArgValue, Binding, Invocation, OutputRef, Step, StepName, SwapStep, TaskGraph, TaskRef,
};
pub use parser::parse;
