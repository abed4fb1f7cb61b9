//! Client for the Sakura LLM endpoint a GPU worker exposes.
//!
//! Workers run an OpenAI-compatible server (llama.cpp, vLLM, ...) loaded
//! with a Sakura model. [`api::SakuraEndpoint`] probes it and translates
//! Japanese lines into Chinese; [`prompt`] holds the prompt format and the
//! batching rules.

pub mod api;
pub mod prompt;

pub use api::{EndpointError, SakuraEndpoint};
