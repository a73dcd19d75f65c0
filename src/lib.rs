//! `mailsleuth` — forensic analysis of email corpora.
//!
//! This crate provides the core library for parsing folders of email
//! messages into normalized records, filtering them by date range,
//! deriving a directed communication graph with anomaly flags, and
//! assembling a bounded analysis context for a local language model.

pub mod config;
pub mod context;
pub mod corpus;
pub mod error;
pub mod filter;
pub mod graph;
pub mod llm;
pub mod model;
pub mod parser;
