//! Batch downloader, transcriber and summarizer for exported call-recording
//! listings.
//!
//! The flow is a straight line: parse a saved listing page into call
//! records, download each recording through an authenticated session into a
//! local cache, transcribe it, condense the transcript, and append one row
//! per call to a CSV report.

pub mod cli;
pub mod config;
pub mod fetch;
pub mod global;
pub mod listing;
pub mod pipeline;
pub mod report;
pub mod summarize;
pub mod transcribe;
