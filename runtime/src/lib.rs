//! NBC rates runtime: drives the exchange-rate page in headless Chromium and
//! serves the extracted rates over HTTP.
//!
//! This library crate exposes the modules for the binary and for
//! integration testing.

pub mod cli;
pub mod config;
pub mod navigator;
pub mod pipeline;
pub mod renderer;
pub mod rest;
