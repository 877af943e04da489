#![recursion_limit = "256"]

//! Offline training pipeline: labelled triage texts and survey rows
//! in, a `model.json` + `weights.bin` + `metadata.json` bundle out.
//!
//! Layers, outermost first: `cli` → `application` → `domain` /
//! `data` → `ml` → `infra`.

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
