//! Conversational event capture.
//!
//! Roam lets someone describe an event in plain language. A language model
//! extracts structured fields, the conversation asks for whatever mandatory
//! details are still missing, and the finished event is published to a local
//! SQLite store where it can be found by keyword search.
//!
//! | Mandatory field | Label in follow-ups |
//! |-----------------|---------------------|
//! | `title` | title |
//! | `host.name` | host name |
//! | `location.name` | location name |
//! | `occurrences[0].start_ts` | start time |
//!
//! # Architecture
//!
//! - **Slot filling**: every draft field is a [`draft::Slot`] that separates
//!   "never mentioned" from "explicitly unknown"; drafts are merged, never mutated
//! - **Extraction**: any OpenAI-compatible chat completions endpoint, behind the
//!   [`extraction::ExtractionClient`] trait
//! - **Storage**: SQLite with FTS5 for keyword search
//! - **Transport**: JSON over HTTP (axum) or an interactive terminal chat
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`conversation`]: The per-turn state machine (gathering → confirming → ready)
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`draft`]: Event drafts, mandatory fields, merging, and completeness
//! - [`events`]: Publishing complete drafts and searching stored events
//! - [`extraction`]: The extraction client trait and its LLM implementation
//! - [`server`]: HTTP routes
//! - [`timezone`]: Town → timezone resolution for local event times

pub mod config;
pub mod conversation;
pub mod db;
pub mod draft;
pub mod events;
pub mod extraction;
pub mod server;
pub mod timezone;
