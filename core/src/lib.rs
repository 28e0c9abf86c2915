//! Cindergrid Core - terrain generation and particle embedding
//!
//! This crate turns validated presets into terrain on a live 2-D particle
//! grid, and can serialize presets *into* that grid as marker particles so a
//! recipe travels inside an exported world snapshot.
//!
//! # Architecture
//!
//! - [`World`] - capability trait over the host grid and material registry;
//!   [`MemoryWorld`] is the in-memory implementation used by tests and
//!   headless tools
//! - [`generate`] - the four layer algorithms over a per-pass
//!   [`ColumnBuffer`]/[`HeightCursor`]
//! - [`GenerationPipeline`] - resumable pass state machine; the host calls
//!   [`GenerationPipeline::step`] once per tick
//! - [`embed`] - the self-describing, checksummed cell codec
//!   (encode/decode/scan)
//!
//! Everything is single-threaded and host-driven. The pipeline cooperates by
//! suspending at settle ticks and every few materialized columns; the decode
//! scanner is cheap to poll every tick because full decodes are memoized by
//! header identity.

pub mod embed;
pub mod generate;
#[cfg(test)]
mod integration;
pub mod pipeline;
pub mod world;

// Re-export the preset crate so hosts depend on one entry point
pub use cindergrid_preset as preset;

pub use embed::{
    DATA_MATERIAL, DecodeError, DecodedPreset, EMBED_MAGIC, EmbedError, EmbedScanner, NavFlags,
    decode_at, encode_preset, payload_checksum,
};
pub use generate::{ColumnBuffer, HeightCursor, apply_layer};
pub use pipeline::{
    GRANULAR_OVERRIDE, GenerationPipeline, MATERIALIZE_COLUMNS_PER_STEP, PipelineError, StepResult,
};
pub use world::{
    CellRecord, FallBehavior, MaterialClass, MaterialProps, MemoryWorld, Rect, World,
};
