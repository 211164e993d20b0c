//! Activity journal: append-only JSONL with graceful degradation.

pub mod jsonl;
