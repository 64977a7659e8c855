//! Pipeline stages for folder-to-PDF conversion.
//!
//! Each submodule implements one step; [`crate::convert::run`] composes them.
//!
//! ## Data Flow
//!
//! ```text
//! scan ──▶ history ──▶ triage ──▶ codec ──▶ assemble
//! (walk+hash) (skip)    (advise)   (JPEG)    (lopdf)
//!                                    │
//!                                    └─▶ remote (HEIC, under retry)
//! ```
//!
//! 1. [`scan`]      walk the input folder, filter, fingerprint contents
//! 2. [`history`]   fingerprint → last conversion, persisted as JSON
//! 3. [`triage`]    flag resolution, colour mode and size concerns
//! 4. [`codec`]     decode, normalise to RGB, re-encode as JPEG
//! 5. [`remote`]    job-based HEIC conversion when no local decoder exists
//! 6. [`retry`]     bounded linear-backoff retry around remote calls
//! 7. [`assemble`]  lay out pages, draw decorations, merge existing PDFs

pub mod assemble;
pub mod codec;
pub mod history;
pub mod remote;
pub mod retry;
pub mod scan;
pub mod triage;
