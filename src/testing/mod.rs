//! Test harness utilities.
//!
//! Synthetic, reproducible inputs for unit tests, the integration suites in
//! `tests/`, and manual experiments with the CLI. Nothing here touches the
//! network or depends on recorded audio.

pub mod signals;
