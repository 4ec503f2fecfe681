//! # Scorecard Tokenizer
//!
//! Process-wide subword token counting.
//!
//! Token counts are the single cost metric everywhere in the pipeline:
//! chunk budgets, group budgets, batch packing and the dossier budget all
//! speak in tokens produced by this module. The encoder is a process
//! singleton: [`init`] builds it at startup, [`shutdown`] drops it, and
//! [`count`] lazily re-initializes when called outside that lifecycle
//! (tests, ad-hoc tools).
//!
//! Counting is deterministic and stable across calls within a process;
//! fidelity to any particular vendor's counting is not a goal.

use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};
use tiktoken_rs::{cl100k_base, CoreBPE};

static ENCODER: Lazy<RwLock<Option<Arc<CoreBPE>>>> = Lazy::new(|| RwLock::new(None));

/// Build the process-wide encoder. Idempotent.
pub fn init() {
    let mut slot = ENCODER.write().expect("tokenizer lock poisoned");
    if slot.is_none() {
        *slot = Some(build_encoder());
        log::debug!("tokenizer initialized");
    }
}

/// Drop the process-wide encoder. A later [`count`] re-initializes lazily.
pub fn shutdown() {
    let mut slot = ENCODER.write().expect("tokenizer lock poisoned");
    if slot.take().is_some() {
        log::debug!("tokenizer shut down");
    }
}

/// Count subword tokens in `text`. `count("")` is 0.
pub fn count(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let encoder = {
        let slot = ENCODER.read().expect("tokenizer lock poisoned");
        slot.clone()
    };

    let encoder = match encoder {
        Some(enc) => enc,
        None => {
            init();
            ENCODER
                .read()
                .expect("tokenizer lock poisoned")
                .clone()
                .expect("tokenizer initialized by init()")
        }
    };

    encoder.encode_with_special_tokens(text).len()
}

fn build_encoder() -> Arc<CoreBPE> {
    // cl100k is bundled with tiktoken-rs; construction cannot fail at runtime
    // once the crate compiles, but keep the failure visible if it ever does.
    Arc::new(cl100k_base().expect("bundled cl100k encoding"))
}
