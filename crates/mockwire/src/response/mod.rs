//! Response synthesis for matched rules.
//!
//! - `synthesizer` - builds status, headers and body from a [`MockRule`](crate::config::MockRule)
//! - [`apply_delay`] - the single suspension point of an intercepted call

mod synthesizer;

use std::time::Duration;

pub use synthesizer::{
    status_text, synthesize, synthesize_lenient, SynthesizedBody, SynthesizedResponse,
};

/// Emulated network latency. A zero delay returns without suspending.
pub async fn apply_delay(delay_ms: u64) {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
