use prometheus::{IntGauge, Registry};
use std::sync::{LazyLock, Once};

use crate::state::NodeState;

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static THOUGHTS_RECORDED: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new("poet_thoughts_recorded", "Number of thoughts in history")
        .expect("valid metric definition")
});

pub static THINK_CYCLES: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "poet_think_cycles_total",
        "Think cycles attempted since start",
    )
    .expect("valid metric definition")
});

pub static THINK_FAILURES: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "poet_think_failures_total",
        "Think cycles that failed and backed off",
    )
    .expect("valid metric definition")
});

pub static THINKER_RUNNING: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new("poet_thinker_running", "1 while the think loop is running")
        .expect("valid metric definition")
});

static REGISTER: Once = Once::new();

/// Register all metrics with the registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let gauges = [
            &THOUGHTS_RECORDED,
            &THINK_CYCLES,
            &THINK_FAILURES,
            &THINKER_RUNNING,
        ];
        for gauge in gauges {
            if let Err(e) = REGISTRY.register(Box::new(IntGauge::clone(gauge))) {
                tracing::error!("Failed to register metric: {}", e);
            }
        }
    });
}

/// Copy the current soul state into the gauges. Called at scrape time.
pub async fn refresh(state: &NodeState) {
    THOUGHTS_RECORDED.set(state.history.len().await as i64);

    match &state.thinker {
        Some(thinker) => {
            let status = thinker.status();
            THINK_CYCLES.set(status.cycles as i64);
            THINK_FAILURES.set(status.failures as i64);
            THINKER_RUNNING.set(status.running as i64);
        }
        None => {
            THINK_CYCLES.set(0);
            THINK_FAILURES.set(0);
            THINKER_RUNNING.set(0);
        }
    }
}
