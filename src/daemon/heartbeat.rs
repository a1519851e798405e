use std::time::{Duration, Instant};

/// Emit a liveness line if `interval` has passed since `last_heartbeat`.
///
/// Returns the new last-heartbeat instant: `now` if a heartbeat was
/// emitted, otherwise `last_heartbeat` unchanged.
pub fn emit_if_due(now: Instant, last_heartbeat: Instant, interval: Duration) -> Instant {
    if now.saturating_duration_since(last_heartbeat) >= interval {
        tracing::info!("HEARTBEAT: RevenantBot is running");
        now
    } else {
        last_heartbeat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_due_keeps_last() {
        let last = Instant::now();
        let now = last + Duration::from_secs(59);

        assert_eq!(emit_if_due(now, last, Duration::from_secs(60)), last);
    }

    #[test]
    fn test_due_at_exact_interval() {
        let last = Instant::now();
        let now = last + Duration::from_secs(60);

        assert_eq!(emit_if_due(now, last, Duration::from_secs(60)), now);
    }

    #[test]
    fn test_clock_behind_last_is_not_due() {
        let now = Instant::now();
        let last = now + Duration::from_secs(5);

        assert_eq!(emit_if_due(now, last, Duration::from_secs(60)), last);
    }
}
