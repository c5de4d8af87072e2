//! Heartbeat surveillance
//!
//! Active only when the tuned heartbeat interval is non-zero. The
//! connection owns the checker and drives it from `on_timer_tick`; the
//! checker itself holds no reference back to the connection, it just
//! compares byte-counter snapshots and returns a verdict.

use std::time::Duration;

/// A stale connection is declared after this many full heartbeat intervals
/// without inbound bytes.
const MAX_IDLE_COUNT: u64 = 2;

/// What the connection should do after a timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Emit a heartbeat frame and reschedule the timer
    Send,

    /// Too many missed heartbeats; tear the connection down
    Stale,
}

/// Tracks idle intervals between timer ticks.
#[derive(Debug)]
pub(crate) struct HeartbeatChecker {
    /// Tuned heartbeat interval in seconds
    interval: u16,
    /// Byte counter snapshots from the previous tick
    bytes_received: u64,
    bytes_sent: u64,
    /// Consecutive ticks without inbound bytes
    idle_byte_intervals: u64,
    heartbeat_frames_received: u64,
    heartbeat_frames_sent: u64,
}

impl HeartbeatChecker {
    pub(crate) fn new(interval: u16) -> Self {
        Self {
            interval,
            bytes_received: 0,
            bytes_sent: 0,
            idle_byte_intervals: 0,
            heartbeat_frames_received: 0,
            heartbeat_frames_sent: 0,
        }
    }

    /// Ticks fire at half the tuned interval, clamped to at least a second
    pub(crate) fn timer_interval(&self) -> Duration {
        Duration::from_secs(u64::max(self.interval as u64 / 2, 1))
    }

    pub(crate) fn received(&mut self) {
        self.heartbeat_frames_received += 1;
    }

    pub(crate) fn sent(&mut self) {
        self.heartbeat_frames_sent += 1;
    }

    /// Whether the accumulated idle time has reached the stale threshold
    pub(crate) fn connection_is_idle(&self) -> bool {
        self.idle_byte_intervals * self.timer_interval().as_secs()
            >= MAX_IDLE_COUNT * self.interval as u64
    }

    /// One timer tick: compare counters against the previous snapshots,
    /// update them, and decide whether the peer is still alive.
    pub(crate) fn send_and_check(&mut self, bytes_received: u64, bytes_sent: u64) -> Verdict {
        if bytes_received == self.bytes_received {
            self.idle_byte_intervals += 1;
        } else {
            self.idle_byte_intervals = 0;
        }
        self.update_counters(bytes_received, bytes_sent);

        if self.connection_is_idle() {
            Verdict::Stale
        } else {
            Verdict::Send
        }
    }

    fn update_counters(&mut self, bytes_received: u64, bytes_sent: u64) {
        self.bytes_received = bytes_received;
        self.bytes_sent = bytes_sent;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{HeartbeatChecker, Verdict};

    const TIMEOUT: u16 = 60;

    #[test]
    fn test_initial_counters() {
        let checker = HeartbeatChecker::new(TIMEOUT);
        assert_eq!(checker.bytes_received, 0);
        assert_eq!(checker.bytes_sent, 0);
        assert_eq!(checker.idle_byte_intervals, 0);
        assert_eq!(checker.heartbeat_frames_received, 0);
        assert_eq!(checker.heartbeat_frames_sent, 0);
    }

    #[test]
    fn test_timer_is_half_the_interval() {
        let checker = HeartbeatChecker::new(TIMEOUT);
        assert_eq!(checker.timer_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_timer_never_goes_below_one_second() {
        let checker = HeartbeatChecker::new(1);
        assert_eq!(checker.timer_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_idle_increments_without_bytes() {
        let mut checker = HeartbeatChecker::new(TIMEOUT);
        checker.update_counters(100, 100);
        assert_eq!(checker.send_and_check(100, 100), Verdict::Send);
        assert_eq!(checker.idle_byte_intervals, 1);
    }

    #[test]
    fn test_idle_resets_on_inbound_bytes() {
        let mut checker = HeartbeatChecker::new(TIMEOUT);
        checker.idle_byte_intervals = 3;
        checker.update_counters(100, 100);
        assert_eq!(checker.send_and_check(128, 100), Verdict::Send);
        assert_eq!(checker.idle_byte_intervals, 0);
    }

    #[test]
    fn test_update_counters_snapshots() {
        let mut checker = HeartbeatChecker::new(TIMEOUT);
        checker.send_and_check(256, 512);
        assert_eq!(checker.bytes_received, 256);
        assert_eq!(checker.bytes_sent, 512);
    }

    #[test]
    fn test_stale_after_two_silent_intervals() {
        // ticks at interval/2, so 2 full intervals of silence = 4 ticks
        let mut checker = HeartbeatChecker::new(TIMEOUT);
        for _ in 0..3 {
            assert_eq!(checker.send_and_check(0, 0), Verdict::Send);
        }
        assert_eq!(checker.send_and_check(0, 0), Verdict::Stale);
    }

    #[test]
    fn test_frame_counters() {
        let mut checker = HeartbeatChecker::new(TIMEOUT);
        checker.received();
        checker.sent();
        checker.sent();
        assert_eq!(checker.heartbeat_frames_received, 1);
        assert_eq!(checker.heartbeat_frames_sent, 2);
    }
}
