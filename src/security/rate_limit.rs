//! Per-address request accounting with temporary bans.
//!
//! Every client address gets a record of the instants of its requests in the
//! trailing [`WINDOW`]. A client whose windowed count goes past the configured
//! maximum is banned for the ban duration; while banned its requests are
//! rejected without being counted.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::ServerConfig;

/// Trailing interval over which requests are counted.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The client is banned; nothing was recorded.
    Blocked {
        /// Time left on the ban.
        remaining: Duration,
    },
    /// The request was counted and may proceed.
    Admitted {
        /// This request pushed the client over the limit; later requests will
        /// be blocked.
        banned: bool,
    },
}

#[derive(Debug, Default)]
struct ClientRecord {
    recent: Vec<Instant>,
    ban_until: Option<Instant>,
}

impl ClientRecord {
    fn ban_remaining(&self, now: Instant) -> Option<Duration> {
        self.ban_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    fn prune(&mut self, now: Instant) {
        self.recent
            .retain(|t| now.saturating_duration_since(*t) <= WINDOW);
    }

    /// Records a request at `now`. Returns true when it starts a ban.
    fn track(&mut self, now: Instant, max_requests: usize, ban_duration: Duration) -> bool {
        self.prune(now);
        self.recent.push(now);
        if self.recent.len() > max_requests {
            self.ban_until = Some(now + ban_duration);
            true
        } else {
            false
        }
    }

    fn is_idle(&self, now: Instant) -> bool {
        self.ban_remaining(now).is_none()
            && self
                .recent
                .iter()
                .all(|t| now.saturating_duration_since(*t) > WINDOW)
    }
}

/// Shared admission state for all request handlers of one server.
#[derive(Debug)]
pub struct AccessGuard {
    clients: Mutex<HashMap<String, ClientRecord>>,
    max_requests: usize,
    ban_duration: Duration,
}

impl AccessGuard {
    /// `max_requests` per [`WINDOW`] are allowed; the next one bans the
    /// client for `ban_duration`.
    pub fn new(max_requests: u32, ban_duration: Duration) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            max_requests: max_requests as usize,
            ban_duration,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.max_requests,
            Duration::from_secs(u64::from(config.ban_time) * 60),
        )
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn ban_duration(&self) -> Duration {
        self.ban_duration
    }

    // A panic elsewhere can at worst leave one record half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, ClientRecord>> {
        self.clients.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// True if `address` has a ban that has not yet expired.
    pub fn is_blocked(&self, address: &str) -> bool {
        self.is_blocked_at(address, Instant::now())
    }

    pub fn is_blocked_at(&self, address: &str, now: Instant) -> bool {
        self.lock()
            .get(address)
            .and_then(|record| record.ban_remaining(now))
            .is_some()
    }

    /// Counts a request from `address` made at `now`.
    ///
    /// Does nothing while the address is banned. Returns true if this request
    /// started a ban.
    pub fn track_request(&self, address: &str, now: Instant) -> bool {
        let mut clients = self.lock();
        let record = clients.entry(address.to_string()).or_default();
        if record.ban_remaining(now).is_some() {
            return false;
        }
        record.track(now, self.max_requests, self.ban_duration)
    }

    /// Ban check and accounting for one request, under a single lock.
    pub fn admit(&self, address: &str) -> Admission {
        self.admit_at(address, Instant::now())
    }

    pub fn admit_at(&self, address: &str, now: Instant) -> Admission {
        let mut clients = self.lock();
        let record = clients.entry(address.to_string()).or_default();
        if let Some(remaining) = record.ban_remaining(now) {
            return Admission::Blocked { remaining };
        }
        let banned = record.track(now, self.max_requests, self.ban_duration);
        Admission::Admitted { banned }
    }

    /// Drops records with no request in the window and no running ban.
    /// Returns how many were removed.
    pub fn sweep_idle(&self, now: Instant) -> usize {
        let mut clients = self.lock();
        let before = clients.len();
        clients.retain(|_, record| !record.is_idle(now));
        before - clients.len()
    }

    /// Number of addresses currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const CLIENT: &str = "192.0.2.10";

    fn guard(max: u32) -> AccessGuard {
        AccessGuard::new(max, Duration::from_secs(15 * 60))
    }

    #[test]
    fn test_requests_up_to_max_are_admitted() {
        let guard = guard(5);
        let now = Instant::now();
        for i in 0..5 {
            let at = now + Duration::from_secs(i);
            assert_eq!(guard.admit_at(CLIENT, at), Admission::Admitted { banned: false });
        }
        assert!(!guard.is_blocked_at(CLIENT, now + Duration::from_secs(5)));
    }

    #[test]
    fn test_request_past_max_bans() {
        let guard = guard(3);
        let now = Instant::now();
        for _ in 0..3 {
            guard.admit_at(CLIENT, now);
        }

        // The request crossing the limit still goes through
        assert_eq!(guard.admit_at(CLIENT, now), Admission::Admitted { banned: true });
        assert!(guard.is_blocked_at(CLIENT, now + Duration::from_secs(1)));

        let later = now + Duration::from_secs(60);
        assert!(matches!(guard.admit_at(CLIENT, later), Admission::Blocked { .. }));
    }

    #[test]
    fn test_blocked_reports_remaining_time() {
        let guard = AccessGuard::new(1, Duration::from_secs(60));
        let now = Instant::now();
        guard.admit_at(CLIENT, now);
        guard.admit_at(CLIENT, now);

        let at = now + Duration::from_secs(20);
        assert_eq!(
            guard.admit_at(CLIENT, at),
            Admission::Blocked { remaining: Duration::from_secs(40) }
        );
    }

    #[test]
    fn test_ban_expires() {
        let guard = AccessGuard::new(2, Duration::from_secs(5 * 60));
        let now = Instant::now();
        for _ in 0..3 {
            guard.admit_at(CLIENT, now);
        }
        assert!(guard.is_blocked_at(CLIENT, now + Duration::from_secs(299)));

        // Expiry is not strictly in the future any more
        let expiry = now + Duration::from_secs(300);
        assert!(!guard.is_blocked_at(CLIENT, expiry));

        // Old timestamps were pruned, so the client starts from a clean slate
        assert_eq!(guard.admit_at(CLIENT, expiry), Admission::Admitted { banned: false });
        assert_eq!(guard.admit_at(CLIENT, expiry), Admission::Admitted { banned: false });
        assert_eq!(guard.admit_at(CLIENT, expiry), Admission::Admitted { banned: true });
    }

    #[test]
    fn test_window_slides() {
        let guard = guard(2);
        let now = Instant::now();
        guard.admit_at(CLIENT, now);
        guard.admit_at(CLIENT, now + Duration::from_secs(30));

        // The first request left the window, so this is the second in it
        let at = now + Duration::from_secs(61);
        assert_eq!(guard.admit_at(CLIENT, at), Admission::Admitted { banned: false });
        assert!(!guard.is_blocked_at(CLIENT, at));
    }

    #[test]
    fn test_window_edge_is_inclusive() {
        let guard = guard(1);
        let now = Instant::now();
        guard.admit_at(CLIENT, now);
        // Exactly 60s later the first request still counts
        let at = now + WINDOW;
        assert_eq!(guard.admit_at(CLIENT, at), Admission::Admitted { banned: true });
    }

    #[test]
    fn test_no_accounting_while_banned() {
        let guard = AccessGuard::new(1, Duration::from_secs(120));
        let now = Instant::now();
        guard.track_request(CLIENT, now);
        assert!(guard.track_request(CLIENT, now));

        // Neither call records anything or extends the ban
        assert!(!guard.track_request(CLIENT, now + Duration::from_secs(10)));
        assert!(matches!(
            guard.admit_at(CLIENT, now + Duration::from_secs(100)),
            Admission::Blocked { remaining } if remaining == Duration::from_secs(20)
        ));
        assert!(!guard.is_blocked_at(CLIENT, now + Duration::from_secs(120)));
    }

    #[test]
    fn test_addresses_are_independent() {
        let guard = guard(1);
        let now = Instant::now();
        guard.admit_at(CLIENT, now);
        guard.admit_at(CLIENT, now);
        assert!(guard.is_blocked_at(CLIENT, now));
        assert!(!guard.is_blocked_at("198.51.100.7", now));
        assert_eq!(
            guard.admit_at("198.51.100.7", now),
            Admission::Admitted { banned: false }
        );
    }

    #[test]
    fn test_unknown_address_is_not_blocked() {
        let guard = guard(1);
        assert!(!guard.is_blocked("203.0.113.1"));
        assert_eq!(guard.tracked_clients(), 0);
    }

    #[test]
    fn test_sweep_keeps_active_and_banned() {
        let guard = AccessGuard::new(1, Duration::from_secs(600));
        let now = Instant::now();
        guard.admit_at("idle", now);
        guard.admit_at("banned", now);
        guard.admit_at("banned", now);
        guard.admit_at("active", now + Duration::from_secs(100));
        assert_eq!(guard.tracked_clients(), 3);

        let removed = guard.sweep_idle(now + Duration::from_secs(120));
        assert_eq!(removed, 1);
        assert_eq!(guard.tracked_clients(), 2);
        assert!(guard.is_blocked_at("banned", now + Duration::from_secs(120)));

        // Once the ban is over and the window is empty it goes too
        let removed = guard.sweep_idle(now + Duration::from_secs(601));
        assert_eq!(removed, 2);
        assert_eq!(guard.tracked_clients(), 0);
    }

    #[test]
    fn test_concurrent_requests_never_over_admit() {
        let max = 5;
        let guard = Arc::new(guard(max));
        let now = Instant::now();

        let results: Vec<Admission> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..64)
                .map(|_| {
                    let guard = Arc::clone(&guard);
                    scope.spawn(move || guard.admit_at(CLIENT, now))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let admitted = results
            .iter()
            .filter(|a| matches!(a, Admission::Admitted { .. }))
            .count();
        let bans = results
            .iter()
            .filter(|a| matches!(a, Admission::Admitted { banned: true }))
            .count();

        assert_eq!(admitted, max as usize + 1);
        assert_eq!(bans, 1);
    }

    #[test]
    fn test_from_config() {
        let config = ServerConfig {
            max_requests: 7,
            ban_time: 2,
            ..ServerConfig::default()
        };
        let guard = AccessGuard::from_config(&config);
        assert_eq!(guard.max_requests(), 7);
        assert_eq!(guard.ban_duration(), Duration::from_secs(120));
    }
}
