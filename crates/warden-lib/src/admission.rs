//! Admission policy for concurrent restarts
//!
//! Pure decision functions: given the current census and the configured
//! maximum concurrent-restart fraction, decide whether one more pod may
//! begin restarting. No I/O, no side effects.

/// Maximum number of pods allowed to be restarting concurrently.
///
/// `max(1, ceil(total * max_fraction))` — the floor of 1 guarantees no
/// fleet is ever fully frozen from restarting at least one pod, however
/// small the fraction.
pub fn threshold(total: usize, max_fraction: f64) -> usize {
    let scaled = (total as f64 * max_fraction).ceil() as usize;
    scaled.max(1)
}

/// Decide whether a newly-requesting pod may be admitted now.
///
/// Callers must guard `total == 0` before calling: an empty (or unknown)
/// census degenerates to a threshold of 1 against no fleet, which is the
/// watch loop's fail-closed case, not a policy decision.
pub fn admit(restarting: usize, total: usize, max_fraction: f64) -> bool {
    restarting < threshold(total, max_fraction)
}
