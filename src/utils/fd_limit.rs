//! File descriptor limit detection for capping the two worker pools (Unix).

use log::debug;

/// Estimated descriptors held by one entry worker (archive file, spill file, output file).
pub const FDS_PER_WORKER: usize = 4;

/// Fraction of the process FD limit to use (leave headroom for other code).
const FD_LIMIT_FRACTION: f64 = 0.8;

/// Returns the soft limit for max open file descriptors, or `None` if unavailable (e.g. Windows).
#[cfg(unix)]
pub fn max_open_fds() -> Option<u64> {
    use std::mem::MaybeUninit;
    let mut rlim = MaybeUninit::<libc::rlimit>::uninit();
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, rlim.as_mut_ptr()) } != 0 {
        return None;
    }
    let rlim = unsafe { rlim.assume_init() };
    let cur = rlim.rlim_cur;
    // RLIM_INFINITY is typically !0 or u64::MAX; treat as "no practical limit"
    if cur == libc::RLIM_INFINITY || cur > i64::MAX as u64 {
        return None;
    }
    Some(cur)
}

#[cfg(not(unix))]
pub fn max_open_fds() -> Option<u64> {
    None
}

/// Largest number of concurrently busy entry workers that stays under ~80% of the FD limit.
pub fn max_workers_by_fd_limit() -> Option<usize> {
    let limit = max_open_fds()?;
    let usable = (limit as f64 * FD_LIMIT_FRACTION) as usize;
    Some((usable / FDS_PER_WORKER).max(1))
}

/// Cap `(top_level, entry)` pool sizes so one level of fan-out across every top-level
/// worker fits the FD budget. The top-level pool shrinks first.
pub fn cap_pool_sizes(top_level: usize, entry: usize) -> (usize, usize) {
    let (top_level, entry) = (top_level.max(1), entry.max(1));
    let Some(budget) = max_workers_by_fd_limit() else {
        return (top_level, entry);
    };
    if top_level.saturating_mul(entry) <= budget {
        return (top_level, entry);
    }
    let entry_capped = entry.min(budget);
    let top_capped = (budget / entry_capped).clamp(1, top_level);
    debug!(
        "Capping pools {}x{} -> {}x{} (FD limit ~80%)",
        top_level, entry, top_capped, entry_capped
    );
    (top_capped, entry_capped)
}
