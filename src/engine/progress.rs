//! Progress bar over top-level files.

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

pub type ProgressBar = Arc<Mutex<Bar>>;

/// Create a progress bar with a known total.
pub fn create_progress_bar(total: usize, desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = total,
        desc = desc,
        animation = Animation::Classic,
        unit = " files"
    )))
}

/// Advance the bar by `n` finished files.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    let mut bar = pb.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _ = bar.update(n);
}

/// Push the bar to its total and end the line.
pub fn finish_bar(pb: &ProgressBar) {
    let mut bar = pb.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let total = bar.total;
    let _ = bar.update_to(total);
    eprintln!();
}
