use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Clears the shared `running` flag on Ctrl+C or SIGTERM.
pub fn setup_ctrlc_handler(running_flag: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        running_flag.store(false, Ordering::SeqCst);
    })
}
