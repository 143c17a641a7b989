pub mod capture_loop;
pub mod correlator;
pub mod record;
pub mod runner;
pub mod signal;
pub mod summary;
