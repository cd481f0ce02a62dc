mod count;
mod fetch;

pub use count::{count_and_print, run_count};
pub use fetch::{run_fetch, shannon_entropy};
