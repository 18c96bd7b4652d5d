// Handler modules
pub mod list;
pub mod mkconfig;
pub mod score;

// Re-export all handler functions
pub use list::{format_check_list, handle_list};
pub use mkconfig::handle_mkconfig;
pub use score::{build_run_configuration, exit_code, handle_score, read_inputs};
