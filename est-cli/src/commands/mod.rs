pub mod find;
pub mod write;

pub use find::{run_find, run_get, FindOptions};
pub use write::{run_add, run_decrement, run_delete, run_increment, run_save};
