pub mod handlers;

pub use handlers::{AppState, MAX_WORD_LEN, router};
