//! Guided achievement interview: a five-round conversation that ends in a
//! structured `SAVE_DATA` record, then waits for photo evidence.

pub mod handlers;
pub mod machine;
pub mod parser;
pub mod prompts;
pub mod session;
pub mod store;
