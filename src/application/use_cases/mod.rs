//! Use case implementations.

mod handle_message_use_case;

pub use handle_message_use_case::{HandleMessageUseCase, HandleOutcome};
