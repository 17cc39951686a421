pub mod client;
pub mod model;
#[cfg(test)]
pub(crate) mod testing;

pub use client::ChatCompletionClient;
pub use model::{Generator, Message, MessageRole};
