//! インメモリ実装

mod chat;
mod poll;

pub use chat::InMemoryChatRepository;
pub use poll::InMemoryPollRepository;
