//! # Conversation Persistence and Sequencing
//!
//! Durable conversation history for the voice assistant. A conversation owns
//! an ordered list of messages; every voice or text turn appends a USER
//! message followed (on success) by exactly one ASSISTANT message.
//!
//! ## Key Components:
//! - **Store trait**: The durable-store boundary (find/create/append/list/delete)
//! - **Memory store**: In-process implementation backing the service and tests
//! - **Resolver**: Loads an existing conversation or implicitly creates one,
//!   deriving its title from the first utterance
//! - **Sequencer**: Performs the ordered durable appends and fans each stored
//!   message out to live viewers

pub mod memory;
pub mod resolver;
pub mod sequencer;
pub mod store;

pub use memory::MemoryStore;
pub use resolver::ConversationResolver;
pub use sequencer::MessageSequencer;
pub use store::{Conversation, ConversationStore, ConversationSummary, Message, MessageRole};
