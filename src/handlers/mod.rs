pub mod chat;
pub mod config;
pub mod conversations;
pub mod voice;

pub use chat::*;
pub use config::*;
pub use conversations::*;
pub use voice::*;
