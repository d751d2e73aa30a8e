//! CLI commands implementation

pub mod add;
pub mod analyze;
pub mod chat;
pub mod crawl;
pub mod export;
pub mod init;
pub mod list;
pub mod remove;
pub mod search;
pub mod status;

pub use add::*;
pub use analyze::*;
pub use chat::*;
pub use crawl::*;
pub use export::*;
pub use init::*;
pub use list::*;
pub use remove::*;
pub use search::*;
pub use status::*;
