pub mod discord;
pub mod tvdb;

pub use discord::{DiscordClient, DiscordError};
pub use tvdb::{TvdbClient, TvdbError};
