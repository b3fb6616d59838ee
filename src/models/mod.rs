pub mod episode;
pub mod webhook;

pub use episode::{Correction, EpisodeMetadata, EpisodeReference};
pub use webhook::{Embed, EmbedAuthor, EmbedField, EmbedImage, WebhookPayload};
