//! Discord webhook body, as sent by Sonarr and as forwarded to Discord.
//!
//! Only the keys the relay reads or rewrites are typed. Everything else is
//! kept in a flattened map so a forwarded payload carries the same keys the
//! inbound one had (`username`, `avatar_url`, embed `footer`, `timestamp`...).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmbedAuthor {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub inline: bool,
}

impl EmbedField {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

impl WebhookPayload {
    /// Wraps a single embed into a payload with no other top-level keys.
    #[must_use]
    pub fn single(embed: Embed) -> Self {
        Self {
            embeds: Some(vec![embed]),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn embed(&self, index: usize) -> Option<&Embed> {
        self.embeds.as_ref().and_then(|e| e.get(index))
    }

    pub fn embed_mut(&mut self, index: usize) -> Option<&mut Embed> {
        self.embeds.as_mut().and_then(|e| e.get_mut(index))
    }
}

impl Embed {
    /// Value of the first field with the given name.
    #[must_use]
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}
