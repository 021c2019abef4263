//! Slide-deck document types.
//!
//! The deck is the complete state exchanged with callers: every request
//! carries the prior deck in, and every successful response carries the
//! whole new deck out. Slides keep fields this crate does not know about.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A presentation: a title and an ordered list of slides.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SlideDeck {
    #[serde(default)]
    pub title: String,
    /// Presentation order.
    #[serde(default)]
    pub slides: Vec<Slide>,
    /// Token accounting attached after generation. Not produced by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}

impl SlideDeck {
    /// The same deck without usage metadata, ready to be sent back as context.
    pub fn without_usage(mut self) -> Self {
        self.usage = None;
        self
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// A single slide.
///
/// Unknown fields (speaker notes, layout hints, ...) are kept in `extra`
/// and written back out unchanged.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Slide {
    pub title: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    /// URL or embedded image data. `None` means no image.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Slide {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bullets: Vec::new(),
            image: None,
            extra: Map::new(),
        }
    }

    pub fn with_bullets<I, S>(mut self, bullets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bullets = bullets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}
