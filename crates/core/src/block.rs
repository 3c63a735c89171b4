//! Typed content blocks for the drag-and-drop page builder.
//!
//! On the wire a block is `{ "id", "type", "props", "styles", "order" }`.
//! Internally `type` + `props` become one [`BlockContent`] variant so each
//! block type carries its own property struct. Well-known props are typed;
//! anything else a client sends is kept in the variant's `extra` map so a
//! version snapshot round-trips without losing data.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Free-form JSON object (`styles`, unknown props).
pub type JsonObject = Map<String, Value>;

/// Words per minute used for the reading-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// One positioned, styled content unit of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: String,
    pub content: BlockContent,
    pub styles: JsonObject,
    pub order: i32,
}

impl Block {
    /// The wire `type` tag of this block.
    pub fn kind(&self) -> &'static str {
        self.content.kind()
    }

    /// The block's props as a JSON object, exactly as they are sent on the wire.
    pub fn props(&self) -> JsonObject {
        self.content.props()
    }
}

/// Wire shape of a block. `props` and `styles` default to `{}`.
#[derive(Serialize, Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    props: JsonObject,
    #[serde(default)]
    styles: JsonObject,
    order: i32,
}

impl TryFrom<RawBlock> for Block {
    type Error = CoreError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        if raw.id.trim().is_empty() {
            return Err(CoreError::Validation("Block id must not be empty".into()));
        }
        let tagged = serde_json::json!({ "type": raw.kind, "props": raw.props });
        let content: BlockContent = serde_json::from_value(tagged).map_err(|e| {
            CoreError::Validation(format!("Block '{}' ({}): {e}", raw.id, raw.kind))
        })?;
        Ok(Block {
            id: raw.id,
            content,
            styles: raw.styles,
            order: raw.order,
        })
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        RawBlock {
            kind: block.content.kind().to_string(),
            props: block.content.props(),
            id: block.id,
            styles: block.styles,
            order: block.order,
        }
    }
}

// ---------------------------------------------------------------------------
// BlockContent
// ---------------------------------------------------------------------------

/// Block type together with its typed props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "props", rename_all = "camelCase")]
pub enum BlockContent {
    // Basic
    Heading(HeadingProps),
    Paragraph(TextProps),
    Text(TextProps),
    Quote(TextProps),
    List(ListProps),

    // Media
    Image(MediaProps),
    Video(MediaProps),
    Gallery(GalleryProps),
    Audio(MediaProps),

    // Layout
    Hero(HeroProps),
    Section(LayoutProps),
    Container(LayoutProps),
    Columns(LayoutProps),
    Spacer(LayoutProps),
    Divider(LayoutProps),

    // Interactive
    Button(LinkProps),
    Link(LinkProps),
    Form(CollectionProps),
    Accordion(CollectionProps),
    Tabs(CollectionProps),

    // Advanced
    Code(TextProps),
    Embed(MediaProps),
    Table(CollectionProps),
    Faq(CollectionProps),
    Testimonial(CollectionProps),
    Pricing(CollectionProps),
    CallToAction(LinkProps),
}

impl BlockContent {
    /// The wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            BlockContent::Heading(_) => "heading",
            BlockContent::Paragraph(_) => "paragraph",
            BlockContent::Text(_) => "text",
            BlockContent::Quote(_) => "quote",
            BlockContent::List(_) => "list",
            BlockContent::Image(_) => "image",
            BlockContent::Video(_) => "video",
            BlockContent::Gallery(_) => "gallery",
            BlockContent::Audio(_) => "audio",
            BlockContent::Hero(_) => "hero",
            BlockContent::Section(_) => "section",
            BlockContent::Container(_) => "container",
            BlockContent::Columns(_) => "columns",
            BlockContent::Spacer(_) => "spacer",
            BlockContent::Divider(_) => "divider",
            BlockContent::Button(_) => "button",
            BlockContent::Link(_) => "link",
            BlockContent::Form(_) => "form",
            BlockContent::Accordion(_) => "accordion",
            BlockContent::Tabs(_) => "tabs",
            BlockContent::Code(_) => "code",
            BlockContent::Embed(_) => "embed",
            BlockContent::Table(_) => "table",
            BlockContent::Faq(_) => "faq",
            BlockContent::Testimonial(_) => "testimonial",
            BlockContent::Pricing(_) => "pricing",
            BlockContent::CallToAction(_) => "callToAction",
        }
    }

    /// Serialize just the props half of the tagged union.
    pub fn props(&self) -> JsonObject {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut tagged)) => match tagged.remove("props") {
                Some(Value::Object(props)) => props,
                _ => JsonObject::new(),
            },
            _ => JsonObject::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Props
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_text: Option<String>,
    /// HTML heading level (1-6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Props for text-bearing blocks (`paragraph`, `text`, `quote`, `code`).
/// `content` may contain HTML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Props for single-media blocks (`image`, `video`, `audio`, `embed`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<MediaProps>>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Props for structural blocks; layout settings are builder-defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutProps {
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Props for clickable blocks (`button`, `link`, `callToAction`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Props for blocks built from a list of entries (forms, tabs, FAQs, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

// ---------------------------------------------------------------------------
// Block-array helpers
// ---------------------------------------------------------------------------

/// Parse a raw JSON value into a block array.
///
/// Rejects anything that is not an array, and any element that is not a
/// well-formed block of a known type.
pub fn parse_blocks(value: &Value) -> Result<Vec<Block>, CoreError> {
    if !value.is_array() {
        return Err(CoreError::Validation("Blocks must be an array".into()));
    }
    serde_json::from_value(value.clone()).map_err(|e| CoreError::Validation(e.to_string()))
}

/// Rewrite every block's `order` to its array position.
pub fn normalize_order(blocks: &mut [Block]) {
    for (position, block) in blocks.iter_mut().enumerate() {
        block.order = position as i32;
    }
}

/// Whether every block's `order` equals its array position.
pub fn is_order_consistent(blocks: &[Block]) -> bool {
    blocks
        .iter()
        .enumerate()
        .all(|(position, block)| block.order == position as i32)
}

/// Estimated reading time in minutes (never less than one).
///
/// Counts words in the `content` (HTML stripped), `text` and `headingText`
/// props of every block.
pub fn reading_time_minutes(blocks: &[Block]) -> usize {
    let mut words = 0;
    for block in blocks {
        let props = block.props();
        if let Some(Value::String(content)) = props.get("content") {
            words += HTML_TAG.replace_all(content, "").split_whitespace().count();
        }
        for key in ["text", "headingText"] {
            if let Some(Value::String(text)) = props.get(key) {
                words += text.split_whitespace().count();
            }
        }
    }
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}
