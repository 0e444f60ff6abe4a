use std::sync::LazyLock;

use chrono::Utc;
use feed_rs::parser;
use html_escape::decode_html_entities;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use super::models::{feed_id_for_url, Article, Feed};
use crate::{Error, Result};

const DEFAULT_FEED_TITLE: &str = "Untitled feed";

static SCRIPT_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</\s*(script|style|noscript)\s*>")
        .expect("valid script block pattern")
});
static COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment pattern"));
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Reduce an HTML fragment to its text content.
///
/// Script and style blocks are dropped entirely, every tag is removed together with
/// its attributes, entities are decoded and whitespace runs collapse to one space.
pub fn strip_markup(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let without_blocks = SCRIPT_BLOCKS.replace_all(html, "");
    let without_comments = COMMENTS.replace_all(&without_blocks, "");
    let without_tags = TAGS.replace_all(&without_comments, "");
    let decoded = decode_html_entities(&without_tags);

    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

/// Parse RSS/Atom content fetched from `url` into a feed record
pub fn parse_feed(content: &[u8], url: &str) -> Result<Feed> {
    let root = root_element(content)?;

    match root.as_str() {
        "rss" => parse_rss(content, url),
        "feed" | "rdf:RDF" | "RDF" => parse_syndication(content, url),
        other => Err(Error::FeedParse(format!(
            "not a feed document (root element <{}>)",
            other
        ))),
    }
}

/// Name of the first element in the document
fn root_element(content: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(content);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.name().as_ref()).to_string());
            }
            Ok(Event::Eof) => return Err(Error::FeedParse("empty document".to_string())),
            Err(e) => return Err(Error::FeedParse(format!("malformed XML: {}", e))),
            _ => {}
        }
        buf.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ChannelTitle,
    ChannelDescription,
    ItemTitle,
    ItemLink,
    ItemDescription,
    ItemPubDate,
    ItemGuid,
}

#[derive(Default)]
struct ItemFields {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
    guid: Option<String>,
}

impl ItemFields {
    fn slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::ItemTitle => Some(&mut self.title),
            Field::ItemLink => Some(&mut self.link),
            Field::ItemDescription => Some(&mut self.description),
            Field::ItemPubDate => Some(&mut self.pub_date),
            Field::ItemGuid => Some(&mut self.guid),
            _ => None,
        }
    }

    fn into_article(self) -> Article {
        let description = self
            .description
            .as_deref()
            .map(strip_markup)
            .unwrap_or_default();

        Article::new(
            trimmed(self.title),
            trimmed(self.link),
            description,
            trimmed(self.pub_date),
            trimmed(self.guid),
        )
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

#[derive(Default)]
struct ChannelFields {
    seen: bool,
    title: Option<String>,
    description: Option<String>,
}

/// Map an element path to the field it fills, if any.
///
/// Only direct children of `<channel>` and `<item>` are mapped; text in deeper
/// elements belongs to the enclosing field.
fn field_for(path: &[Vec<u8>]) -> Option<Field> {
    let names: Vec<&[u8]> = path.iter().map(|n| n.as_slice()).collect();
    match names.as_slice() {
        [b"rss", b"channel", b"title"] => Some(Field::ChannelTitle),
        [b"rss", b"channel", b"description"] => Some(Field::ChannelDescription),
        [b"rss", b"channel", b"item", b"title"] => Some(Field::ItemTitle),
        [b"rss", b"channel", b"item", b"link"] => Some(Field::ItemLink),
        [b"rss", b"channel", b"item", b"description"] => Some(Field::ItemDescription),
        [b"rss", b"channel", b"item", b"pubDate"] => Some(Field::ItemPubDate),
        [b"rss", b"channel", b"item", b"guid"] => Some(Field::ItemGuid),
        _ => None,
    }
}

fn parse_rss(content: &[u8], url: &str) -> Result<Feed> {
    // Text is kept untrimmed so spacing around inline markup and CDATA survives
    let mut reader = Reader::from_reader(content);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut channel = ChannelFields::default();
    let mut item: Option<ItemFields> = None;
    let mut items = Vec::new();
    // Field being collected and the depth at which it was opened
    let mut current: Option<(Field, usize)> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::FeedParse(format!("malformed XML: {}", e)))?;

        match event {
            Event::Start(e) => {
                path.push(e.name().as_ref().to_vec());

                if path.len() == 2 && path[1] == b"channel" {
                    channel.seen = true;
                } else if path.len() == 3 && path[1] == b"channel" && path[2] == b"item" {
                    item = Some(ItemFields::default());
                } else if current.is_none() {
                    current = field_for(&path)
                        .filter(|field| open_field(*field, &mut channel, item.as_mut()))
                        .map(|field| (field, path.len()));
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                if path.len() == 1 && name.as_ref() == b"channel" {
                    channel.seen = true;
                }
            }
            Event::Text(e) => {
                if let Some((field, _)) = current {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::FeedParse(format!("invalid text content: {}", e)))?;
                    append_text(field, &text, &mut channel, item.as_mut());
                }
            }
            Event::CData(e) => {
                if let Some((field, _)) = current {
                    let raw = e.into_inner();
                    let text = String::from_utf8_lossy(&raw);
                    append_text(field, &text, &mut channel, item.as_mut());
                }
            }
            Event::End(_) => {
                if matches!(current, Some((_, depth)) if depth == path.len()) {
                    current = None;
                }
                if path.len() == 3 && path[1] == b"channel" && path[2] == b"item" {
                    if let Some(fields) = item.take() {
                        items.push(fields.into_article());
                    }
                }
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !path.is_empty() {
        return Err(Error::FeedParse(format!(
            "unexpected end of document inside <{}>",
            String::from_utf8_lossy(path.last().map(|n| n.as_slice()).unwrap_or_default())
        )));
    }

    if !channel.seen {
        return Err(Error::FeedParse("missing <channel> element".to_string()));
    }

    Ok(Feed {
        id: feed_id_for_url(url),
        url: url.to_string(),
        title: trimmed(channel.title)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_FEED_TITLE.to_string()),
        description: trimmed(channel.description).unwrap_or_default(),
        items,
        last_updated: Utc::now(),
    })
}

/// Start collecting `field`; returns false when it was already filled once
fn open_field(field: Field, channel: &mut ChannelFields, item: Option<&mut ItemFields>) -> bool {
    let slot = match field {
        Field::ChannelTitle => Some(&mut channel.title),
        Field::ChannelDescription => Some(&mut channel.description),
        _ => item.and_then(|fields| fields.slot(field)),
    };

    match slot {
        Some(value) if value.is_none() => {
            *value = Some(String::new());
            true
        }
        _ => false,
    }
}

fn append_text(field: Field, text: &str, channel: &mut ChannelFields, item: Option<&mut ItemFields>) {
    let slot = match field {
        Field::ChannelTitle => Some(&mut channel.title),
        Field::ChannelDescription => Some(&mut channel.description),
        _ => item.and_then(|fields| fields.slot(field)),
    };

    if let Some(Some(value)) = slot {
        value.push_str(text);
    }
}

/// Atom and RSS 1.0 documents go through feed-rs and are mapped to the same shape
fn parse_syndication(content: &[u8], url: &str) -> Result<Feed> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;
    let source = String::from_utf8_lossy(content);
    let source = decode_html_entities(&source);

    let title = feed
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_FEED_TITLE.to_string());
    let description = feed
        .description
        .map(|d| d.content.trim().to_string())
        .unwrap_or_default();

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let description = entry
                .content
                .and_then(|c| c.body)
                .or_else(|| entry.summary.map(|s| s.content))
                .map(|html| strip_markup(&html))
                .unwrap_or_default();

            let pub_date = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.to_rfc2822());

            Article::new(
                entry.title.map(|t| t.content.trim().to_string()),
                entry.links.first().map(|l| l.href.clone()),
                description,
                pub_date,
                declared_id(entry.id, &source),
            )
        })
        .collect();

    Ok(Feed {
        id: feed_id_for_url(url),
        url: url.to_string(),
        title,
        description,
        items,
        last_updated: Utc::now(),
    })
}

/// feed-rs invents a hash id for entries without one; only ids present in the
/// document count as a guid
fn declared_id(id: String, source: &str) -> Option<String> {
    let id_trimmed = id.trim();
    if id_trimmed.is_empty() || !source.contains(id_trimmed) {
        return None;
    }
    Some(id)
}
