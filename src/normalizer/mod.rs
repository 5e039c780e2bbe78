//! RSS 2.0 parsing and text/date normalization.

use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;
use rss::Channel;

use crate::app::{GatorError, Result};

/// `02 Jan 2006 15:04:05 -0700`, the part after the weekday.
const PUB_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<RssItem>,
}

/// One `<item>`; absent elements are empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Raw `pubDate` text, see [`parse_pub_date`].
    pub pub_date: String,
}

/// Parse an RSS document, unescaping HTML entities in titles and descriptions.
pub fn parse_feed(body: &[u8]) -> Result<RssFeed> {
    let channel = Channel::read_from(body).map_err(|e| GatorError::FeedParse(e.to_string()))?;

    let items = channel
        .items()
        .iter()
        .map(|item| RssItem {
            title: unescape(item.title()),
            link: item.link().unwrap_or_default().to_string(),
            description: unescape(item.description()),
            pub_date: item.pub_date().unwrap_or_default().to_string(),
        })
        .collect();

    Ok(RssFeed {
        title: unescape(Some(channel.title())),
        link: channel.link().to_string(),
        description: unescape(Some(channel.description())),
        items,
    })
}

fn unescape(text: Option<&str>) -> String {
    text.map(|t| decode_html_entities(t).into_owned())
        .unwrap_or_default()
}

/// Parse an RFC 1123 date with a numeric zone, normalized to UTC.
///
/// Empty input means the item carries no date and yields `Ok(None)`.
/// The weekday must be a day name but is not checked against the date,
/// and the day of month must be two digits.
pub fn parse_pub_date(text: &str) -> Result<Option<DateTime<Utc>>> {
    if text.is_empty() {
        return Ok(None);
    }

    let invalid = |reason: String| GatorError::DateFormat {
        input: text.to_string(),
        reason,
    };

    let (weekday, rest) = text
        .split_once(", ")
        .ok_or_else(|| invalid("expected \"<weekday>, \" prefix".into()))?;
    if !WEEKDAYS.iter().any(|d| d.eq_ignore_ascii_case(weekday)) {
        return Err(invalid(format!("unknown weekday {weekday:?}")));
    }

    let day = rest.as_bytes();
    if day.len() < 3 || !day[0].is_ascii_digit() || !day[1].is_ascii_digit() || day[2] != b' ' {
        return Err(invalid("day of month must be two digits".into()));
    }

    DateTime::parse_from_str(rest, PUB_DATE_FORMAT)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|e| invalid(e.to_string()))
}
