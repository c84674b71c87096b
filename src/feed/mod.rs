mod fetch;
mod parse;

pub use fetch::{fetch_feed, fetch_feed_bytes, is_url, read_feed_file};
pub use parse::{Feed, FeedEntry, FeedLink, parse_feed};
