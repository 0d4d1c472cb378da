use std::collections::BTreeMap;

use serde::Serialize;

use crate::decoder::decode_payload;
use crate::model::{RawLog, RawRow};

/// Rows whose topic equals `topic` exactly (case-sensitive), in file order.
pub fn select_topic<'a>(
    rows: &'a [RawRow],
    topic: &'a str,
) -> impl Iterator<Item = &'a RawRow> + 'a {
    rows.iter().filter(move |row| row.topic == topic)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSummary {
    pub topic: String,
    pub rows: usize,
    pub decodable: usize,
}

/// Per-topic row counts for a log, sorted by topic.
pub fn summarize_topics(log: &RawLog) -> Vec<TopicSummary> {
    let mut by_topic: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for row in &log.rows {
        let entry = by_topic.entry(row.topic.as_str()).or_insert((0, 0));
        entry.0 += 1;
        if decode_payload(row).is_kept() {
            entry.1 += 1;
        }
    }

    by_topic
        .into_iter()
        .map(|(topic, (rows, decodable))| TopicSummary {
            topic: topic.to_string(),
            rows,
            decodable,
        })
        .collect()
}
