//! Item records as served by the upstream item API

use serde::{Deserialize, Serialize};

/// Upstream item identifier.
pub type ItemId = u64;

/// Kind tag carried in the upstream `type` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Story,
    Comment,
    Poll,
    PollOpt,
    Job,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A story, comment, poll, poll option or job.
///
/// Only the fields needed for hydration and tree assembly are modelled.
/// Missing fields deserialize to their defaults. Every field is always
/// serialized so the cache encoding stays positional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub by: Option<String>,
    /// Creation time, unix seconds.
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub parent: Option<ItemId>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    /// Parent poll of a poll option.
    #[serde(default)]
    pub poll: Option<ItemId>,
    /// Options of a poll, in display order.
    #[serde(default)]
    pub parts: Vec<ItemId>,
    #[serde(default)]
    pub descendants: Option<u64>,
    /// Direct replies, in ranked display order.
    #[serde(default)]
    pub kids: Vec<ItemId>,
}

impl Item {
    /// Create a bare item of the given kind with every optional field empty.
    pub fn new(id: ItemId, kind: ItemKind) -> Self {
        Self {
            id,
            kind,
            by: None,
            time: 0,
            deleted: false,
            dead: false,
            parent: None,
            text: None,
            url: None,
            title: None,
            score: None,
            poll: None,
            parts: Vec::new(),
            descendants: None,
            kids: Vec::new(),
        }
    }

    /// Set the child ids.
    pub fn with_kids(mut self, kids: impl Into<Vec<ItemId>>) -> Self {
        self.kids = kids.into();
        self
    }

    /// Set the author.
    pub fn with_author(mut self, by: impl Into<String>) -> Self {
        self.by = Some(by.into());
        self
    }

    /// Set the creation time.
    pub fn with_time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }

    /// Whether this item has direct replies.
    pub fn has_kids(&self) -> bool {
        !self.kids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_kids_reflects_reply_list() {
        assert!(!Item::new(1, ItemKind::Comment).has_kids());
        assert!(Item::new(1, ItemKind::Story).with_kids(vec![2]).has_kids());
    }

    #[test]
    fn deserialize_upstream_story() {
        let json = r#"{
            "by": "dhouston",
            "descendants": 71,
            "id": 8863,
            "kids": [8952, 9224, 8917],
            "score": 111,
            "time": 1175714200,
            "title": "My YC app: Dropbox - Throw away your USB drive",
            "type": "story",
            "url": "http://www.getdropbox.com/u/2/screencast.html"
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, 8863);
        assert_eq!(item.kind, ItemKind::Story);
        assert_eq!(item.by.as_deref(), Some("dhouston"));
        assert_eq!(item.kids, vec![8952, 9224, 8917]);
        assert_eq!(item.descendants, Some(71));
        assert!(!item.deleted);
    }

    #[test]
    fn deserialize_deleted_comment_without_author() {
        let json = r#"{"id": 42, "deleted": true, "parent": 7, "time": 1, "type": "comment"}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ItemKind::Comment);
        assert!(item.deleted);
        assert_eq!(item.parent, Some(7));
        assert!(item.by.is_none());
        assert!(item.kids.is_empty());
    }

    #[test]
    fn unknown_kind_falls_back() {
        let json = r#"{"id": 1, "type": "launch"}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ItemKind::Unknown);
    }

    #[test]
    fn pollopt_kind() {
        let json = r#"{"id": 160705, "poll": 160704, "type": "pollopt", "score": 335}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ItemKind::PollOpt);
        assert_eq!(item.poll, Some(160704));
    }

    #[test]
    fn null_payload_is_not_an_item() {
        let parsed: Option<Item> = serde_json::from_str("null").unwrap();
        assert!(parsed.is_none());
    }
}
