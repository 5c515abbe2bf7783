use crate::content::message::MessageItem;

/// A conversation item created by the client. The conversation schema
/// defines message items only; in particular there is no item or content
/// part that can carry an image, so image payloads cannot be expressed on
/// the streaming channel at all.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Item {
    #[serde(rename = "message")]
    Message(MessageItem),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "incomplete")]
    Incomplete,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct _Item {
    /// The unique ID of the item, Optional for client events
    pub id: Option<String>,

    /// The status of the item: "completed", "in_progress", "incomplete"
    pub status: Option<ItemStatus>,
}

impl Default for _Item {
    fn default() -> Self {
        Self {
            id: None,
            status: None,
        }
    }
}
