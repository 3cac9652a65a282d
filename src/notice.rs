use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

/// A one-shot, dismissible message for the user. Notices are delivered once
/// and never repeated; ongoing conditions (like a dead connection) produce a
/// single notice on the transition into the condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Cloneable sender half shared by all controllers. The single receiver is
/// handed to the presentation layer at construction.
#[derive(Clone)]
pub struct NoticeFeed {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeFeed {
    pub fn channel() -> (NoticeFeed, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (NoticeFeed { tx }, rx)
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(NoticeKind::Error, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(NoticeKind::Info, message.into());
    }

    fn publish(&self, kind: NoticeKind, message: String) {
        let notice = Notice {
            kind,
            message,
            at: Utc::now(),
        };
        if self.tx.send(notice).is_err() {
            log::debug!("notice dropped: no consumer attached");
        }
    }
}
