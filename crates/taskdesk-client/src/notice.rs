/*
[INPUT]:  User-facing messages produced by the orchestration layer
[OUTPUT]: Transient notices routed to logs or to a UI channel
[POS]:    Presentation seam - fire-and-forget notice display
[UPDATE]: When adding presenters or changing notice fields
*/

use std::fmt::Debug;

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A transient message for the user, with the label of its dismiss action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub dismiss_label: String,
}

/// Displays notices. Implementations must not block.
pub trait NoticePresenter: Send + Sync + Debug {
    fn show(&self, message: &str, dismiss_label: &str);
}

/// Writes notices to the log. Used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotices;

impl NoticePresenter for TracingNotices {
    fn show(&self, message: &str, dismiss_label: &str) {
        warn!(notice = message, dismiss = dismiss_label, "notice");
    }
}

/// Forwards notices to whoever renders them.
#[derive(Debug, Clone)]
pub struct ChannelNotices {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotices {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NoticePresenter for ChannelNotices {
    fn show(&self, message: &str, dismiss_label: &str) {
        let notice = Notice {
            message: message.to_string(),
            dismiss_label: dismiss_label.to_string(),
        };
        if self.tx.send(notice).is_err() {
            debug!(notice = message, "notice dropped; no presenter listening");
        }
    }
}
