/// Sticky "new chat while you were away" badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationState {
    unseen: bool,
    pane_visible: bool,
}

impl NotificationState {
    pub fn new(pane_visible: bool) -> Self {
        Self {
            unseen: false,
            pane_visible,
        }
    }

    pub fn has_unseen(&self) -> bool {
        self.unseen
    }

    pub fn pane_visible(&self) -> bool {
        self.pane_visible
    }

    /// Live chat grew the log.
    pub fn on_chat_activity(&mut self) {
        if !self.pane_visible {
            self.unseen = true;
        }
    }

    pub fn set_pane_visible(&mut self, visible: bool) {
        self.pane_visible = visible;
        if visible {
            self.unseen = false;
        }
    }
}
