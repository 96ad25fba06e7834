use birbcast_core::ChatEvent;
use birbcast_core::utils::DayClock;

/// Ordered chat entries as the viewer sees them, date separators included.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    events: Vec<ChatEvent>,
    clock: DayClock,
}

impl ChatLog {
    pub fn new(clock: DayClock) -> Self {
        Self {
            events: Vec::new(),
            clock,
        }
    }

    pub fn events(&self) -> &[ChatEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Replaces the whole log with the user messages of a history frame.
    /// System notices in history are dropped; no separators are inserted.
    pub fn replace_with_history(&mut self, history: Vec<ChatEvent>) {
        self.events = history.into_iter().filter(ChatEvent::is_message).collect();
    }

    /// Appends a live event, preceded by a date separator when its local day
    /// differs from the last entry. Returns how many entries were added.
    pub fn append(&mut self, event: ChatEvent) -> usize {
        let ts = event.timestamp_ms();
        let mut added = 0;

        if let Some(last) = self.events.last() {
            if !self.clock.same_day(last.timestamp_ms(), ts) {
                if let Some(label) = self.clock.day_label(ts) {
                    self.events.push(ChatEvent::DateSeparator {
                        label,
                        timestamp_ms: ts,
                    });
                    added += 1;
                }
            }
        }

        self.events.push(event);
        added + 1
    }
}
