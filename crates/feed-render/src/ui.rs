use serde::Serialize;

use feed_store::SettingsStore;

use crate::panel::ConfigPanel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderVisibility {
    Shown,
    Hidden,
}

/// The configuration panel only exists while it is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Config(ConfigPanel),
}

/// Window-level presentation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    header: HeaderVisibility,
    modal: ModalState,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            header: HeaderVisibility::Shown,
            modal: ModalState::Closed,
        }
    }
}

impl UiState {
    pub fn header(&self) -> HeaderVisibility {
        self.header
    }

    /// The header follows the pointer: shown inside the window, hidden outside.
    pub fn pointer_entered(&mut self) -> HeaderVisibility {
        self.header = HeaderVisibility::Shown;
        self.header
    }

    pub fn pointer_left(&mut self) -> HeaderVisibility {
        self.header = HeaderVisibility::Hidden;
        self.header
    }

    pub fn is_config_open(&self) -> bool {
        matches!(self.modal, ModalState::Config(_))
    }

    /// Open the panel, loading it from the store. An already open panel is
    /// kept as is.
    pub fn open_config(&mut self, store: &SettingsStore) {
        if let ModalState::Closed = self.modal {
            self.modal = ModalState::Config(ConfigPanel::open(store));
        }
    }

    pub fn config_panel(&mut self) -> Option<&mut ConfigPanel> {
        match &mut self.modal {
            ModalState::Config(panel) => Some(panel),
            ModalState::Closed => None,
        }
    }

    /// Close the panel. Returns true when one was open, in which case the
    /// caller re-fetches nicknames and cap for the feed.
    pub fn close_config(&mut self) -> bool {
        let was_open = self.is_config_open();
        self.modal = ModalState::Closed;
        was_open
    }
}
