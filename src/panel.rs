/// visibility of the chat panel.
///
/// presentation (node display, size, button labels) is derived from this
/// value every frame; nothing else is a source of truth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PanelState {
    #[default]
    Closed,
    OpenNormal,
    OpenExpanded,
}

impl PanelState {
    /// open a closed panel, close an open one.
    pub fn toggle(self) -> Self {
        match self {
            PanelState::Closed => PanelState::OpenNormal,
            PanelState::OpenNormal | PanelState::OpenExpanded => PanelState::Closed,
        }
    }

    /// flip between normal and expanded size. no-op while closed.
    pub fn expand(self) -> Self {
        match self {
            PanelState::Closed => PanelState::Closed,
            PanelState::OpenNormal => PanelState::OpenExpanded,
            PanelState::OpenExpanded => PanelState::OpenNormal,
        }
    }

    pub fn outside_click(self) -> Self {
        PanelState::Closed
    }

    pub fn is_open(self) -> bool {
        !matches!(self, PanelState::Closed)
    }

    pub fn is_expanded(self) -> bool {
        matches!(self, PanelState::OpenExpanded)
    }
}
