//! Layout — pane focus.

/// Which pane currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusPanel {
    #[default]
    Editor,
    Output,
}

impl FocusPanel {
    /// Cycle to the next pane.
    pub fn next(self) -> Self {
        match self {
            Self::Editor => Self::Output,
            Self::Output => Self::Editor,
        }
    }
}
