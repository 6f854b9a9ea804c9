/// Editing mode of a session. Cropping and text editing exclude each other
/// and every other interaction with the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Editing,
    Cropping,
    TextEditing,
    Closed,
}

impl SessionMode {
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Closed)
    }
}
