#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Enter,
    Escape,
    Delete,
    Backspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool) -> Self {
        Self { ctrl, shift }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub text_input_active: bool,
    pub crop_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    TextInsertLineBreak,
    TextCommit,
    TextCancel,
    CropApply,
    CropCancel,
    DeleteSelection,
    Save,
    ZoomIn,
    ZoomOut,
    CloseRequested,
}

fn resolve_text_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
) -> Option<ShortcutAction> {
    match (key, modifiers.ctrl) {
        (ShortcutKey::Enter, true) => Some(ShortcutAction::TextCommit),
        (ShortcutKey::Enter, false) => Some(ShortcutAction::TextInsertLineBreak),
        (ShortcutKey::Escape, _) => Some(ShortcutAction::TextCancel),
        _ => None,
    }
}

fn resolve_crop_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
) -> Option<ShortcutAction> {
    match (key, modifiers.ctrl) {
        (ShortcutKey::Enter, _) => Some(ShortcutAction::CropApply),
        (ShortcutKey::Escape, _) => Some(ShortcutAction::CropCancel),
        (ShortcutKey::Character('+' | '='), true) => Some(ShortcutAction::ZoomIn),
        (ShortcutKey::Character('-'), true) => Some(ShortcutAction::ZoomOut),
        _ => None,
    }
}

fn resolve_editor_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
) -> Option<ShortcutAction> {
    match (key, modifiers.ctrl, modifiers.shift) {
        (ShortcutKey::Delete, false, false) | (ShortcutKey::Backspace, false, false) => {
            Some(ShortcutAction::DeleteSelection)
        }
        (ShortcutKey::Character('s' | 'S'), true, _) => Some(ShortcutAction::Save),
        (ShortcutKey::Character('+' | '='), true, _) => Some(ShortcutAction::ZoomIn),
        (ShortcutKey::Character('-'), true, _) => Some(ShortcutAction::ZoomOut),
        (ShortcutKey::Escape, false, false) => Some(ShortcutAction::CloseRequested),
        _ => None,
    }
}

pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if context.text_input_active {
        return resolve_text_shortcut(key, modifiers);
    }

    if context.crop_active {
        return resolve_crop_shortcut(key, modifiers);
    }

    resolve_editor_shortcut(key, modifiers)
}
