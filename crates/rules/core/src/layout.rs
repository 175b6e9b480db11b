//! Presentation metadata for sheet renderers and editors.
//!
//! The engine never reads these; they are stored in registration order and
//! handed back unchanged.

/// Placement of one attribute on the rendered sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SheetElement {
    pub name: String,
    /// Enclosing element, if any.
    pub within: Option<String>,
    /// Display format, e.g. `"<b>Speed</b> %V"`.
    pub format: Option<String>,
    /// Separator between list entries.
    pub separator: Option<String>,
}

impl SheetElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn within(mut self, parent: impl Into<String>) -> Self {
        self.within = Some(parent.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }
}

/// An input widget in the character editor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EditorElement {
    pub name: String,
    pub label: String,
    /// Widget kind, e.g. `select-one`, `text`, `bag`.
    pub kind: String,
    /// Widget parameters; for selects usually a choice category.
    pub params: Vec<String>,
}

impl EditorElement {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: kind.into(),
            params: Vec::new(),
        }
    }

    pub fn params<P: Into<String>>(mut self, params: impl IntoIterator<Item = P>) -> Self {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }
}

/// Ordered sheet and editor elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Layout {
    sheet: Vec<SheetElement>,
    editor: Vec<EditorElement>,
}

impl Layout {
    /// Adds `element`, replacing an element of the same name in place.
    pub fn define_sheet_element(&mut self, element: SheetElement) {
        match self.sheet.iter_mut().find(|e| e.name == element.name) {
            Some(existing) => *existing = element,
            None => self.sheet.push(element),
        }
    }

    /// Adds `element`, replacing an element of the same name in place.
    pub fn define_editor_element(&mut self, element: EditorElement) {
        match self.editor.iter_mut().find(|e| e.name == element.name) {
            Some(existing) => *existing = element,
            None => self.editor.push(element),
        }
    }

    /// Returns whether an element was removed.
    pub fn remove_sheet_element(&mut self, name: &str) -> bool {
        let before = self.sheet.len();
        self.sheet.retain(|e| e.name != name);
        self.sheet.len() != before
    }

    pub fn remove_editor_element(&mut self, name: &str) -> bool {
        let before = self.editor.len();
        self.editor.retain(|e| e.name != name);
        self.editor.len() != before
    }

    pub fn sheet(&self) -> &[SheetElement] {
        &self.sheet
    }

    pub fn editor(&self) -> &[EditorElement] {
        &self.editor
    }

    pub fn is_empty(&self) -> bool {
        self.sheet.is_empty() && self.editor.is_empty()
    }
}
