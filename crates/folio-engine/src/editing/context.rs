use crate::document::Document;
use crate::editing::caret::Caret;
use crate::editing::selection::Selection;
use crate::view::ViewProvider;

/// Everything a command or action operates on.
pub struct EditorContext {
    pub document: Document,
    pub selection: Selection,
    pub views: Option<Box<dyn ViewProvider>>,
}

impl EditorContext {
    /// A context with the caret at the start of `document` and no views.
    pub fn new(document: Document) -> Self {
        let selection = Selection::at_document_start(&document);
        Self {
            document,
            selection,
            views: None,
        }
    }

    pub fn with_views(mut self, views: impl ViewProvider + 'static) -> Self {
        self.views = Some(Box::new(views));
        self
    }

    /// The active caret.
    pub fn caret(&self) -> Caret {
        self.selection.start()
    }
}

impl std::fmt::Debug for EditorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorContext")
            .field("document", &self.document)
            .field("selection", &self.selection)
            .field("views", &self.views.is_some())
            .finish()
    }
}
