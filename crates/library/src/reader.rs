use crate::book::Book;

/// What the skybox should do when a scene is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkyboxCue {
    /// Fetch and fade to the panorama at this path below `/static/`.
    Panorama(String),
    /// Fade back to the menu background.
    Reset,
}

/// Everything needed to present one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneView {
    pub index: usize,
    pub count: usize,
    pub text: String,
    /// Whether the "previous" button should be visible.
    pub has_prev: bool,
    /// Whether the "next" button should be visible.
    pub has_next: bool,
    pub cue: SkyboxCue,
}

/// Scene navigation over an opened book.
#[derive(Debug, Default)]
pub struct Reader {
    book: Option<Book>,
    index: Option<usize>,
}

impl Reader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn book(&self) -> Option<&Book> {
        self.book.as_ref()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Opens `book` on its first scene. A book without scenes stays open with
    /// nothing to show.
    pub fn open(&mut self, book: Book) -> Option<SceneView> {
        tracing::info!(book = %book.id, title = %book.title, "opening book");
        self.book = Some(book);
        self.index = None;
        self.next()
    }

    /// Moves one scene forward; `None` at the last scene or with no book open.
    pub fn next(&mut self) -> Option<SceneView> {
        let count = self.book.as_ref()?.scenes.len();
        let next = self.index.map_or(0, |index| index + 1);
        if next >= count {
            return None;
        }
        self.index = Some(next);
        self.current()
    }

    /// Moves one scene back; `None` at the first scene or with no book open.
    pub fn prev(&mut self) -> Option<SceneView> {
        self.book.as_ref()?;
        let index = self.index?;
        if index == 0 {
            return None;
        }
        self.index = Some(index - 1);
        self.current()
    }

    pub fn current(&self) -> Option<SceneView> {
        let book = self.book.as_ref()?;
        let index = self.index?;
        let scene = book.scenes.get(index)?;
        let count = book.scenes.len();
        let cue = match scene.panorama_path(&book.id) {
            Some(path) => SkyboxCue::Panorama(path),
            None => SkyboxCue::Reset,
        };
        Some(SceneView {
            index,
            count,
            text: scene.text.clone(),
            has_prev: index > 0,
            has_next: index + 1 < count,
            cue,
        })
    }

    /// Closes the book and returns to the menu.
    pub fn menu(&mut self) -> SkyboxCue {
        if let Some(book) = self.book.take() {
            tracing::debug!(book = %book.id, "returning to menu");
        }
        self.index = None;
        SkyboxCue::Reset
    }
}
