use super::StreamUrl;

/// Linear play history with undo/redo semantics.
///
/// `cursor` is `None` only while the history is empty; otherwise it indexes
/// the entry that is (or was last) playing.
#[derive(Debug, Clone, Default)]
pub(crate) struct History {
    entries: Vec<StreamUrl>,
    cursor: Option<usize>,
}

impl History {
    pub(crate) fn push(&mut self, url: StreamUrl) {
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }
        if self.entries.last() == Some(&url) {
            return;
        }
        self.entries.push(url);
        self.cursor = Some(self.entries.len() - 1);
    }

    pub(crate) fn go_back(&mut self) -> Option<StreamUrl> {
        let cursor = self.cursor.filter(|cursor| *cursor > 0)?;
        self.cursor = Some(cursor - 1);
        self.entries.get(cursor - 1).cloned()
    }

    pub(crate) fn go_forward(&mut self) -> Option<StreamUrl> {
        let next = self.cursor? + 1;
        let url = self.entries.get(next).cloned()?;
        self.cursor = Some(next);
        Some(url)
    }

    pub(crate) fn peek(&self) -> Option<&StreamUrl> {
        self.entries.get(self.cursor?)
    }

    pub(crate) fn entries(&self) -> &[StreamUrl] {
        &self.entries
    }

    pub(crate) fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
