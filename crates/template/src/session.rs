use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mailkit_history::{CommandType, HistoryEventKind, ListenerId};
use mailkit_richtext::extensions::{button_extensions, text_extensions};
use mailkit_richtext::{Editor, EditorEventKind, EditorOptions};
use serde_json::Value;
use tracing::{debug, trace};

use crate::commands::{TemplateHistory, UpdateBlockCommand};
use crate::entity::{BlockType, BlockUpdate, RichtextContent};
use crate::error::TemplateError;
use crate::store::TemplateStore;

/// One block open in a rich text editor.
///
/// Local edits are recorded in the history through [`commit`](Self::commit).
/// When the history moves on its own (undo, redo, goto) the block's stored
/// content is queued and [`sync`](Self::sync) loads it into the editor
/// without emitting an update, so no new history entry follows.
pub struct BlockEditingSession {
    block_id: String,
    editor: Editor,
    dirty: Rc<Cell<bool>>,
    pending_sync: Rc<RefCell<Option<Value>>>,
    history_listeners: Vec<ListenerId>,
}

impl BlockEditingSession {
    pub fn open(
        store: &TemplateStore,
        history: &mut TemplateHistory,
        block_id: &str,
    ) -> Result<Self, TemplateError> {
        let block = store.block_by_id(block_id)?;
        let extensions = match block.kind() {
            BlockType::Text => text_extensions(&store.template().config.global_styles()),
            BlockType::Button => button_extensions(),
        };
        let options = EditorOptions::new(extensions).content(block.content().json.clone());
        let mut editor = Editor::new(options)?;

        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        editor.on(EditorEventKind::Update, move |_, _| flag.set(true));

        let pending_sync: Rc<RefCell<Option<Value>>> = Rc::default();
        let history_listeners = [HistoryEventKind::Undo, HistoryEventKind::Redo, HistoryEventKind::Goto]
            .into_iter()
            .map(|kind| {
                let queue = Rc::clone(&pending_sync);
                let id = block_id.to_string();
                history.on(kind, move |_, store: &TemplateStore| {
                    if let Ok(block) = store.block_by_id(&id) {
                        trace!(block = %id, "content resync queued");
                        *queue.borrow_mut() = Some(block.content().json.clone());
                    }
                })
            })
            .collect();

        debug!(block = block_id, kind = ?block.kind(), "editing session opened");
        Ok(Self {
            block_id: block_id.to_string(),
            editor,
            dirty,
            pending_sync,
            history_listeners,
        })
    }

    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn run_command(&mut self, name: &str, args: Option<Value>) -> bool {
        self.editor.run_command(name, args)
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        self.editor.insert_text(text)
    }

    /// Whether the editor holds edits not yet recorded.
    pub fn has_pending_edits(&self) -> bool {
        self.dirty.get()
    }

    pub fn content(&self) -> RichtextContent {
        RichtextContent {
            html: self.editor.get_html(),
            json: self.editor.get_json(),
        }
    }

    /// Records pending edits as a `block.update` entry. `Ok(false)` when
    /// there was nothing to record.
    pub fn commit(
        &mut self,
        store: &mut TemplateStore,
        history: &mut TemplateHistory,
    ) -> Result<bool, TemplateError> {
        if !self.dirty.get() {
            return Ok(false);
        }
        let at = store
            .block_coordinates(&self.block_id)
            .ok_or_else(|| TemplateError::UnknownNode(self.block_id.clone()))?;
        let command = UpdateBlockCommand::new(at, BlockUpdate::content(self.content()));
        history.execute_command(store, command, CommandType::BlockUpdate)?;
        self.dirty.set(false);
        // Our own entry does not need to come back through a resync.
        self.pending_sync.borrow_mut().take();
        Ok(true)
    }

    /// Loads content queued by a history move. Returns whether anything
    /// was loaded.
    pub fn sync(&mut self) -> bool {
        let Some(json) = self.pending_sync.borrow_mut().take() else {
            return false;
        };
        let loaded = self.editor.set_content(json, false);
        if loaded {
            self.dirty.set(false);
        }
        debug!(block = %self.block_id, loaded, "content resynced");
        loaded
    }

    /// Detaches from the history and tears the editor down.
    pub fn close(mut self, history: &mut TemplateHistory) {
        for id in self.history_listeners.drain(..) {
            history.off(id);
        }
        self.editor.destroy();
        debug!(block = %self.block_id, "editing session closed");
    }
}

impl std::fmt::Debug for BlockEditingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockEditingSession")
            .field("block_id", &self.block_id)
            .field("dirty", &self.dirty.get())
            .finish_non_exhaustive()
    }
}
