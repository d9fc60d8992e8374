use crate::editor::EditorState;
use crate::ops::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorEventKind {
    Transaction,
    Update,
    SelectionUpdate,
    Focus,
    Blur,
    Destroy,
}

/// Emitted by the editor while a transaction is dispatched. Listeners run
/// after the new state has been swapped in.
#[derive(Debug, Clone, Copy)]
pub enum EditorEvent<'a> {
    Transaction { transaction: &'a Transaction },
    Update { transaction: &'a Transaction },
    SelectionUpdate { transaction: &'a Transaction },
    Focus { transaction: &'a Transaction },
    Blur { transaction: &'a Transaction },
    Destroy,
}

impl<'a> EditorEvent<'a> {
    pub fn kind(&self) -> EditorEventKind {
        match self {
            EditorEvent::Transaction { .. } => EditorEventKind::Transaction,
            EditorEvent::Update { .. } => EditorEventKind::Update,
            EditorEvent::SelectionUpdate { .. } => EditorEventKind::SelectionUpdate,
            EditorEvent::Focus { .. } => EditorEventKind::Focus,
            EditorEvent::Blur { .. } => EditorEventKind::Blur,
            EditorEvent::Destroy => EditorEventKind::Destroy,
        }
    }

    pub fn transaction(&self) -> Option<&'a Transaction> {
        match *self {
            EditorEvent::Transaction { transaction }
            | EditorEvent::Update { transaction }
            | EditorEvent::SelectionUpdate { transaction }
            | EditorEvent::Focus { transaction }
            | EditorEvent::Blur { transaction } => Some(transaction),
            EditorEvent::Destroy => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type EditorListener = Box<dyn FnMut(&EditorEvent<'_>, &EditorState)>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, EditorEventKind, EditorListener)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, kind: EditorEventKind, listener: EditorListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, kind, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn emit(&mut self, event: &EditorEvent<'_>, state: &EditorState) {
        let kind = event.kind();
        for (_, listens_to, listener) in &mut self.entries {
            if *listens_to == kind {
                listener(event, state);
            }
        }
    }
}
