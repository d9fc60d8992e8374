use crate::service::HistoryEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryEventKind {
    Execute,
    Undo,
    Redo,
    Goto,
    Change,
}

/// Emitted after every history transition.
///
/// `index` on undo/redo and `current_index` on change are the cursor after the
/// transition.
pub enum HistoryEvent<'a, S, E> {
    Execute {
        entry: &'a HistoryEntry<S, E>,
    },
    Undo {
        entry: &'a HistoryEntry<S, E>,
        index: isize,
    },
    Redo {
        entry: &'a HistoryEntry<S, E>,
        index: isize,
    },
    Goto {
        from: isize,
        to: isize,
    },
    Change {
        current_index: isize,
        can_undo: bool,
        can_redo: bool,
    },
}

impl<S, E> HistoryEvent<'_, S, E> {
    pub fn kind(&self) -> HistoryEventKind {
        match self {
            HistoryEvent::Execute { .. } => HistoryEventKind::Execute,
            HistoryEvent::Undo { .. } => HistoryEventKind::Undo,
            HistoryEvent::Redo { .. } => HistoryEventKind::Redo,
            HistoryEvent::Goto { .. } => HistoryEventKind::Goto,
            HistoryEvent::Change { .. } => HistoryEventKind::Change,
        }
    }

    pub fn entry(&self) -> Option<&HistoryEntry<S, E>> {
        match self {
            HistoryEvent::Execute { entry }
            | HistoryEvent::Undo { entry, .. }
            | HistoryEvent::Redo { entry, .. } => Some(entry),
            HistoryEvent::Goto { .. } | HistoryEvent::Change { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listeners see the event together with the store as it is after the transition.
pub type Listener<S, E> = Box<dyn FnMut(&HistoryEvent<'_, S, E>, &S)>;

pub(crate) struct Listeners<S, E> {
    next_id: u64,
    entries: Vec<(ListenerId, HistoryEventKind, Listener<S, E>)>,
}

impl<S, E> Default for Listeners<S, E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<S, E> Listeners<S, E> {
    pub(crate) fn add(&mut self, kind: HistoryEventKind, listener: Listener<S, E>) -> ListenerId {
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

    pub(crate) fn emit(&mut self, event: &HistoryEvent<'_, S, E>, store: &S) {
        let kind = event.kind();
        for (_, listens_to, listener) in &mut self.entries {
            if *listens_to == kind {
                listener(event, store);
            }
        }
    }
}
