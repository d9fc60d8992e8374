use std::fmt;

use chrono::Utc;
use uuid::Uuid;

use crate::command::{BoxedCommand, Command};
use crate::events::{HistoryEvent, HistoryEventKind, Listener, ListenerId, Listeners};
use crate::types::{CommandMetadata, CommandType, HistoryConfig, NewCommandMetadata};

/// A command recorded on the timeline together with its metadata.
pub struct HistoryEntry<S, E> {
    command: BoxedCommand<S, E>,
    meta: CommandMetadata,
}

impl<S, E> HistoryEntry<S, E> {
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn timestamp(&self) -> i64 {
        self.meta.timestamp
    }

    pub fn kind(&self) -> CommandType {
        self.meta.kind
    }

    pub fn meta(&self) -> &CommandMetadata {
        &self.meta
    }

    pub fn command_label(&self) -> &'static str {
        self.command.label()
    }
}

impl<S, E> fmt::Debug for HistoryEntry<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryEntry")
            .field("meta", &self.meta)
            .field("command", &self.command.label())
            .finish()
    }
}

/// Timeline of executed commands with a cursor.
///
/// The cursor is `-1` when nothing is applied and `timeline.len() - 1` when
/// fully forward. Entries after the cursor form the redo branch and are
/// dropped as soon as a new command executes.
pub struct HistoryService<S, E> {
    timeline: Vec<HistoryEntry<S, E>>,
    current_index: isize,
    config: HistoryConfig,
    listeners: Listeners<S, E>,
}

impl<S, E> Default for HistoryService<S, E> {
    fn default() -> Self {
        Self::with_config(HistoryConfig::default())
    }
}

impl<S, E> HistoryService<S, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            timeline: Vec::new(),
            current_index: -1,
            config: config.with_defaults(),
            listeners: Listeners::default(),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn execute_command<C>(
        &mut self,
        store: &mut S,
        command: C,
        meta: impl Into<NewCommandMetadata>,
    ) -> Result<(), E>
    where
        C: Command<S, E> + 'static,
    {
        let NewCommandMetadata { kind, user_id } = meta.into();
        let meta = CommandMetadata {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            kind,
            user_id,
        };

        let mut command: BoxedCommand<S, E> = Box::new(command);
        command.execute(store)?;

        self.timeline.truncate(self.redo_boundary());
        self.timeline.push(HistoryEntry { command, meta });
        self.current_index += 1;

        if self.timeline.len() > self.config.max_entries {
            let excess = self.timeline.len() - self.config.max_entries;
            self.timeline.drain(..excess);
            self.current_index -= excess as isize;
        }

        tracing::debug!(
            kind = %kind,
            cursor = self.current_index,
            len = self.timeline.len(),
            "history execute"
        );

        if let Some(entry) = self.timeline.last() {
            self.listeners
                .emit(&HistoryEvent::Execute { entry }, store);
        }
        self.emit_change(store);
        Ok(())
    }

    /// Reverts the entry at the cursor. Returns `Ok(false)` when there is
    /// nothing to undo.
    pub fn undo(&mut self, store: &mut S) -> Result<bool, E> {
        if self.current_index < 0 {
            return Ok(false);
        }
        let ix = self.current_index as usize;
        self.timeline[ix].command.undo(store)?;
        self.current_index -= 1;

        tracing::debug!(cursor = self.current_index, "history undo");
        let event = HistoryEvent::Undo {
            entry: &self.timeline[ix],
            index: self.current_index,
        };
        self.listeners.emit(&event, store);
        self.emit_change(store);
        Ok(true)
    }

    /// Re-executes the entry after the cursor. Returns `Ok(false)` at the tail.
    pub fn redo(&mut self, store: &mut S) -> Result<bool, E> {
        let next = self.redo_boundary();
        if next >= self.timeline.len() {
            return Ok(false);
        }
        self.timeline[next].command.execute(store)?;
        self.current_index += 1;

        tracing::debug!(cursor = self.current_index, "history redo");
        let event = HistoryEvent::Redo {
            entry: &self.timeline[next],
            index: self.current_index,
        };
        self.listeners.emit(&event, store);
        self.emit_change(store);
        Ok(true)
    }

    /// Moves the cursor to `index`, executing or undoing every intermediate
    /// entry one at a time. Out-of-range indexes are ignored (`Ok(false)`).
    pub fn go_to(&mut self, store: &mut S, index: isize) -> Result<bool, E> {
        if index < -1 || index >= self.timeline.len() as isize {
            return Ok(false);
        }

        let from = self.current_index;
        let result = self.step_towards(store, index);
        let to = self.current_index;

        tracing::debug!(from, to, "history goto");
        self.listeners.emit(&HistoryEvent::Goto { from, to }, store);
        self.emit_change(store);
        result.map(|()| true)
    }

    fn step_towards(&mut self, store: &mut S, index: isize) -> Result<(), E> {
        while self.current_index < index {
            let next = self.redo_boundary();
            self.timeline[next].command.execute(store)?;
            self.current_index += 1;
        }
        while self.current_index > index {
            let ix = self.current_index as usize;
            self.timeline[ix].command.undo(store)?;
            self.current_index -= 1;
        }
        Ok(())
    }

    pub fn clear(&mut self, store: &S) {
        self.timeline.clear();
        self.current_index = -1;
        self.emit_change(store);
    }

    pub fn can_undo(&self) -> bool {
        self.current_index >= 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index < self.timeline.len() as isize - 1
    }

    pub fn current_index(&self) -> isize {
        self.current_index
    }

    pub fn timeline(&self) -> &[HistoryEntry<S, E>] {
        &self.timeline
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn on(
        &mut self,
        kind: HistoryEventKind,
        listener: impl FnMut(&HistoryEvent<'_, S, E>, &S) + 'static,
    ) -> ListenerId {
        let listener: Listener<S, E> = Box::new(listener);
        self.listeners.add(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn remove_all_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn redo_boundary(&self) -> usize {
        (self.current_index + 1) as usize
    }

    fn emit_change(&mut self, store: &S) {
        let event = HistoryEvent::Change {
            current_index: self.current_index,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        };
        self.listeners.emit(&event, store);
    }
}

impl<S, E> fmt::Debug for HistoryService<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryService")
            .field("current_index", &self.current_index)
            .field("timeline", &self.timeline)
            .field("max_entries", &self.config.max_entries)
            .finish()
    }
}
