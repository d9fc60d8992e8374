use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, trace, warn};

use crate::content::{Content, parse_content};
use crate::core::{Attrs, Mark, Node, Selection, char_len};
use crate::error::ContentError;
use crate::events::{EditorEvent, EditorEventKind, ListenerId, Listeners};
use crate::extensions::{BaseKeymap, CoreCommands};
use crate::helpers::{self, first_text_pos, normalize_selection};
use crate::ops::Transaction;
use crate::plugin::{CommandProps, Decoration, Extension, ExtensionManager, RuleMatch};
use crate::schema::Schema;
use crate::serializer::HtmlSerializer;

pub const DEFAULT_INPUT_RULE_LOOKBEHIND: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub max_input_rule_lookbehind: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_input_rule_lookbehind: DEFAULT_INPUT_RULE_LOOKBEHIND,
        }
    }
}

#[derive(Default)]
pub struct EditorOptions {
    pub extensions: Vec<Arc<dyn Extension>>,
    pub content: Content,
    pub config: EditorConfig,
}

impl EditorOptions {
    pub fn new(extensions: Vec<Arc<dyn Extension>>) -> Self {
        Self {
            extensions,
            ..Default::default()
        }
    }

    pub fn content(mut self, content: impl Into<Content>) -> Self {
        self.content = content.into();
        self
    }

    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }
}

#[derive(Debug, Clone)]
pub struct EditorState {
    pub doc: Node,
    pub selection: Selection,
    pub stored_marks: Option<Vec<Mark>>,
    schema: Arc<Schema>,
}

impl EditorState {
    /// A state with the cursor at the start of the first text block.
    pub fn new(schema: Arc<Schema>, doc: Node) -> Self {
        let cursor = first_text_pos(&doc, &schema).unwrap_or(0);
        Self {
            doc,
            selection: Selection::cursor(cursor),
            stored_marks: None,
            schema,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_arc(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    pub fn tr(&self) -> Transaction {
        Transaction::new(
            self.schema.clone(),
            self.doc.clone(),
            self.selection,
            self.stored_marks.clone(),
        )
    }

    /// The state after `tr`. The selection is moved into the nearest text
    /// block, and stored marks only survive on a collapsed selection.
    pub fn apply(&self, tr: &Transaction) -> EditorState {
        let doc = tr.doc().clone();
        let selection = normalize_selection(&doc, &self.schema, tr.selection());
        let stored_marks = if !selection.is_empty() {
            None
        } else if tr.selection_set() && !tr.stored_marks_set() {
            None
        } else {
            tr.stored_marks().map(<[Mark]>::to_vec)
        };
        EditorState {
            doc,
            selection,
            stored_marks,
            schema: self.schema.clone(),
        }
    }

    pub fn cursor_marks(&self) -> Vec<Mark> {
        if let Some(marks) = &self.stored_marks {
            return marks.clone();
        }
        self.doc
            .resolve(self.selection.head)
            .map(|pos| pos.marks(&self.schema))
            .unwrap_or_default()
    }
}

pub struct Editor {
    manager: ExtensionManager,
    state: EditorState,
    config: EditorConfig,
    listeners: Listeners,
    focused: bool,
    destroyed: bool,
}

impl Editor {
    pub fn new(options: EditorOptions) -> Result<Self, ContentError> {
        let EditorOptions {
            extensions,
            content,
            config,
        } = options;
        let mut all: Vec<Arc<dyn Extension>> = vec![Arc::new(CoreCommands), Arc::new(BaseKeymap)];
        all.extend(extensions);

        let manager = ExtensionManager::new(all)?;
        let schema = manager.schema();
        let doc = parse_content(&schema, &content)?;
        debug!(
            extensions = manager.extensions().len(),
            size = doc.content_size(),
            "editor created"
        );

        Ok(Self {
            state: EditorState::new(schema, doc),
            manager,
            config,
            listeners: Listeners::default(),
            focused: false,
            destroyed: false,
        })
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn schema(&self) -> Arc<Schema> {
        self.manager.schema()
    }

    pub fn manager(&self) -> &ExtensionManager {
        &self.manager
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn on(
        &mut self,
        kind: EditorEventKind,
        listener: impl FnMut(&EditorEvent<'_>, &EditorState) + 'static,
    ) -> ListenerId {
        self.listeners.add(kind, Box::new(listener))
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Applies `tr` and notifies listeners. Plugins may veto the
    /// transaction or append follow-up edits.
    pub fn dispatch(&mut self, tr: Transaction) {
        if self.destroyed {
            warn!("dispatch on a destroyed editor ignored");
            return;
        }
        for plugin in self.manager.plugins() {
            if !plugin.filter_transaction(&tr, &self.state) {
                debug!(plugin = plugin.name(), "transaction filtered");
                return;
            }
        }

        let mut next = self.state.apply(&tr);
        let mut doc_changed = tr.doc_changed();
        for plugin in self.manager.plugins() {
            if let Some(extra) = plugin.append_transaction(&tr, &self.state, &next) {
                trace!(plugin = plugin.name(), steps = extra.steps().len(), "transaction appended");
                doc_changed |= extra.doc_changed();
                next = next.apply(&extra);
            }
        }

        let selection_changed = next.selection != self.state.selection;
        self.state = next;
        trace!(
            steps = tr.steps().len(),
            doc_changed,
            selection_changed,
            "transaction dispatched"
        );

        let state = &self.state;
        let listeners = &mut self.listeners;
        listeners.emit(&EditorEvent::Transaction { transaction: &tr }, state);
        if doc_changed && !tr.meta.prevent_update {
            listeners.emit(&EditorEvent::Update { transaction: &tr }, state);
        }
        if selection_changed {
            listeners.emit(&EditorEvent::SelectionUpdate { transaction: &tr }, state);
        }
        if tr.meta.focus {
            self.focused = true;
            listeners.emit(&EditorEvent::Focus { transaction: &tr }, state);
        }
        if tr.meta.blur {
            self.focused = false;
            listeners.emit(&EditorEvent::Blur { transaction: &tr }, state);
        }
    }

    pub fn run_command(&mut self, name: &str, args: Option<Value>) -> bool {
        let Some(command) = self.manager.command(name) else {
            warn!(command = name, "unknown command");
            return false;
        };
        let handler = command.handler.clone();
        let mut tr = self.state.tr();
        let ok = {
            let mut props = CommandProps::new(&mut tr, &self.state, true, self.manager.commands());
            handler(&mut props, args.as_ref())
        };
        self.dispatch(tr);
        ok
    }

    pub fn chain(&mut self) -> ChainedCommands<'_> {
        let tr = self.state.tr();
        ChainedCommands {
            editor: self,
            tr,
            ok: true,
        }
    }

    pub fn can(&self) -> CanCommands<'_> {
        CanCommands { editor: self }
    }

    pub fn set_content(&mut self, content: Value, emit_update: bool) -> bool {
        self.run_command(
            "setContent",
            Some(json!({ "content": content, "emitUpdate": emit_update })),
        )
    }

    pub fn get_json(&self) -> Value {
        serde_json::to_value(&self.state.doc).unwrap_or_default()
    }

    pub fn get_html(&self) -> String {
        HtmlSerializer::new(self.state.schema()).serialize_content(&self.state.doc)
    }

    pub fn get_view_html(&self) -> String {
        HtmlSerializer::new(self.state.schema())
            .with_node_views(self.manager.node_views())
            .serialize_content(&self.state.doc)
    }

    pub fn parse_content(&self, content: &Content) -> Result<Node, ContentError> {
        parse_content(self.state.schema(), content)
    }

    pub fn is_active(&self, name: Option<&str>, attrs: Option<&Value>) -> bool {
        helpers::is_active(&self.state, name, attrs)
    }

    pub fn get_attributes(&self, name: &str) -> Attrs {
        helpers::get_attributes(&self.state, name)
    }

    pub fn decorations(&self) -> Vec<Decoration> {
        self.manager.decorations(&self.state)
    }

    /// Types `text` over the selection. The first matching input rule
    /// replaces the insertion.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let (from, to) = (self.state.selection.from(), self.state.selection.to());
        if let Some(tr) = self.run_input_rules(from, to, text) {
            self.dispatch(tr);
            return true;
        }
        let mut tr = self.state.tr();
        if let Err(err) = tr.insert_text(text, from, to) {
            warn!(%err, "text insertion failed");
            return false;
        }
        self.dispatch(tr);
        true
    }

    fn run_input_rules(&self, from: usize, to: usize, text: &str) -> Option<Transaction> {
        let resolved = self.state.doc.resolve(from).ok()?;
        let parent = resolved.parent();
        if !self.state.schema().is_textblock(&parent.kind) {
            return None;
        }
        let offset = resolved.parent_offset();
        let start = offset.saturating_sub(self.config.max_input_rule_lookbehind);
        let before = parent.text_between(start, offset, "", "\u{fffc}") + text;
        let text_chars = char_len(text);

        for rule in self.manager.input_rules() {
            let Some(captures) = rule.find.captures(&before) else {
                continue;
            };
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let matched = char_len(whole.as_str());
            let Some(lead) = matched.checked_sub(text_chars) else {
                continue;
            };
            let Some(rule_from) = from.checked_sub(lead) else {
                continue;
            };
            let found = RuleMatch::from_captures(&captures, rule_from, to);
            let mut tr = self.state.tr();
            if (rule.handler)(&mut tr, &found) {
                debug!(rule = %rule.name, from = rule_from, to, "input rule applied");
                tr.meta.source = Some("inputRule".to_string());
                return Some(tr);
            }
        }
        None
    }

    pub fn paste_text(&mut self, text: &str) -> bool {
        let (from, to) = (self.state.selection.from(), self.state.selection.to());
        let mut tr = self.state.tr();
        if let Err(err) = tr.insert_text(text, from, to) {
            warn!(%err, "paste failed");
            return false;
        }
        let start = from;
        let mut end = from + char_len(text);

        for rule in self.manager.paste_rules() {
            let steps_before = tr.steps().len();
            let haystack = tr.doc().text_between(start, end, "", "\u{fffc}");
            let found: Vec<RuleMatch> = rule
                .find
                .captures_iter(&haystack)
                .filter_map(|captures| {
                    let whole = captures.get(0)?;
                    let offset = char_len(&haystack[..whole.start()]);
                    let from = start + offset;
                    Some(RuleMatch::from_captures(&captures, from, from + char_len(whole.as_str())))
                })
                .collect();
            for m in found.iter().rev() {
                if (rule.handler)(&mut tr, m) {
                    trace!(rule = %rule.name, from = m.from, to = m.to, "paste rule applied");
                }
            }
            end = tr.map_since(steps_before, end);
        }

        tr.meta.source = Some("paste".to_string());
        self.dispatch(tr);
        true
    }

    pub fn handle_key(&mut self, key: &str) -> bool {
        let handlers: Vec<_> = self
            .manager
            .bindings(key)
            .map(|binding| binding.handler.clone())
            .collect();
        for handler in handlers {
            let mut tr = self.state.tr();
            let handled = {
                let mut props =
                    CommandProps::new(&mut tr, &self.state, true, self.manager.commands());
                handler(&mut props)
            };
            if handled {
                trace!(key, "key handled");
                self.dispatch(tr);
                return true;
            }
        }
        false
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.listeners.emit(&EditorEvent::Destroy, &self.state);
        self.listeners.clear();
        self.destroyed = true;
        debug!("editor destroyed");
    }
}

/// Commands sharing one transaction. Nothing is applied until [`run`].
///
/// [`run`]: ChainedCommands::run
pub struct ChainedCommands<'a> {
    editor: &'a mut Editor,
    tr: Transaction,
    ok: bool,
}

impl ChainedCommands<'_> {
    pub fn command(mut self, name: &str, args: Option<Value>) -> Self {
        let Some(command) = self.editor.manager.command(name) else {
            warn!(command = name, "unknown command in chain");
            self.ok = false;
            return self;
        };
        let handler = command.handler.clone();
        let ok = {
            let mut props = CommandProps::new(
                &mut self.tr,
                &self.editor.state,
                true,
                self.editor.manager.commands(),
            );
            handler(&mut props, args.as_ref())
        };
        self.ok &= ok;
        self
    }

    /// Dispatches the collected edits. True when every command succeeded.
    pub fn run(self) -> bool {
        let ChainedCommands { editor, tr, ok } = self;
        editor.dispatch(tr);
        ok
    }
}

pub struct CanCommands<'a> {
    editor: &'a Editor,
}

impl CanCommands<'_> {
    pub fn command(&self, name: &str, args: Option<Value>) -> bool {
        let Some(command) = self.editor.manager.command(name) else {
            return false;
        };
        let handler = command.handler.clone();
        let mut tr = self.editor.state.tr();
        let mut props =
            CommandProps::new(&mut tr, &self.editor.state, false, self.editor.manager.commands());
        handler(&mut props, args.as_ref())
    }
}
