use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{Node, Selection};
use crate::editor::EditorState;
use crate::error::SchemaError;
use crate::ops::Transaction;
use crate::schema::{DomSpec, MarkSpec, NodeSpec, Schema};

pub const DEFAULT_PRIORITY: i32 = 100;

pub type CommandHandler = Arc<dyn Fn(&mut CommandProps<'_>, Option<&Value>) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub description: Option<String>,
    pub requires_nodes: Vec<String>,
    pub requires_marks: Vec<String>,
    pub args_example: Option<Value>,
    pub handler: CommandHandler,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("requires_nodes", &self.requires_nodes)
            .field("requires_marks", &self.requires_marks)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    pub fn new(
        name: impl Into<String>,
        handler: impl Fn(&mut CommandProps<'_>, Option<&Value>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            requires_nodes: Vec::new(),
            requires_marks: Vec::new(),
            args_example: None,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn requires_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires_nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    pub fn requires_marks<I, S>(mut self, marks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires_marks = marks.into_iter().map(Into::into).collect();
        self
    }

    pub fn args_example(mut self, args_example: Value) -> Self {
        self.args_example = Some(args_example);
        self
    }

    fn missing_types(&self, schema: &Schema) -> Vec<String> {
        let nodes = self
            .requires_nodes
            .iter()
            .filter(|name| !schema.has_node(name));
        let marks = self
            .requires_marks
            .iter()
            .filter(|name| !schema.has_mark(name));
        nodes.chain(marks).cloned().collect()
    }
}

fn disabled_command(_props: &mut CommandProps<'_>, _args: Option<&Value>) -> bool {
    false
}

/// What a command handler works with. Handlers edit `tr`; whether the
/// result is applied is decided by the caller through `dispatch`.
pub struct CommandProps<'a> {
    pub tr: &'a mut Transaction,
    pub state: &'a EditorState,
    pub dispatch: bool,
    commands: &'a HashMap<String, CommandSpec>,
}

impl<'a> CommandProps<'a> {
    pub(crate) fn new(
        tr: &'a mut Transaction,
        state: &'a EditorState,
        dispatch: bool,
        commands: &'a HashMap<String, CommandSpec>,
    ) -> Self {
        Self {
            tr,
            state,
            dispatch,
            commands,
        }
    }

    pub fn schema(&self) -> &Schema {
        self.tr.schema()
    }

    pub fn selection(&self) -> Selection {
        self.tr.selection()
    }

    pub fn run(&mut self, name: &str, args: Option<&Value>) -> bool {
        let Some(command) = self.commands.get(name) else {
            warn!(command = name, "unknown command");
            return false;
        };
        let handler = command.handler.clone();
        let mut nested = CommandProps {
            tr: &mut *self.tr,
            state: self.state,
            dispatch: self.dispatch,
            commands: self.commands,
        };
        handler(&mut nested, args)
    }
}

/// One regex match handed to a rule handler, in document positions.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub from: usize,
    pub to: usize,
    pub text: String,
    pub groups: Vec<Option<String>>,
}

impl RuleMatch {
    pub(crate) fn from_captures(captures: &Captures<'_>, from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            text: captures
                .get(0)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            groups: captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        }
    }

    /// Capture group `ix`, counting from one like the regex itself.
    pub fn group(&self, ix: usize) -> Option<&str> {
        ix.checked_sub(1)
            .and_then(|ix| self.groups.get(ix))
            .and_then(|group| group.as_deref())
    }

    pub fn last_group(&self) -> Option<&str> {
        self.groups
            .iter()
            .rev()
            .find_map(|group| group.as_deref().filter(|g| !g.is_empty()))
    }
}

pub type RuleHandler = Arc<dyn Fn(&mut Transaction, &RuleMatch) -> bool + Send + Sync>;

/// Fires when the text before the cursor, plus the typed text, matches.
/// The typed text is not inserted when the rule applies.
#[derive(Clone)]
pub struct InputRule {
    pub name: String,
    pub find: Regex,
    pub handler: RuleHandler,
}

impl InputRule {
    pub fn new(
        name: impl Into<String>,
        find: Regex,
        handler: impl Fn(&mut Transaction, &RuleMatch) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            find,
            handler: Arc::new(handler),
        }
    }
}

/// Fires for every match inside pasted text, after it was inserted.
#[derive(Clone)]
pub struct PasteRule {
    pub name: String,
    pub find: Regex,
    pub handler: RuleHandler,
}

impl PasteRule {
    pub fn new(
        name: impl Into<String>,
        find: Regex,
        handler: impl Fn(&mut Transaction, &RuleMatch) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            find,
            handler: Arc::new(handler),
        }
    }
}

pub type KeyHandler = Arc<dyn Fn(&mut CommandProps<'_>) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct KeyBinding {
    pub key: String,
    pub handler: KeyHandler,
}

impl KeyBinding {
    pub fn new(
        key: impl Into<String>,
        handler: impl Fn(&mut CommandProps<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            handler: Arc::new(handler),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decoration {
    Inline {
        from: usize,
        to: usize,
        class: String,
    },
    Node {
        from: usize,
        to: usize,
        class: String,
    },
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returning false drops the transaction.
    fn filter_transaction(&self, _tr: &Transaction, _state: &EditorState) -> bool {
        true
    }

    fn append_transaction(&self, _tr: &Transaction, _old: &EditorState, _new: &EditorState) -> Option<Transaction> {
        None
    }
}

#[derive(Clone)]
pub struct NodeViewSpec {
    pub name: String,
    pub render: Arc<dyn Fn(&Node) -> DomSpec + Send + Sync>,
}

impl NodeViewSpec {
    pub fn new(name: impl Into<String>, render: impl Fn(&Node) -> DomSpec + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            render: Arc::new(render),
        }
    }
}

pub trait Extension: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        Vec::new()
    }

    fn marks(&self) -> Vec<MarkSpec> {
        Vec::new()
    }

    fn extend_nodes(&self, _nodes: &mut [NodeSpec]) {}

    fn extend_marks(&self, _marks: &mut [MarkSpec]) {}

    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }

    fn input_rules(&self, _schema: &Schema) -> Vec<InputRule> {
        Vec::new()
    }

    fn paste_rules(&self, _schema: &Schema) -> Vec<PasteRule> {
        Vec::new()
    }

    fn keymap(&self) -> Vec<KeyBinding> {
        Vec::new()
    }

    fn plugins(&self) -> Vec<Box<dyn Plugin>> {
        Vec::new()
    }

    fn decorations(&self, _state: &EditorState) -> Vec<Decoration> {
        Vec::new()
    }

    fn node_views(&self) -> Vec<NodeViewSpec> {
        Vec::new()
    }
}

pub struct ExtensionManager {
    extensions: Vec<Arc<dyn Extension>>,
    schema: Arc<Schema>,
    commands: HashMap<String, CommandSpec>,
    input_rules: Vec<InputRule>,
    paste_rules: Vec<PasteRule>,
    keymap: Vec<KeyBinding>,
    plugins: Vec<Box<dyn Plugin>>,
    node_views: HashMap<String, NodeViewSpec>,
}

impl ExtensionManager {
    pub fn new(extensions: Vec<Arc<dyn Extension>>) -> Result<Self, SchemaError> {
        let mut extensions = extensions;
        extensions.sort_by_key(|ext| std::cmp::Reverse(ext.priority()));

        let mut nodes: Vec<NodeSpec> = Vec::new();
        let mut marks: Vec<MarkSpec> = Vec::new();
        for ext in &extensions {
            for spec in ext.nodes() {
                match nodes.iter_mut().find(|n| n.name == spec.name) {
                    Some(existing) => {
                        debug!(extension = ext.name(), node = %spec.name, "node spec replaced");
                        *existing = spec;
                    }
                    None => nodes.push(spec),
                }
            }
            for spec in ext.marks() {
                match marks.iter_mut().find(|m| m.name == spec.name) {
                    Some(existing) => {
                        debug!(extension = ext.name(), mark = %spec.name, "mark spec replaced");
                        *existing = spec;
                    }
                    None => marks.push(spec),
                }
            }
        }
        for ext in &extensions {
            ext.extend_nodes(&mut nodes);
            ext.extend_marks(&mut marks);
        }

        let schema = Arc::new(Schema::new(nodes, marks)?);
        debug!(
            nodes = schema.node_names().count(),
            marks = schema.mark_names().count(),
            "schema composed"
        );

        let mut commands: HashMap<String, CommandSpec> = HashMap::new();
        for ext in &extensions {
            for command in ext.commands() {
                let missing = command.missing_types(&schema);
                let command = if missing.is_empty() {
                    command
                } else {
                    warn!(
                        command = %command.name,
                        extension = ext.name(),
                        missing = ?missing,
                        "command disabled, schema types unavailable"
                    );
                    CommandSpec {
                        handler: Arc::new(disabled_command),
                        ..command
                    }
                };
                if commands.contains_key(&command.name) {
                    debug!(command = %command.name, extension = ext.name(), "command overwritten");
                }
                commands.insert(command.name.clone(), command);
            }
        }

        let mut input_rules = Vec::new();
        let mut paste_rules = Vec::new();
        let mut keymap = Vec::new();
        let mut plugins = Vec::new();
        let mut node_views = HashMap::new();
        for ext in &extensions {
            input_rules.extend(ext.input_rules(&schema));
            paste_rules.extend(ext.paste_rules(&schema));
            keymap.extend(ext.keymap());
            plugins.extend(ext.plugins());
            for view in ext.node_views() {
                node_views.insert(view.name.clone(), view);
            }
        }

        Ok(Self {
            extensions,
            schema,
            commands,
            input_rules,
            paste_rules,
            keymap,
            plugins,
            node_views,
        })
    }

    pub fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    pub fn extension_names(&self) -> Vec<&str> {
        self.extensions.iter().map(|ext| ext.name()).collect()
    }

    pub fn commands(&self) -> &HashMap<String, CommandSpec> {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    pub fn input_rules(&self) -> &[InputRule] {
        &self.input_rules
    }

    pub fn paste_rules(&self) -> &[PasteRule] {
        &self.paste_rules
    }

    pub fn bindings(&self, key: &str) -> impl Iterator<Item = &KeyBinding> {
        self.keymap.iter().filter(move |binding| binding.key == key)
    }

    pub fn plugins(&self) -> &[Box<dyn Plugin>] {
        &self.plugins
    }

    pub fn node_views(&self) -> &HashMap<String, NodeViewSpec> {
        &self.node_views
    }

    pub fn decorations(&self, state: &EditorState) -> Vec<Decoration> {
        self.extensions
            .iter()
            .flat_map(|ext| ext.decorations(state))
            .collect()
    }
}
