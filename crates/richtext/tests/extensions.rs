use std::sync::Arc;

use mailkit_richtext::{AttrSpec, CommandSpec, Extension, ExtensionManager, NodeSpec};
use serde_json::json;

/// Declares the bare document structure.
struct Base;

impl Extension for Base {
    fn name(&self) -> &str {
        "base"
    }

    fn priority(&self) -> i32 {
        1000
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::new("doc").content("block+"),
            NodeSpec::new("paragraph").content("inline*").group("block"),
            NodeSpec::new("text").group("inline").inline(),
        ]
    }
}

/// Sets a paragraph `tone` default and registers `shout`.
struct Tone {
    name: &'static str,
    priority: i32,
    tone: &'static str,
}

impl Extension for Tone {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn extend_nodes(&self, nodes: &mut [NodeSpec]) {
        for node in nodes.iter_mut().filter(|node| node.name == "paragraph") {
            node.add_attr("tone", AttrSpec::new(self.tone));
        }
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![CommandSpec::new("shout", |_, _| true).description(self.name)]
    }
}

fn base() -> Arc<dyn Extension> {
    Arc::new(Base)
}

fn tone(name: &'static str, priority: i32, tone: &'static str) -> Arc<dyn Extension> {
    Arc::new(Tone { name, priority, tone })
}

#[test]
fn extensions_run_by_descending_priority_then_registration() -> anyhow::Result<()> {
    let manager = ExtensionManager::new(vec![
        tone("quiet", 100, "soft"),
        tone("loud", 100, "sharp"),
        tone("early", 500, "flat"),
        base(),
    ])?;
    assert_eq!(manager.extension_names(), vec!["base", "early", "quiet", "loud"]);
    Ok(())
}

#[test]
fn node_extensions_layer_in_order() -> anyhow::Result<()> {
    let manager = ExtensionManager::new(vec![
        base(),
        tone("quiet", 100, "soft"),
        tone("loud", 100, "sharp"),
    ])?;
    let attrs = manager.schema().default_attrs("paragraph");
    assert_eq!(attrs.get("tone"), Some(&json!("sharp")));

    let manager = ExtensionManager::new(vec![
        base(),
        tone("loud", 100, "sharp"),
        tone("quiet", 100, "soft"),
    ])?;
    let attrs = manager.schema().default_attrs("paragraph");
    assert_eq!(attrs.get("tone"), Some(&json!("soft")));
    Ok(())
}

#[test]
fn last_extension_wins_a_command_name() -> anyhow::Result<()> {
    let manager = ExtensionManager::new(vec![
        base(),
        tone("quiet", 100, "soft"),
        tone("loud", 100, "sharp"),
    ])?;
    assert_eq!(manager.commands().len(), 1);
    let shout = manager.command("shout").and_then(|command| command.description.as_deref());
    assert_eq!(shout, Some("loud"));
    Ok(())
}

#[test]
fn missing_top_node_is_rejected() {
    assert!(ExtensionManager::new(vec![tone("quiet", 100, "soft")]).is_err());
}
