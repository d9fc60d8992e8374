use tracing::warn;

use crate::extensions::arg_str;
use crate::plugin::{CommandSpec, Extension};

#[derive(Debug, Clone, Copy, Default)]
pub struct EmojiSymbols;

impl Extension for EmojiSymbols {
    fn name(&self) -> &str {
        "emojiSymbols"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("insertSymbol", |props, args| {
                let Some(symbol) = arg_str(args, "symbol") else {
                    return false;
                };
                if !props.dispatch {
                    return true;
                }
                let selection = props.selection();
                match props.tr.insert_text(symbol, selection.from(), selection.to()) {
                    Ok(_) => true,
                    Err(err) => {
                        warn!(%err, "insertSymbol failed");
                        false
                    }
                }
            })
            .args_example(serde_json::json!("★")),
        ]
    }
}
