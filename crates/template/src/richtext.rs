use mailkit_richtext::extensions::text_extensions;
use mailkit_richtext::{
    ApplyError, Content, Editor, EditorOptions, Transaction, TraverseContext, traverse_in_range,
};
use tracing::debug;

use crate::config::TemplateConfig;
use crate::entity::RichtextContent;
use crate::error::TemplateError;

/// A headless text editor for batch edits of stored block content, kept
/// apart from any interactive editing session.
pub struct RichtextService {
    config: TemplateConfig,
    editor: Editor,
}

fn headless_editor(config: &TemplateConfig) -> Result<Editor, TemplateError> {
    let extensions = text_extensions(&config.global_styles());
    Ok(Editor::new(EditorOptions::new(extensions))?)
}

impl RichtextService {
    pub fn new(config: &TemplateConfig) -> Result<Self, TemplateError> {
        Ok(Self {
            config: config.clone(),
            editor: headless_editor(config)?,
        })
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Rebuilds the headless editor for a new template config.
    pub fn update_config(&mut self, config: &TemplateConfig) -> Result<(), TemplateError> {
        let editor = headless_editor(config)?;
        self.editor.destroy();
        self.editor = editor;
        self.config = config.clone();
        Ok(())
    }

    /// Loads `content`, calls `callback` for every node (and every mark)
    /// in the document that `predicate` accepts, and returns the result in
    /// both encodings. Positions seen by the callback refer to the loaded
    /// document.
    pub fn apply_transform<P, F>(
        &mut self,
        content: &RichtextContent,
        predicate: P,
        mut callback: F,
    ) -> Result<RichtextContent, TemplateError>
    where
        P: Fn(&TraverseContext<'_>) -> bool,
        F: FnMut(&TraverseContext<'_>, &mut Transaction) -> Result<(), ApplyError>,
    {
        let doc = self.editor.parse_content(&Content::Json(content.json.clone()))?;
        let mut load = self.editor.state().tr();
        load.set_prevent_update(true);
        load.replace_doc_content(doc.content)?;
        self.editor.dispatch(load);

        let doc = self.editor.state().doc.clone();
        let mut tr = self.editor.state().tr();
        let mut failure = None;
        traverse_in_range(&doc, 0, doc.content_size(), true, |ctx| {
            if failure.is_some() || !predicate(ctx) {
                return;
            }
            if let Err(err) = callback(ctx, &mut tr) {
                failure = Some(err);
            }
        });
        if let Some(err) = failure {
            return Err(err.into());
        }

        debug!(steps = tr.steps().len(), "content transformed");
        self.editor.dispatch(tr);
        Ok(RichtextContent {
            html: self.editor.get_html(),
            json: self.editor.get_json(),
        })
    }
}

impl std::fmt::Debug for RichtextService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RichtextService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
