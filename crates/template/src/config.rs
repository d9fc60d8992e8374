use mailkit_richtext::extensions::{GlobalStyles, StyleDefaults};
use serde::{Deserialize, Serialize};

use crate::entity::Style;

/// Typography defaults for one text slot. Unset fields fall back to the
/// editor's own rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<String>,
}

impl TypographyConfig {
    pub fn is_empty(&self) -> bool {
        self.color.is_none()
            && self.font_size.is_none()
            && self.font_family.is_none()
            && self.letter_spacing.is_none()
            && self.line_height.is_none()
    }

    /// Rich text attribute names paired with the values set here.
    pub fn attributes(&self) -> Vec<(&'static str, &str)> {
        [
            ("color", &self.color),
            ("fontSize", &self.font_size),
            ("fontFamily", &self.font_family),
            ("letterSpacing", &self.letter_spacing),
            ("lineHeight", &self.line_height),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h1: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h3: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h4: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h5: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h6: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<Style>,
}

impl TemplateConfig {
    pub fn heading(&self, level: u8) -> Option<&TypographyConfig> {
        match level {
            1 => self.h1.as_ref(),
            2 => self.h2.as_ref(),
            3 => self.h3.as_ref(),
            4 => self.h4.as_ref(),
            5 => self.h5.as_ref(),
            6 => self.h6.as_ref(),
            _ => None,
        }
    }

    /// Fallback styles for the text editor, one table per style.
    pub fn global_styles(&self) -> GlobalStyles {
        GlobalStyles {
            color: self.style_defaults(|slot| slot.color.as_ref()),
            font_size: self.style_defaults(|slot| slot.font_size.as_ref()),
            font_family: self.style_defaults(|slot| slot.font_family.as_ref()),
            line_height: self.style_defaults(|slot| slot.line_height.as_ref()),
            letter_spacing: self.style_defaults(|slot| slot.letter_spacing.as_ref()),
        }
    }

    fn style_defaults(&self, pick: impl Fn(&TypographyConfig) -> Option<&String>) -> StyleDefaults {
        let read = |slot: Option<&TypographyConfig>| slot.and_then(&pick).cloned();
        StyleDefaults {
            paragraph: read(self.paragraph.as_ref()),
            heading: (1..=6u8)
                .filter_map(|level| read(self.heading(level)).map(|value| (level, value)))
                .collect(),
            link: read(self.link.as_ref()),
        }
    }
}

/// Partial config update. Each present slot replaces the whole slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h1: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h3: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h4: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h5: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h6: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<TypographyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<Style>,
}

impl TemplateConfigUpdate {
    pub fn apply_to(&self, config: &mut TemplateConfig) {
        let slots = [
            (&self.paragraph, &mut config.paragraph),
            (&self.h1, &mut config.h1),
            (&self.h2, &mut config.h2),
            (&self.h3, &mut config.h3),
            (&self.h4, &mut config.h4),
            (&self.h5, &mut config.h5),
            (&self.h6, &mut config.h6),
            (&self.link, &mut config.link),
        ];
        for (update, slot) in slots {
            if update.is_some() {
                slot.clone_from(update);
            }
        }
        if self.button.is_some() {
            config.button.clone_from(&self.button);
        }
    }
}
