//! Template blocks and entry values.
//!
//! A template is an ordered list of blocks; an entry is the same list with
//! `value` filled in. Blocks serialize with camelCase keys and a `type` tag so
//! stored JSON matches the shape the web client writes.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{DiaryError, Result};

/// Kind of input a block collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Textarea,
    Checkbox,
    Slider,
    Date,
    Multiselect,
    Image,
    Bodymap,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Textarea => "textarea",
            BlockType::Checkbox => "checkbox",
            BlockType::Slider => "slider",
            BlockType::Date => "date",
            BlockType::Multiselect => "multiselect",
            BlockType::Image => "image",
            BlockType::Bodymap => "bodymap",
        }
    }
}

impl std::str::FromStr for BlockType {
    type Err = DiaryError;

    fn from_str(value: &str) -> Result<Self> {
        serde_json::from_value(Value::String(value.trim().to_ascii_lowercase())).map_err(|_| {
            DiaryError::InvalidInput(format!("Unknown block type \"{}\"", value))
        })
    }
}

/// A selectable option of a multiselect block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSelectOption {
    pub text: String,
    pub color: String,
}

/// One field of a template or entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_label_in_diary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Legacy plain option list for multiselect blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_select_options: Option<Vec<MultiSelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl Block {
    pub fn new(kind: BlockType, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            kind,
            label: label.into(),
            hide_label_in_diary: None,
            value: None,
            options: None,
            multi_select_options: None,
            min: None,
            max: None,
            step: None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }

    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.options = Some(choices);
        self
    }

    /// Allowed multiselect choices, from either option list.
    pub fn choices(&self) -> Vec<&str> {
        if let Some(options) = self.multi_select_options.as_ref() {
            return options.iter().map(|o| o.text.as_str()).collect();
        }
        self.options
            .as_ref()
            .map(|options| options.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Parse a raw user-supplied string into this block's value type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the text does not fit the block type.
    pub fn parse_value(&self, raw: &str) -> Result<Value> {
        let raw = raw.trim();
        match self.kind {
            BlockType::Text | BlockType::Textarea | BlockType::Image | BlockType::Bodymap => {
                Ok(Value::String(raw.to_string()))
            }
            BlockType::Checkbox => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" | "x" => Ok(Value::Bool(true)),
                "false" | "no" | "n" | "0" | "" => Ok(Value::Bool(false)),
                _ => Err(DiaryError::InvalidInput(format!(
                    "\"{}\" expects yes/no, got \"{}\"",
                    self.label, raw
                ))),
            },
            BlockType::Slider => {
                let number: f64 = raw.parse().map_err(|_| {
                    DiaryError::InvalidInput(format!(
                        "\"{}\" expects a number, got \"{}\"",
                        self.label, raw
                    ))
                })?;
                if self.min.is_some_and(|min| number < min)
                    || self.max.is_some_and(|max| number > max)
                {
                    return Err(DiaryError::InvalidInput(format!(
                        "\"{}\" must be between {} and {}",
                        self.label,
                        self.min.unwrap_or(f64::MIN),
                        self.max.unwrap_or(f64::MAX)
                    )));
                }
                serde_json::Number::from_f64(number)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        DiaryError::InvalidInput(format!("\"{}\" is not a finite number", raw))
                    })
            }
            BlockType::Date => {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                    DiaryError::InvalidInput(format!(
                        "\"{}\" expects a date (YYYY-MM-DD), got \"{}\"",
                        self.label, raw
                    ))
                })?;
                Ok(Value::String(raw.to_string()))
            }
            BlockType::Multiselect => {
                let choices = self.choices();
                let mut selected = Vec::new();
                for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    if !choices.is_empty() && !choices.contains(&item) {
                        return Err(DiaryError::InvalidInput(format!(
                            "\"{}\" is not an option of \"{}\" (choose from: {})",
                            item,
                            self.label,
                            choices.join(", ")
                        )));
                    }
                    selected.push(Value::String(item.to_string()));
                }
                Ok(Value::Array(selected))
            }
        }
    }
}

/// Copy template blocks and fill values matched by label (case-insensitive).
///
/// # Errors
///
/// Returns `InvalidInput` for a label the template does not have or a value
/// that does not parse for its block.
pub fn fill_blocks(template: &[Block], values: &[(String, String)]) -> Result<Vec<Block>> {
    let mut blocks = template.to_vec();
    for block in blocks.iter_mut() {
        block.value = None;
    }
    for (label, raw) in values {
        let block = blocks
            .iter_mut()
            .find(|b| b.label.eq_ignore_ascii_case(label.trim()))
            .ok_or_else(|| DiaryError::InvalidInput(format!("Template has no field \"{}\"", label)))?;
        block.value = Some(block.parse_value(raw)?);
    }
    Ok(blocks)
}

/// Tags of an entry: every selected multiselect value, sorted and deduplicated.
pub fn extract_tags(blocks: &[Block]) -> Vec<String> {
    let mut tags = BTreeSet::new();
    for block in blocks.iter().filter(|b| b.kind == BlockType::Multiselect) {
        if let Some(Value::Array(items)) = block.value.as_ref() {
            for item in items.iter().filter_map(Value::as_str) {
                let tag = item.trim();
                if !tag.is_empty() {
                    tags.insert(tag.to_string());
                }
            }
        }
    }
    tags.into_iter().collect()
}

/// Parse the blocks JSON stored in an entry.
pub fn parse_blocks(json: &str) -> Result<Vec<Block>> {
    serde_json::from_str(json)
        .map_err(|e| DiaryError::Validation(format!("Invalid entry blocks: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mood_template() -> Vec<Block> {
        vec![
            Block::new(BlockType::Textarea, "Notes"),
            Block::new(BlockType::Slider, "Mood").with_range(1.0, 10.0, 1.0),
            Block::new(BlockType::Checkbox, "Exercise"),
            Block::new(BlockType::Multiselect, "Activities")
                .with_choices(vec!["work".into(), "family".into(), "sport".into()]),
            Block::new(BlockType::Date, "Day"),
        ]
    }

    fn pair(label: &str, value: &str) -> (String, String) {
        (label.to_string(), value.to_string())
    }

    #[test]
    fn test_fill_blocks_by_label() {
        let blocks = fill_blocks(
            &mood_template(),
            &[
                pair("notes", "A quiet day"),
                pair("Mood", "7"),
                pair("Exercise", "yes"),
                pair("Activities", "family, sport"),
                pair("Day", "2024-05-01"),
            ],
        )
        .unwrap();

        assert_eq!(blocks[0].value, Some(Value::String("A quiet day".into())));
        assert_eq!(blocks[1].value, Some(serde_json::json!(7.0)));
        assert_eq!(blocks[2].value, Some(Value::Bool(true)));
        assert_eq!(blocks[3].value, Some(serde_json::json!(["family", "sport"])));
        assert_eq!(extract_tags(&blocks), vec!["family", "sport"]);
    }

    #[test]
    fn test_fill_rejects_unknown_label() {
        let err = fill_blocks(&mood_template(), &[pair("Weather", "sunny")]).unwrap_err();
        assert!(err.to_string().contains("Weather"));
    }

    #[test]
    fn test_slider_range_enforced() {
        let err = fill_blocks(&mood_template(), &[pair("Mood", "11")]).unwrap_err();
        assert!(err.to_string().contains("between"));
    }

    #[test]
    fn test_multiselect_rejects_unknown_choice() {
        assert!(fill_blocks(&mood_template(), &[pair("Activities", "gardening")]).is_err());
    }

    #[test]
    fn test_date_validated() {
        assert!(fill_blocks(&mood_template(), &[pair("Day", "01.05.2024")]).is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let block = Block::new(BlockType::Multiselect, "Tags");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "multiselect");
        assert!(json.get("hideLabelInDiary").is_none());

        let parsed: Block = serde_json::from_str(
            r#"{"id":"b1","type":"checkbox","label":"Done","hideLabelInDiary":true,"value":{"checked":true,"text":"x"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.kind, BlockType::Checkbox);
        assert_eq!(parsed.hide_label_in_diary, Some(true));
    }

    #[test]
    fn test_block_type_from_str() {
        assert_eq!("TextArea".parse::<BlockType>().unwrap(), BlockType::Textarea);
        assert!("video".parse::<BlockType>().is_err());
    }
}
