//! Catalog rows, seed format, and registry results.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use docfill_core::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Text,
    Date,
    Email,
    Phone,
    Address,
    Iban,
    Number,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Date => "date",
            DataType::Email => "email",
            DataType::Phone => "phone",
            DataType::Address => "address",
            DataType::Iban => "iban",
            DataType::Number => "number",
        }
    }

    /// Unknown names fall back to `Text`.
    pub fn parse(s: &str) -> Self {
        match s {
            "date" => DataType::Date,
            "email" => DataType::Email,
            "phone" => DataType::Phone,
            "address" => DataType::Address,
            "iban" => DataType::Iban,
            "number" => DataType::Number,
            _ => DataType::Text,
        }
    }
}

/// A semantic group of variables (customer, father, child, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableBlock {
    pub id: i64,
    pub code: String,
    pub display_name: String,
    pub display_name_en: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Display order, lower first.
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: i64,
    /// `block.field`, globally unique.
    pub key: String,
    pub block_id: i64,
    pub label: String,
    pub label_en: String,
    pub data_type: DataType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub priority: i32,
}

impl Variable {
    /// The part of the key after the block prefix.
    pub fn field(&self) -> &str {
        self.key.split_once('.').map(|(_, f)| f).unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableKeyword {
    pub block_id: i64,
    pub keyword: String,
    pub locale: String,
    pub weight: f64,
}

/// Flat catalog rows as loaded from a source.
#[derive(Debug, Clone, Default)]
pub struct CatalogData {
    pub blocks: Vec<VariableBlock>,
    pub variables: Vec<Variable>,
    pub keywords: Vec<VariableKeyword>,
}

impl CatalogData {
    /// Check referential integrity and key rules.
    pub fn validate(&self) -> Result<()> {
        let mut codes = HashMap::new();
        let mut seen_codes = HashSet::new();
        for block in &self.blocks {
            if block.code.is_empty() || block.code.contains('.') {
                return Err(Error::Config(format!("invalid block code '{}'", block.code)));
            }
            if !seen_codes.insert(block.code.as_str())
                || codes.insert(block.id, block.code.as_str()).is_some()
            {
                return Err(Error::Config(format!("duplicate block '{}'", block.code)));
            }
        }

        let mut keys = HashSet::new();
        for var in &self.variables {
            let code = codes.get(&var.block_id).ok_or_else(|| {
                Error::Config(format!("variable {} references unknown block {}", var.key, var.block_id))
            })?;
            match var.key.split_once('.') {
                Some((prefix, field)) if prefix == *code && !field.is_empty() => {}
                _ => {
                    return Err(Error::Config(format!(
                        "variable key '{}' must start with '{}.'",
                        var.key, code
                    )))
                }
            }
            if !keys.insert(var.key.as_str()) {
                return Err(Error::Config(format!("duplicate variable key '{}'", var.key)));
            }
        }

        for kw in &self.keywords {
            if !codes.contains_key(&kw.block_id) {
                return Err(Error::Config(format!("keyword '{}' references unknown block", kw.keyword)));
            }
            if !kw.weight.is_finite() || kw.weight < 0.0 {
                return Err(Error::Config(format!("keyword '{}' has invalid weight", kw.keyword)));
            }
        }
        Ok(())
    }

    /// Build flat rows from a nested seed document, assigning ids in order.
    pub fn from_seed(seed: CatalogSeed) -> Result<Self> {
        let mut data = CatalogData::default();
        for (b, block) in seed.blocks.into_iter().enumerate() {
            let block_id = b as i64 + 1;
            for (v, var) in block.variables.into_iter().enumerate() {
                data.variables.push(Variable {
                    id: data.variables.len() as i64 + 1,
                    key: var.key,
                    block_id,
                    label: var.label,
                    label_en: var.label_en,
                    data_type: var.data_type,
                    example: var.example,
                    priority: var.priority.unwrap_or(v as i32),
                });
            }
            data.keywords.extend(block.keywords.into_iter().map(|k| VariableKeyword {
                block_id,
                keyword: k.keyword,
                locale: k.locale,
                weight: k.weight,
            }));
            data.blocks.push(VariableBlock {
                id: block_id,
                code: block.code,
                display_name: block.display_name,
                display_name_en: block.display_name_en,
                icon: block.icon,
                priority: block.priority,
            });
        }
        data.validate()?;
        Ok(data)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_seed(serde_json::from_str(json)?)
    }
}

/// Seed file: blocks with their variables and keywords nested.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSeed {
    pub blocks: Vec<SeedBlock>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedBlock {
    pub code: String,
    pub display_name: String,
    pub display_name_en: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub variables: Vec<SeedVariable>,
    #[serde(default)]
    pub keywords: Vec<SeedKeyword>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedVariable {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub label_en: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedKeyword {
    pub keyword: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    pub weight: f64,
}

fn default_locale() -> String {
    "sk".to_string()
}

// ---------------------------------------------------------------
// Registry results
// ---------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BlockScore {
    pub block: VariableBlock,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestedVariable {
    pub variable: Variable,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalysis {
    pub detected_blocks: Vec<BlockScore>,
    pub suggested_variables: Vec<SuggestedVariable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ExactKeyMatch,
    BlockFieldMatch,
    LabelMatch,
    ContextSuggestion,
    NoMatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceholderMapping {
    pub variable: Option<Variable>,
    pub confidence: f64,
    pub method: MatchMethod,
}

impl PlaceholderMapping {
    pub fn no_match() -> Self {
        Self {
            variable: None,
            confidence: 0.0,
            method: MatchMethod::NoMatch,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockVariables {
    pub block: VariableBlock,
    pub variables: Vec<Variable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{"blocks":[
        {"code":"father","displayName":"Otec","displayNameEn":"Father","priority":2,
         "variables":[{"key":"father.fullName","label":"Meno otca"},{"key":"father.birthDate","label":"Dátum narodenia otca","dataType":"date"}],
         "keywords":[{"keyword":"otec","weight":10}]}
    ]}"#;

    #[test]
    fn test_seed_flattening() {
        let data = CatalogData::from_json(SEED).unwrap();
        assert_eq!(data.blocks.len(), 1);
        assert_eq!(data.variables[1].data_type, DataType::Date);
        assert_eq!(data.variables[1].priority, 1);
        assert_eq!(data.variables[0].field(), "fullName");
        assert_eq!(data.keywords[0].locale, "sk");
    }

    #[test]
    fn test_key_must_carry_block_prefix() {
        let bad = SEED.replace("father.birthDate", "child.birthDate");
        assert!(matches!(CatalogData::from_json(&bad), Err(Error::Config(_))));

        let dup = SEED.replace("father.birthDate", "father.fullName");
        assert!(matches!(CatalogData::from_json(&dup), Err(Error::Config(_))));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let bad = SEED.replace("\"weight\":10", "\"weight\":-1");
        assert!(CatalogData::from_json(&bad).is_err());
    }

    #[test]
    fn test_data_type_names() {
        assert_eq!(DataType::parse("iban"), DataType::Iban);
        assert_eq!(DataType::parse("whatever"), DataType::Text);
        assert_eq!(serde_json::to_string(&DataType::Email).unwrap(), "\"email\"");
        assert_eq!(
            serde_json::to_string(&MatchMethod::ContextSuggestion).unwrap(),
            "\"context_suggestion\""
        );
    }
}
