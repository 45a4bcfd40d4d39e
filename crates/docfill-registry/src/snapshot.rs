//! Immutable, indexed view of one catalog load.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use docfill_core::Result;

use crate::types::{CatalogData, Variable, VariableBlock, VariableKeyword};

pub struct CatalogSnapshot {
    blocks: Vec<VariableBlock>,
    variables: Vec<Variable>,
    keywords: Vec<VariableKeyword>,
    block_index: HashMap<i64, usize>,
    key_index: HashMap<String, usize>,
    /// Variable indexes per block id, in display order.
    by_block: HashMap<i64, Vec<usize>>,
    loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn build(data: CatalogData) -> Result<Self> {
        data.validate()?;
        let CatalogData {
            mut blocks,
            variables,
            keywords,
        } = data;
        blocks.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.code.cmp(&b.code)));

        let block_index = blocks.iter().enumerate().map(|(i, b)| (b.id, i)).collect();
        let key_index = variables.iter().enumerate().map(|(i, v)| (v.key.clone(), i)).collect();

        let mut by_block: HashMap<i64, Vec<usize>> = HashMap::new();
        for (i, v) in variables.iter().enumerate() {
            by_block.entry(v.block_id).or_default().push(i);
        }
        for list in by_block.values_mut() {
            list.sort_by(|a, b| {
                let (va, vb) = (&variables[*a], &variables[*b]);
                va.priority.cmp(&vb.priority).then_with(|| va.key.cmp(&vb.key))
            });
        }

        Ok(Self {
            blocks,
            variables,
            keywords,
            block_index,
            key_index,
            by_block,
            loaded_at: Utc::now(),
        })
    }

    /// Blocks in display order.
    pub fn blocks(&self) -> &[VariableBlock] {
        &self.blocks
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn keywords(&self) -> &[VariableKeyword] {
        &self.keywords
    }

    pub fn block(&self, id: i64) -> Option<&VariableBlock> {
        self.block_index.get(&id).map(|i| &self.blocks[*i])
    }

    pub fn block_by_code(&self, code: &str) -> Option<&VariableBlock> {
        self.blocks.iter().find(|b| b.code.eq_ignore_ascii_case(code))
    }

    pub fn variable(&self, key: &str) -> Option<&Variable> {
        self.key_index.get(key).map(|i| &self.variables[*i])
    }

    pub fn variables_in_block(&self, block_id: i64) -> impl Iterator<Item = &Variable> {
        self.by_block
            .get(&block_id)
            .into_iter()
            .flatten()
            .map(|i| &self.variables[*i])
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CatalogSource, StaticCatalog};

    #[test]
    fn test_indexes() {
        let snap = CatalogSnapshot::build(StaticCatalog::slovak().load().unwrap()).unwrap();
        assert_eq!(snap.blocks()[0].code, "customer");
        assert_eq!(snap.variable("father.fullName").unwrap().label, "Meno a priezvisko otca");
        assert!(snap.variable("father.fullname").is_none());

        let father = snap.block_by_code("Father").unwrap();
        let first = snap.variables_in_block(father.id).next().unwrap();
        assert_eq!(first.key, "father.fullName");
        assert_eq!(snap.block(father.id).unwrap().code, "father");
    }
}
