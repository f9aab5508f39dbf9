use super::Cat;
use crate::Entity;

/// A person looking after some kittens
#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[table_name = "person"]
pub struct Person {
    #[primary_key]
    pub id: Option<i64>,
    #[not_empty]
    pub name: String,
    #[one_to_many]
    pub kittens: Vec<Cat>,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            kittens: Vec::new(),
        }
    }

    pub fn with_kittens(mut self, kittens: Vec<Cat>) -> Self {
        self.kittens = kittens;
        self
    }
}
