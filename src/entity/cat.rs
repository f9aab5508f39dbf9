use crate::Entity;

/// A cat. Kittens are other cats, kept in the `cat_kittens` join table.
#[cfg(not(feature = "kitten-count"))]
#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[table_name = "cat"]
pub struct Cat {
    #[primary_key]
    pub id: Option<i64>,
    #[not_empty]
    pub name: String,
    pub age: u32,
    #[one_to_many]
    pub kittens: Vec<Cat>,
}

/// A cat whose kittens are only counted.
#[cfg(feature = "kitten-count")]
#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[table_name = "cat"]
pub struct Cat {
    #[primary_key]
    pub id: Option<i64>,
    #[not_empty]
    pub name: String,
    pub age: u32,
    pub kittens: u32,
}

impl Cat {
    /// A transient cat without kittens
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            age,
            kittens: Default::default(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[cfg(not(feature = "kitten-count"))]
    pub fn with_kittens(mut self, kittens: Vec<Cat>) -> Self {
        self.kittens = kittens;
        self
    }

    #[cfg(feature = "kitten-count")]
    pub fn with_kittens(mut self, kittens: u32) -> Self {
        self.kittens = kittens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatteryError;
    use crate::EntityTrait;

    #[test]
    fn test_blank_name_fails_validation() {
        let err = Cat::new("", 3).validate().unwrap_err();
        assert_eq!(
            err,
            CatteryError::Validation("Cat.name must not be empty".to_string())
        );
        assert!(Cat::new("Mugi", 3).validate().is_ok());
    }

    #[test]
    fn test_to_record_requires_id() {
        let err = Cat::new("Sora", 2).to_record().unwrap_err();
        assert!(matches!(err, CatteryError::TransientEntity(_)));

        let record = Cat::new("Sora", 2).with_id(9).to_record().unwrap();
        assert_eq!(record.id(), 9);
        assert_eq!(record.get_value("age"), Some(crate::value::Value::Unsigned(Some(2))));
    }

    #[cfg(not(feature = "kitten-count"))]
    #[test]
    fn test_to_record_stores_kitten_ids() {
        let cat = Cat::new("Leo", 5)
            .with_id(3)
            .with_kittens(vec![Cat::new("Coco", 1).with_id(1), Cat::new("Maron", 0).with_id(2)]);
        let record = cat.to_record().unwrap();
        assert_eq!(record.relation("kittens"), &[1, 2]);
    }
}
