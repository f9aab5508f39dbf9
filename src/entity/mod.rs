//! Entity definitions and the metadata the store and criteria builder work from.
//!
//! An entity is a struct deriving [`Entity`](crate::Entity). The derive produces an
//! [`EntityTrait`] implementation whose [`EntityMeta`] describes the table, the default
//! query alias and every attribute, and which maps the struct to and from a [`Record`].

mod cat;
mod person;

pub use cat::Cat;
pub use person::Person;

use crate::error::CatteryError;
use crate::store::Hydrator;
use crate::value::{Value, ValueKind};
use std::collections::BTreeMap;
use std::fmt;

/// How an attribute is stored
#[derive(Clone, Copy)]
pub enum AttributeKind {
    /// The storage-assigned surrogate key
    PrimaryKey,
    /// A scalar column
    Basic(ValueKind),
    /// A collection of other entities, kept in a join table
    OneToMany {
        target: fn() -> &'static EntityMeta,
    },
}

impl fmt::Debug for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::PrimaryKey => f.write_str("PrimaryKey"),
            AttributeKind::Basic(kind) => f.debug_tuple("Basic").field(kind).finish(),
            AttributeKind::OneToMany { target } => f
                .debug_struct("OneToMany")
                .field("target", &target().name)
                .finish(),
        }
    }
}

/// A single persistent attribute of an entity
#[derive(Debug, Clone, Copy)]
pub struct AttributeDef {
    /// Attribute name as used in criteria paths (`c.age`)
    pub name: &'static str,
    /// Column name used when rendering SQL
    pub column: &'static str,
    pub kind: AttributeKind,
    pub nullable: bool,
}

impl AttributeDef {
    /// Scalar kind of the attribute; primary keys are integers, collections have none
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self.kind {
            AttributeKind::PrimaryKey => Some(ValueKind::Integer),
            AttributeKind::Basic(kind) => Some(kind),
            AttributeKind::OneToMany { .. } => None,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, AttributeKind::PrimaryKey)
    }

    /// Target entity of a one-to-many attribute
    pub fn target(&self) -> Option<&'static EntityMeta> {
        match self.kind {
            AttributeKind::OneToMany { target } => Some(target()),
            _ => None,
        }
    }
}

/// Static description of an entity type
#[derive(Debug)]
pub struct EntityMeta {
    /// Entity name (`Cat`)
    pub name: &'static str,
    /// Table name (`cat`)
    pub table: &'static str,
    /// Default query alias (`cat`)
    pub alias: &'static str,
    pub attributes: &'static [AttributeDef],
}

impl EntityMeta {
    pub fn attribute(&self, name: &str) -> Option<&'static AttributeDef> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// The identifier attribute. Derived entities always have one.
    pub fn primary_key(&self) -> Option<&'static AttributeDef> {
        self.attributes.iter().find(|attr| attr.is_primary_key())
    }

    /// Column holding the identifier, `id` when no key attribute is declared
    pub fn key_column(&self) -> &'static str {
        self.primary_key().map_or("id", |attr| attr.column)
    }

    pub fn one_to_many(&self) -> impl Iterator<Item = &'static AttributeDef> {
        self.attributes
            .iter()
            .filter(|attr| matches!(attr.kind, AttributeKind::OneToMany { .. }))
    }

    /// Join table backing a one-to-many attribute (`cat_kittens`)
    pub fn join_table(&self, attribute: &AttributeDef) -> String {
        format!("{}_{}", self.table, attribute.column)
    }
}

impl PartialEq for EntityMeta {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl Eq for EntityMeta {}

/// Trait implemented by every persistent entity
///
/// Normally generated by `#[derive(Entity)]`; see [`Cat`] for an example.
pub trait EntityTrait: Clone + fmt::Debug + Send + Sync + Sized + 'static {
    /// Static metadata describing this entity type
    fn meta() -> &'static EntityMeta;

    /// Surrogate key, `None` while the entity is transient
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Check declared constraints such as `#[not_empty]`
    fn validate(&self) -> Result<(), CatteryError>;

    /// Map the entity to a storage record. Fails if it, or any entity it references,
    /// has no identifier yet.
    fn to_record(&self) -> Result<Record, CatteryError>;

    /// Rebuild the entity from a stored record, loading referenced entities
    fn from_record(record: &Record, hydrator: &mut Hydrator<'_>) -> Result<Self, CatteryError>;
}

/// One stored row: scalar values by attribute name, plus the member ids of each
/// one-to-many attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: i64,
    values: BTreeMap<&'static str, Value>,
    relations: BTreeMap<&'static str, Vec<i64>>,
}

impl Record {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            values: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn set_value(&mut self, attribute: &'static str, value: Value) {
        self.values.insert(attribute, value);
    }

    pub fn value(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// Owned copy of a scalar value
    pub fn get_value(&self, attribute: &str) -> Option<Value> {
        self.values.get(attribute).cloned()
    }

    pub fn set_relation(&mut self, attribute: &'static str, ids: Vec<i64>) {
        self.relations.insert(attribute, ids);
    }

    /// Member ids of a one-to-many attribute, empty when none were stored
    pub fn relation(&self, attribute: &str) -> &[i64] {
        self.relations
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn relations(&self) -> impl Iterator<Item = (&'static str, &[i64])> {
        self.relations
            .iter()
            .map(|(attribute, ids)| (*attribute, ids.as_slice()))
    }
}

/// Collect the identifiers of a one-to-many collection.
///
/// Every member must already be persisted, and a member may appear only once.
pub fn collect_ids<E: EntityTrait>(
    members: &[E],
    owner: &str,
    attribute: &str,
) -> Result<Vec<i64>, CatteryError> {
    let mut ids = Vec::with_capacity(members.len());
    for member in members {
        let id = member.id().ok_or_else(|| {
            CatteryError::TransientEntity(format!(
                "{owner}.{attribute} references an unsaved {}; save it first",
                E::meta().name
            ))
        })?;
        if ids.contains(&id) {
            return Err(CatteryError::Validation(format!(
                "{owner}.{attribute} contains {} {id} more than once",
                E::meta().name
            )));
        }
        ids.push(id);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cat_meta() {
        let meta = Cat::meta();
        assert_eq!(meta.name, "Cat");
        assert_eq!(meta.table, "cat");
        assert_eq!(meta.alias, "cat");
        assert_eq!(meta.primary_key().map(|attr| attr.name), Some("id"));
        assert_eq!(
            meta.attribute("age").and_then(AttributeDef::value_kind),
            Some(ValueKind::Integer)
        );
        assert!(meta.attribute("colour").is_none());
    }

    #[test]
    fn test_meta_without_key_attribute() {
        static KEYLESS: EntityMeta = EntityMeta {
            name: "Tag",
            table: "tag",
            alias: "tag",
            attributes: &[AttributeDef {
                name: "label",
                column: "label",
                kind: AttributeKind::Basic(ValueKind::Text),
                nullable: false,
            }],
        };
        assert!(KEYLESS.primary_key().is_none());
        assert_eq!(KEYLESS.key_column(), "id");
        assert_eq!(Cat::meta().key_column(), "id");
    }

    #[test]
    fn test_person_meta_targets_cat() {
        let meta = Person::meta();
        assert_eq!(meta.alias, "person");
        let kittens = meta.attribute("kittens").expect("kittens attribute");
        assert_eq!(kittens.target().map(|t| t.name), Some("Cat"));
        assert_eq!(meta.join_table(kittens), "person_kittens");
    }

    #[test]
    fn test_record_relations_default_to_empty() {
        let mut record = Record::new(3);
        assert!(record.relation("kittens").is_empty());
        record.set_relation("kittens", vec![1, 2]);
        assert_eq!(record.relation("kittens"), &[1, 2]);
        record.set_value("name", Value::String(Some("Coco".into())));
        assert_eq!(record.get_value("name"), Some(Value::String(Some("Coco".into()))));
    }

    #[test]
    fn test_collect_ids_rejects_transient_and_duplicates() {
        let saved = Cat::new("Leo", 2).with_id(4);
        let transient = Cat::new("Maron", 1);

        let err = collect_ids(&[saved.clone(), transient], "Person", "kittens").unwrap_err();
        assert!(matches!(err, CatteryError::TransientEntity(_)));

        let err = collect_ids(&[saved.clone(), saved.clone()], "Person", "kittens").unwrap_err();
        assert!(matches!(err, CatteryError::Validation(_)));

        assert_eq!(collect_ids(&[saved], "Person", "kittens"), Ok(vec![4]));
    }
}
