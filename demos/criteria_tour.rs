//! A walk through the criteria builder.
//!
//! Run with `cargo run --example criteria_tour`. Set `CATTERY__DATABASE__SHOW_SQL=true` to log the
//! PostgreSQL rendering of every query.

use cattery::entity::{Cat, Person};
use cattery::logging::init_logging;
use cattery::{
    CatRepository, CatteryError, CriteriaBuilderFactory, CrudRepository, EntityManager,
    PersonRepository,
};

#[cfg(not(feature = "kitten-count"))]
const KITTEN_COUNT: &str = "SIZE(c.kittens)";
#[cfg(feature = "kitten-count")]
const KITTEN_COUNT: &str = "c.kittens";

#[cfg(not(feature = "kitten-count"))]
fn mother_cat(cats: &CatRepository) -> Result<Cat, CatteryError> {
    let kittens = cats.save_all_and_flush(vec![Cat::new("Mugi", 1), Cat::new("Sora", 0)])?;
    cats.save_and_flush(Cat::new("Kinako", 6).with_kittens(kittens))
}

#[cfg(feature = "kitten-count")]
fn mother_cat(cats: &CatRepository) -> Result<Cat, CatteryError> {
    cats.save_and_flush(Cat::new("Kinako", 6).with_kittens(2))
}

fn main() -> Result<(), CatteryError> {
    init_logging();

    let em = EntityManager::from_env().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "invalid configuration, using defaults");
        EntityManager::in_memory()
    });
    let cats = CatRepository::new(&em);
    let people = PersonRepository::new(&em);
    let cbf = CriteriaBuilderFactory::new();

    let mother = mother_cat(&cats)?;
    people.save_and_flush(Person::new("Hinata").with_kittens(vec![mother]))?;
    cats.save_all_and_flush((1..=12).map(|i| Cat::new(format!("Cat{i}"), i * 3 % 17)))?;

    let all: Vec<Cat> = cbf.create::<Cat>(&em).get_result_list()?;
    tracing::info!(count = all.len(), "all cats");

    let names: Vec<String> = cbf
        .create::<String>(&em)
        .from_as::<Cat>("c")
        .select("c.name")
        .filter("c.age")
        .between(5u32, 10u32)
        .order_by_asc("c.name")
        .get_result_list()?;
    tracing::info!(?names, "cats aged 5 to 10");

    let mothers = cbf
        .create_with_alias::<Cat>(&em, "c")
        .filter(KITTEN_COUNT)
        .ge(2)
        .order_by_asc("c.id");
    tracing::info!(sql = %mothers.query_string()?, "mothers query");
    for cat in mothers.get_result_list()? {
        tracing::info!(name = %cat.name, kittens = ?cat.kittens, "mother");
    }

    let pets: Vec<Cat> = cbf
        .create::<Cat>(&em)
        .from_as::<Person>("person")
        .select("person.kittens")
        .get_result_list()?;
    tracing::info!(count = pets.len(), "pet cats");

    let page = cbf
        .create_with_alias::<Cat>(&em, "c")
        .order_by_desc("c.age")
        .order_by_asc("c.id")
        .page(5, 5)
        .get_result_list()?;
    tracing::info!(
        page = page.page(),
        total_pages = page.total_pages(),
        total_size = page.total_size(),
        "second page by age"
    );

    let ambiguous = cbf
        .create::<String>(&em)
        .from_as::<Cat>("c")
        .from_as::<Person>("p")
        .select("name")
        .get_result_list();
    if let Err(err) = ambiguous {
        tracing::info!(error = %err, "relative paths need a single root");
    }

    let tx = em.begin()?;
    cats.delete_all();
    people.delete_all();
    tracing::info!(count = cats.count()?, "inside the transaction");
    tx.rollback()?;
    tracing::info!(count = cats.count()?, "after rollback");

    Ok(())
}
