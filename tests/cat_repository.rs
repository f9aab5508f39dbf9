//! Repository and criteria queries over a small, fixed set of cats.

mod common;

use cattery::entity::Cat;
use cattery::{CatRepository, CriteriaBuilderFactory, CrudRepository, EntityManager};
use common::{assert_not_empty, ResultLogger};

fn setup() -> (EntityManager, CatRepository) {
    let em = common::setup();
    let repository = CatRepository::new(&em);
    repository.save_and_flush(Cat::new("Fuku", 5)).unwrap();
    repository.save_and_flush(Cat::new("Akari", 3)).unwrap();
    (em, repository)
}

#[test]
fn test_find_all_matches_criteria_list() {
    let (em, repository) = setup();

    let by_repository = repository.find_all().unwrap();
    let by_criteria: Vec<Cat> = CriteriaBuilderFactory::new()
        .create::<Cat>(&em)
        .get_result_list()
        .unwrap();

    assert_not_empty(&by_repository);
    assert_eq!(by_repository, by_criteria);
    ResultLogger::output_result_list("Select cat list by repository", &by_repository);
}

#[test]
fn test_scalar_projection_and_single_result() {
    let (em, _repository) = setup();
    let cbf = CriteriaBuilderFactory::new();

    let ages: Vec<u32> = cbf
        .create::<u32>(&em)
        .from_as::<Cat>("c")
        .select("c.age")
        .order_by_asc("c.age")
        .get_result_list()
        .unwrap();
    assert_eq!(ages, vec![3, 5]);

    let fuku = cbf
        .create_with_alias::<Cat>(&em, "c")
        .filter("c.name")
        .eq("Fuku")
        .get_single_result()
        .unwrap();
    assert_eq!(fuku.age, 5);
}

#[test]
fn test_rollback_restores_the_store() {
    let (em, repository) = setup();

    let tx = em.begin().unwrap();
    repository.delete_all();
    repository.save(Cat::new("Mocha", 11)).unwrap();
    assert_eq!(repository.count().unwrap(), 1);
    tx.rollback().unwrap();

    let names: Vec<String> = CriteriaBuilderFactory::new()
        .create::<String>(&em)
        .from::<Cat>()
        .select("cat.name")
        .order_by_asc("cat.name")
        .get_result_list()
        .unwrap();
    assert_eq!(names, vec!["Akari", "Fuku"]);
}

#[test]
fn test_dropped_transaction_resets_between_cases() {
    let (em, repository) = setup();
    {
        let _tx = em.begin().unwrap();
        repository.save_and_flush(Cat::new("Kurumi", 4)).unwrap();
        assert_eq!(repository.count().unwrap(), 3);
    }
    assert_eq!(repository.count().unwrap(), 2);
}
