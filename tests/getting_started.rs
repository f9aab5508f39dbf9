//! Basic criteria queries: listing, scalar projections, restrictions and paging.

mod common;

use cattery::entity::Cat;
use cattery::{CriteriaBuilderFactory, CrudRepository};
use common::{assert_not_empty, CatFixtures, ResultLogger};

const MAX_CATS_SIZE: usize = 23;

fn setup() -> (cattery::EntityManager, CatFixtures) {
    let em = common::setup();
    let fixtures = CatFixtures::new(&em);
    fixtures.name_ordered_list(MAX_CATS_SIZE);
    (em, fixtures)
}

#[test]
fn test_get_cat_list_by_repository() {
    let (_em, fixtures) = setup();

    let cats = fixtures.repository().find_all().unwrap();

    assert_not_empty(&cats);
    ResultLogger::output_result_list("Select cat list by repository", &cats);
}

#[test]
fn test_get_cat_list_by_criteria() {
    let (em, _fixtures) = setup();

    let cats: Vec<Cat> = CriteriaBuilderFactory::new()
        .create::<Cat>(&em)
        .get_result_list()
        .unwrap();

    assert_eq!(cats.len(), MAX_CATS_SIZE);
    ResultLogger::output_result_list("Select cat list by criteria", &cats);
}

#[test]
fn test_get_cat_age_list_with_and_without_alias() {
    let (em, _fixtures) = setup();
    let cbf = CriteriaBuilderFactory::new();

    let without_alias: Vec<u32> = cbf
        .create::<u32>(&em)
        .from::<Cat>()
        .select("cat.age")
        .get_result_list()
        .unwrap();
    let with_alias: Vec<u32> = cbf
        .create::<u32>(&em)
        .from_as::<Cat>("c")
        .select("c.age")
        .get_result_list()
        .unwrap();

    assert_not_empty(&without_alias);
    assert_eq!(without_alias, with_alias);
    ResultLogger::output_result_list("Select cat age list without alias", &without_alias);
    ResultLogger::output_result_list("Select cat age list with alias", &with_alias);
}

#[cfg(not(feature = "kitten-count"))]
#[test]
fn test_get_cat_list_with_age_5_to_10_and_at_least_2_kittens() {
    let (em, fixtures) = setup();
    let repository = fixtures.repository();
    repository.delete_all();

    // Age and kitten count both match
    let makino = fixtures.cat_with_kittens("3-makino", 5, 2);
    let kinako1 = fixtures.cat_with_kittens("2-kinako", 6, 3);
    let sakura = fixtures.cat_with_kittens("1-sakura", 10, 2);
    let kinako2 = fixtures.cat_with_kittens("2-kinako", 9, 3);
    // Only the age matches
    let aoi = fixtures.cat_with_kittens("aoi", 5, 1);
    let kohaku = fixtures.cat_with_kittens("kohaku", 10, 0);
    // Only the kitten count matches
    let kurumi = fixtures.cat_with_kittens("kurumi", 4, 2);
    let moka = fixtures.cat_with_kittens("moka", 11, 2);

    let saved = repository
        .save_all_and_flush(vec![makino, kinako1, sakura, kinako2, aoi, kohaku, kurumi, moka])
        .unwrap();
    let expected = vec![
        saved[2].clone(),
        saved[1].clone(),
        saved[3].clone(),
        saved[0].clone(),
    ];

    let cb = CriteriaBuilderFactory::new()
        .create_with_alias::<Cat>(&em, "c")
        .filter("c.age")
        .between_expression("5")
        .and_expression("10")
        .filter("SIZE(c.kittens)")
        .ge_expression("2")
        .order_by_asc("c.name")
        .order_by_asc("c.id");
    let cats = cb.get_result_list().unwrap();

    assert_eq!(cats.len(), 4);
    assert_eq!(cats, expected);
    ResultLogger::output_result_list("Select matched cat list for complicated query", &cats);

    let sql = cb.query_string().unwrap();
    assert!(sql.contains("BETWEEN"), "{sql}");
    assert!(sql.contains("COUNT(*)"), "{sql}");
    assert!(sql.contains("ORDER BY"), "{sql}");
}

#[test]
fn test_get_cat_list_with_paging() {
    let (em, _fixtures) = setup();
    let paging_size = 10;
    let total_pages = 3;
    let cb = CriteriaBuilderFactory::new()
        .create_with_alias::<Cat>(&em, "c")
        .order_by_asc("c.id");

    for page in 1..=total_pages {
        let start_index = (page - 1) * paging_size;
        let end_index = (page * paging_size).min(MAX_CATS_SIZE);
        let expected_size = end_index - start_index;
        let expected_names: Vec<String> = (start_index..end_index)
            .map(|i| format!("Cat{}", i + 1))
            .collect();

        let cats = cb.clone().page(start_index, paging_size).get_result_list().unwrap();
        let actual_names: Vec<String> = cats.iter().map(|cat| cat.name.clone()).collect();

        assert_eq!(cats.len(), expected_size);
        assert_eq!(actual_names, expected_names);
        assert_eq!(cats.first_result(), start_index);
        assert_eq!(cats.max_results(), paging_size);
        assert_eq!(cats.page(), page);
        assert_eq!(cats.size(), expected_size);
        assert_eq!(cats.total_pages(), total_pages);
        assert_eq!(cats.total_size(), MAX_CATS_SIZE);
        ResultLogger::output_result_list(
            &format!("Select cat paging list {page}/{total_pages}"),
            &cats,
        );
    }
}

#[test]
fn test_paging_renders_limit_and_offset() {
    let (em, _fixtures) = setup();
    let sql = CriteriaBuilderFactory::new()
        .create_with_alias::<Cat>(&em, "c")
        .order_by_asc("c.id")
        .page(10, 10)
        .query_string()
        .unwrap();
    assert!(sql.contains("LIMIT 10"), "{sql}");
    assert!(sql.contains("OFFSET 10"), "{sql}");
}
