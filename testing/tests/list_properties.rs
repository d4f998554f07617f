//! Property tests for list and pagination semantics.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use mood_todos_core::todo::{ListQuery, Mood, PAGE_SIZE, Todo, TodoId};
use mood_todos_core::todo_store::TodoStore;
use mood_todos_testing::InMemoryTodoStore;
use proptest::prelude::*;

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(fut)
}

/// (text, completed) pairs; texts come from a tiny alphabet so searches hit
fn todo_specs() -> impl Strategy<Value = Vec<(String, bool)>> {
    prop::collection::vec(("[abAB%][abAB% ]{0,5}", any::<bool>()), 0..40)
}

fn query_strategy() -> impl Strategy<Value = ListQuery> {
    (any::<bool>(), "[ab%]{0,2}").prop_map(|(open_only, search)| {
        ListQuery::new()
            .unaccomplished_only(open_only)
            .search(search)
    })
}

async fn populate(specs: &[(String, bool)]) -> (InMemoryTodoStore, Vec<Todo>) {
    let store = InMemoryTodoStore::new();
    for (text, completed) in specs {
        let todo = store.create(Mood::Drizzle, text.clone()).await.unwrap();
        if *completed {
            store.complete(todo.id).await.unwrap();
        }
    }
    let all = (1..=i64::try_from(specs.len()).unwrap())
        .filter_map(|id| store.get(TodoId::new(id)))
        .collect();
    (store, all)
}

proptest! {
    #[test]
    fn page_is_bounded_descending_and_filtered(specs in todo_specs(), query in query_strategy()) {
        let page = block_on(async {
            let (store, _) = populate(&specs).await;
            store.list(query.clone()).await.unwrap()
        });

        prop_assert!(page.len() <= PAGE_SIZE);
        prop_assert!(page.windows(2).all(|pair| pair[0].id > pair[1].id));
        prop_assert!(page.iter().all(|todo| query.matches(todo)));
    }

    #[test]
    fn paging_by_last_id_yields_every_match_once(specs in todo_specs(), query in query_strategy()) {
        let (collected, expected) = block_on(async {
            let (store, all) = populate(&specs).await;

            let mut collected: Vec<TodoId> = Vec::new();
            let mut cursor = None;
            loop {
                let page = store.list(query.clone().before(cursor)).await.unwrap();
                collected.extend(page.iter().map(|todo| todo.id));
                if page.len() < PAGE_SIZE {
                    break;
                }
                cursor = page.last().map(|todo| todo.id);
            }

            let mut expected: Vec<TodoId> = all
                .iter()
                .filter(|todo| query.matches(todo))
                .map(|todo| todo.id)
                .collect();
            expected.reverse();
            (collected, expected)
        });

        prop_assert_eq!(collected, expected);
    }
}

#[tokio::test]
async fn create_then_list_returns_created_first() {
    let (store, _) = populate(&[("older".to_string(), false)]).await;
    let created = store
        .create(Mood::Thunder, "newest".to_string())
        .await
        .unwrap();

    let page = store.list(ListQuery::new()).await.unwrap();
    assert_eq!(page.first(), Some(&created));
}
