use std::fs;

use tasks::error::Error;
use tasks::record::{self, HEADER};
use tasks::rewrite::RewriteStrategy;
use tasks::store::TaskStore;
use tempfile::TempDir;

fn open(dir: &TempDir) -> TaskStore {
    TaskStore::new(dir.path().join("tasks.csv"))
}

#[test]
fn buy_milk_walk_dog_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let store = open(&dir);

    let milk = store.add("Buy milk")?;
    let listed = store.list()?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, 1);
    assert_eq!(listed[0].title, "Buy milk");
    assert_eq!(listed[0].completed_at, None);
    assert_eq!(listed[0], milk);

    assert_eq!(store.add("Walk dog")?.id, 2);

    let done = store.complete(record::parse_task_id("1")?)?;
    assert!(done.completed_at.is_some());
    let listed = store.list()?;
    assert!(listed[0].is_completed());
    assert!(!listed[1].is_completed());

    store.delete(record::parse_task_id("2")?)?;
    let listed = store.list()?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, 1);
    Ok(())
}

#[test]
fn completing_unknown_id_leaves_rows_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let store = open(&dir);
    store.add("one")?;
    store.add("two")?;
    let before = store.list()?;

    assert!(matches!(store.complete(99), Err(Error::TaskNotFound(99))));
    assert_eq!(store.list()?, before);
    Ok(())
}

#[test]
fn deleted_id_never_reappears_in_list() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let store = open(&dir);
    for title in ["a", "b", "c"] {
        store.add(title)?;
    }

    store.delete(3)?;
    assert!(store.list()?.iter().all(|task| task.id != 3));
    store.add("d")?;
    let ids: Vec<u64> = store.list()?.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    Ok(())
}

#[test]
fn titles_with_csv_metacharacters_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let store = open(&dir);
    let title = "Call \"Bob\", then\nemail Alice";

    store.add(title)?;
    assert_eq!(store.list()?[0].title, title);
    Ok(())
}

#[test]
fn header_survives_every_rewrite() -> Result<(), Box<dyn std::error::Error>> {
    for strategy in [
        RewriteStrategy::AtomicRename,
        RewriteStrategy::Recreate,
        RewriteStrategy::Truncate,
    ] {
        let dir = TempDir::new()?;
        let store = open(&dir).with_strategy(strategy);
        store.add("a")?;
        store.add("b")?;
        store.complete(2)?;
        store.delete(1)?;

        let contents = fs::read_to_string(store.path())?;
        let first_line = contents.lines().next().unwrap_or_default();
        assert_eq!(first_line, HEADER.join(","), "strategy {strategy}");
        assert_eq!(contents.lines().count(), 2, "strategy {strategy}");
    }
    Ok(())
}

#[test]
fn add_tolerates_created_but_uninitialized_store() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let store = open(&dir);
    fs::write(store.path(), "")?;

    assert_eq!(store.add("first")?.id, 1);
    let contents = fs::read_to_string(store.path())?;
    assert!(contents.starts_with("ID,Title,CreatedAt,CompletedAt\n1,first,"));
    Ok(())
}

#[test]
fn ids_follow_the_largest_existing_id() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let store = open(&dir);
    fs::write(
        store.path(),
        "ID,Title,CreatedAt,CompletedAt\n\
         7,late,2024-05-01 09:00:00,\n\
         3,early,2024-05-01 08:00:00,2024-05-01 08:30:00\n",
    )?;

    assert_eq!(store.add("next")?.id, 8);
    Ok(())
}
