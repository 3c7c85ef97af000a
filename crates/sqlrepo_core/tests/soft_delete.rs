mod common;

use common::model::Post;
use common::repo::SqlitePostRepository;
use common::{count_rows, setup_db};
use sqlrepo_core::{RepoError, Repository, XuidGenerator};
use std::cell::Cell;

fn post_repo() -> Repository<Post> {
    Repository::for_type::<SqlitePostRepository>(setup_db())
}

struct CountingXuid {
    next: Cell<u32>,
}

impl XuidGenerator for CountingXuid {
    fn generate(&self) -> String {
        let value = self.next.get() + 1;
        self.next.set(value);
        format!("xuid-{value}")
    }
}

#[test]
fn capabilities_follow_declared_columns() {
    let repo = post_repo();
    assert_eq!(repo.table_name(), "posts");
    assert!(repo.supports_soft_delete());
    assert!(repo.supports_xuid());
}

#[test]
fn remove_marks_row_instead_of_deleting() {
    let repo = post_repo();
    let mut post = Post::titled("draft");
    repo.persist(&mut post).unwrap();
    let id = post.id.unwrap();

    repo.remove(&mut post).unwrap();

    assert!(post.deleted_at.is_some());
    assert_eq!(count_rows(repo.db(), "posts"), 1);
    let stored: Option<String> = repo
        .db()
        .query_row("SELECT deleted_at FROM posts WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .unwrap();
    assert!(stored.is_some());

    assert!(matches!(repo.find(id), Err(RepoError::NotFound { .. })));
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn find_by_ids_still_returns_soft_deleted_rows() {
    let repo = post_repo();
    let mut kept = Post::titled("kept");
    let mut gone = Post::titled("gone");
    repo.persist(&mut kept).unwrap();
    repo.persist(&mut gone).unwrap();
    repo.remove(&mut gone).unwrap();

    let found = repo
        .find_by_ids(&[kept.id.unwrap(), gone.id.unwrap()])
        .unwrap()
        .into_iter()
        .map(|record| record.into_entity().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].title, "gone");
    assert!(found[0].deleted_at.is_some());
    assert!(found[1].deleted_at.is_none());
}

#[test]
fn remove_also_writes_pending_changes() {
    let repo = post_repo();
    let mut post = Post::titled("before");
    repo.persist(&mut post).unwrap();

    post.title = "after".to_string();
    repo.remove(&mut post).unwrap();

    let title: String = repo
        .db()
        .query_row(
            "SELECT title FROM posts WHERE id = ?1",
            [post.id.unwrap()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(title, "after");
}

#[test]
fn xuid_is_assigned_once_and_kept() {
    let repo = post_repo();
    let mut post = Post::titled("tracked");
    repo.persist(&mut post).unwrap();

    let xuid = post.xuid.clone().expect("insert assigns xuid");
    assert_eq!(xuid.len(), 32);

    post.title = "tracked again".to_string();
    repo.persist(&mut post).unwrap();
    assert_eq!(post.xuid.as_deref(), Some(xuid.as_str()));

    let loaded = repo.find(post.id.unwrap()).unwrap().into_entity().unwrap();
    assert_eq!(loaded.xuid, Some(xuid));
}

#[test]
fn preset_xuid_is_not_replaced() {
    let repo = post_repo();
    let mut post = Post::titled("imported");
    post.xuid = Some("external-1".to_string());
    repo.persist(&mut post).unwrap();

    assert_eq!(post.xuid.as_deref(), Some("external-1"));
}

#[test]
fn custom_generator_supplies_xuids() {
    let repo = post_repo().with_xuid_generator(CountingXuid { next: Cell::new(0) });

    let mut first = Post::titled("a");
    let mut second = Post::titled("b");
    second.xuid = Some(String::new());
    repo.persist(&mut first).unwrap();
    repo.persist(&mut second).unwrap();
    repo.persist(&mut first).unwrap();

    assert_eq!(first.xuid.as_deref(), Some("xuid-1"));
    assert_eq!(second.xuid.as_deref(), Some("xuid-2"));
}
