// File-backed SQLite with a real connection pool, hammered from several
// worker threads at once.

mod common;

use common::viewer;
use echoed::{
    app_state::AppState,
    config::Config,
    core::strong_types::UserId,
    domains::user::UserProfile,
    infrastructure::connect_database,
    AppError,
};
use tempfile::TempDir;

const CALLS: usize = 16;

async fn file_backed_state() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.database.url = format!("sqlite://{}", dir.path().join("echoed.db").display());
    config.database.max_connections = 8;
    let database = connect_database(&config.database).await.unwrap();
    (dir, AppState::with_database(config, database))
}

async fn pair(state: &AppState) -> (UserProfile, UserProfile) {
    let a = state.users.create_user("alice", "A", "L").await.unwrap();
    let b = state.users.create_user("bob", "B", "O").await.unwrap();
    (a, b)
}

async fn counters(state: &AppState, a: &UserProfile, b: &UserProfile) -> (i64, i64) {
    let a = state.users.get_profile(a.id).await.unwrap();
    let b = state.users.get_profile(b.id).await.unwrap();
    (a.following_count, b.followers_count)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_follows_and_unfollows_on_a_pooled_file_store() {
    let (_dir, state) = file_backed_state().await;
    let (a, b) = pair(&state).await;

    let handles: Vec<_> = (0..CALLS)
        .map(|_| {
            let graph = state.social_graph.clone();
            let vc = viewer(&a);
            let target = b.id;
            tokio::spawn(async move { graph.follow(&vc, target).await })
        })
        .collect();
    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().created {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(counters(&state, &a, &b).await, (1, 1));

    let handles: Vec<_> = (0..CALLS)
        .map(|_| {
            let graph = state.social_graph.clone();
            let vc = viewer(&a);
            let target = b.id;
            tokio::spawn(async move { graph.unfollow(&vc, target).await })
        })
        .collect();
    let mut removed = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().removed {
            removed += 1;
        }
    }
    assert_eq!(removed, 1);
    assert_eq!(counters(&state, &a, &b).await, (0, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_toggles_on_a_pooled_file_store() {
    let (_dir, state) = file_backed_state().await;
    let (a, b) = pair(&state).await;

    let handles: Vec<_> = (0..CALLS + 1)
        .map(|_| {
            let graph = state.social_graph.clone();
            let vc = viewer(&a);
            let target = b.id;
            tokio::spawn(async move { graph.toggle_follow(&vc, target).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().changed);
    }

    // every toggle flipped the edge, and an odd number of them ran
    let following = state
        .social_graph
        .is_following(&viewer(&a), b.id)
        .await
        .unwrap()
        .is_following;
    assert!(following);
    assert_eq!(counters(&state, &a, &b).await, (1, 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_follows_of_a_missing_user_fail_cleanly() {
    let (_dir, state) = file_backed_state().await;
    let (a, _) = pair(&state).await;

    let handles: Vec<_> = (0..CALLS)
        .map(|_| {
            let graph = state.social_graph.clone();
            let vc = viewer(&a);
            tokio::spawn(async move { graph.follow(&vc, UserId::new(999_999)).await })
        })
        .collect();
    for handle in handles {
        assert!(matches!(handle.await.unwrap(), Err(AppError::NotFound(_))));
    }
    assert_eq!(state.users.get_profile(a.id).await.unwrap().following_count, 0);
}
