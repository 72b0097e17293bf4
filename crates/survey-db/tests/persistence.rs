//! File-backed persistence across process restarts.

use survey_core::SurveyStateRepository;
use survey_db::{SqliteSurveyStateRepository, StoreFactory, setup_database};

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("survey.db");

    {
        let pool = setup_database(&path).await.unwrap();
        let repo = SqliteSurveyStateRepository::new(pool.clone());
        repo.record_sampled_day(200).await.unwrap();
        repo.increment_download_attempts("abc").await.unwrap();
        repo.increment_download_attempts("abc").await.unwrap();
        repo.mark_prompt_displayed("abc", 1_700_000_000_000)
            .await
            .unwrap();
        pool.close().await;
    }

    let repo = StoreFactory::open_survey_state(&path).await.unwrap();
    let state = repo.load("abc").await.unwrap();

    assert_eq!(state.last_sampled_day_of_year, Some(200));
    assert_eq!(state.download_attempts, 2);
    assert_eq!(state.prompt_displayed_at_millis, Some(1_700_000_000_000));
}

#[tokio::test]
async fn test_displayed_marker_is_not_overwritten_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("survey.db");

    let first = StoreFactory::open_survey_state(&path).await.unwrap();
    assert!(first.mark_prompt_displayed("abc", 10).await.unwrap());

    let second = StoreFactory::open_survey_state(&path).await.unwrap();
    assert!(!second.mark_prompt_displayed("abc", 20).await.unwrap());
    assert_eq!(
        second.load("abc").await.unwrap().prompt_displayed_at_millis,
        Some(10)
    );
}
