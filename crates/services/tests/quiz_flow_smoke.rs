use std::sync::Arc;

use chrono::Duration;

use backend::{InMemoryBackend, StatsStore};
use quiz_core::model::{
    Category, Difficulty, Question, QuestionDraft, QuestionId, QuizRequest, SessionStatus,
    TimedPreset, UserId,
};
use quiz_core::time::fixed_clock;
use services::sessions::PREPARATION_DELAY_SECONDS;
use services::{LeaderboardService, QuizWorkflow, StatsAggregator, Tick};

fn build_question(id: u64, difficulty: Difficulty) -> Question {
    QuestionDraft {
        stem: format!("Question {id}"),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_answer: 0,
        difficulty,
        category: Category::new("General").unwrap(),
    }
    .validate()
    .unwrap()
    .assign_id(QuestionId::new(id))
}

fn seeded_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    let difficulties = [
        Difficulty::Easy,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Hard,
        Difficulty::Easy,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Medium,
        Difficulty::Hard,
    ];
    for (i, difficulty) in difficulties.into_iter().enumerate() {
        backend.add_question(build_question(i as u64 + 1, difficulty));
    }
    backend
}

fn workflow_over(backend: &InMemoryBackend) -> QuizWorkflow {
    let stats_store: Arc<dyn StatsStore> = Arc::new(backend.clone());
    QuizWorkflow::new(
        fixed_clock(),
        Arc::new(backend.clone()),
        StatsAggregator::new(stats_store),
    )
}

#[tokio::test]
async fn quick_session_scores_and_persists_stats() {
    let backend = seeded_backend();
    let mut workflow = workflow_over(&backend);
    let user = UserId::new("user-1");

    let mut session = workflow
        .start_session(user.clone(), QuizRequest::quick())
        .await
        .unwrap();
    assert_eq!(session.session().status(), SessionStatus::Starting);

    // wait out the preparation delay
    let (tick, _) = workflow.tick(&mut session).await.unwrap();
    assert_eq!(tick, Tick::Preparing);
    workflow.advance_clock(Duration::seconds(i64::from(PREPARATION_DELAY_SECONDS)));
    let (tick, _) = workflow.tick(&mut session).await.unwrap();
    assert_eq!(tick, Tick::Activated);

    // correct on the two easy and the medium question, wrong on the rest
    workflow.answer(&mut session, 0, 0).unwrap();
    workflow.answer(&mut session, 1, 0).unwrap();
    workflow.answer(&mut session, 2, 0).unwrap();
    workflow.answer(&mut session, 3, 1).unwrap();
    workflow.answer(&mut session, 4, 2).unwrap();

    let mut completion = None;
    for _ in 0..5 {
        let (_, done) = workflow.advance(&mut session).await.unwrap();
        completion = done;
    }

    let completion = completion.expect("final advance completes the session");
    assert_eq!(completion.outcome.correct_count, 3);
    assert_eq!(completion.outcome.score, 60);
    assert_eq!(completion.outcome.points_earned, 35);
    assert!(completion.synced);
    assert_eq!(completion.stats.points(), 35);
    assert_eq!(completion.stats.accuracy(), 60);

    // the session froze with a full answer sheet
    let frozen = session.session();
    assert_eq!(frozen.status(), SessionStatus::Results);
    assert_eq!(frozen.answers().len(), frozen.question_ids().len());

    // the backend saw the update
    let stored = backend.get_stats(&user).await.unwrap().unwrap();
    assert_eq!(stored.points(), 35);
    assert_eq!(stored.total_quizzes(), 1);
}

#[tokio::test]
async fn timed_session_expires_into_results() {
    let backend = seeded_backend();
    let mut workflow = workflow_over(&backend);
    let user = UserId::new("user-1");

    let mut session = workflow
        .start_session(user.clone(), QuizRequest::timed(TimedPreset::Standard))
        .await
        .unwrap();
    assert_eq!(session.questions().len(), 10);

    workflow.advance_clock(Duration::seconds(i64::from(PREPARATION_DELAY_SECONDS)));
    let (tick, _) = workflow.tick(&mut session).await.unwrap();
    assert_eq!(tick, Tick::Activated);

    // two answers before the countdown runs out
    workflow.answer(&mut session, 0, 0).unwrap();
    workflow.answer(&mut session, 1, 0).unwrap();

    workflow.advance_clock(Duration::seconds(600));
    let (tick, completion) = workflow.tick(&mut session).await.unwrap();
    assert_eq!(tick, Tick::Completed);

    let frozen = session.session();
    assert_eq!(frozen.status(), SessionStatus::Results);
    let unanswered = frozen.answers().iter().filter(|a| a.is_none()).count();
    assert_eq!(unanswered, 8);

    let completion = completion.expect("expiry finalizes the session");
    assert_eq!(completion.outcome.correct_count, 2);
    assert_eq!(completion.outcome.score, 20);
    assert_eq!(completion.outcome.time_spent_seconds, 600);

    // expiry delivered results exactly once; further ticks are quiet
    let (tick, completion) = workflow.tick(&mut session).await.unwrap();
    assert_eq!(tick, Tick::Completed);
    assert!(completion.is_none());
}

#[tokio::test]
async fn a_retry_is_a_brand_new_session() {
    let backend = seeded_backend();
    let mut workflow = workflow_over(&backend);
    let user = UserId::new("user-1");

    let mut first = workflow
        .start_session(user.clone(), QuizRequest::quick())
        .await
        .unwrap();
    let first_id = first.session_id();

    workflow.advance_clock(Duration::seconds(i64::from(PREPARATION_DELAY_SECONDS)));
    workflow.tick(&mut first).await.unwrap();
    for _ in 0..5 {
        workflow.advance(&mut first).await.unwrap();
    }
    assert!(first.is_complete());

    let second = workflow
        .start_session(user, QuizRequest::quick())
        .await
        .unwrap();
    assert_ne!(second.session_id(), first_id);
    assert_eq!(second.session().status(), SessionStatus::Starting);
}

#[tokio::test]
async fn completed_sessions_feed_the_leaderboard() {
    let backend = seeded_backend();
    let mut workflow = workflow_over(&backend);

    for (user, correct) in [("amy", 5), ("zoe", 2)] {
        let mut session = workflow
            .start_session(UserId::new(user), QuizRequest::quick())
            .await
            .unwrap();
        workflow.advance_clock(Duration::seconds(i64::from(PREPARATION_DELAY_SECONDS)));
        workflow.tick(&mut session).await.unwrap();
        for i in 0..correct {
            workflow.answer(&mut session, i, 0).unwrap();
        }
        for _ in 0..5 {
            workflow.advance(&mut session).await.unwrap();
        }
    }

    let board = LeaderboardService::new(Arc::new(backend))
        .standings()
        .await
        .unwrap();

    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, UserId::new("amy"));
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[1].user_id, UserId::new("zoe"));
    assert_eq!(board[1].rank, 2);
    assert!(board[0].points > board[1].points);
}
