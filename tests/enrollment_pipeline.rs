//! End-to-end tests for the enrollment job pipeline: capacity bounds,
//! duplicate handling, priority ordering, retry/backoff, cancellation,
//! and statistics.
//!
//! All tests need PostgreSQL; run with
//! `cargo test -- --ignored --test-threads=1`.

mod helpers;

use std::time::Duration;

use helpers::{test_queue_config, TestApp};

use learnhub_entity::job::payload::EnrollmentJobData;
use learnhub_entity::job::status::{JobPriority, JobStatus};
use learnhub_entity::user::UserRole;
use learnhub_queue::queue::FailureResolution;

/// Capacity 3, six concurrent jobs: exactly three succeed, three are
/// rejected as full, and the enrollment count never exceeds capacity.
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn at_most_once_enrollment_under_contention() {
    let app = TestApp::new().await;

    let instructor = app.create_user("cap_instructor", "pw", UserRole::Instructor).await;
    let course_id = app.create_course(instructor, Some(3), true).await;

    let mut job_ids = Vec::new();
    for i in 0..6 {
        let student = app
            .create_user(&format!("cap_student_{i}"), "pw", UserRole::Student)
            .await;
        let job = app
            .queue
            .enqueue(
                &EnrollmentJobData {
                    course_id,
                    student_id: student,
                },
                JobPriority::NORMAL,
            )
            .await
            .unwrap();
        job_ids.push(job.id);
    }

    let (shutdown, handle) = app.spawn_worker();

    let mut successes = 0;
    let mut full = 0;
    for job_id in job_ids {
        let job = app.wait_for_terminal(job_id, Duration::from_secs(15)).await;
        assert_eq!(job.status, JobStatus::Completed);

        let result = job.result.expect("completed job has a result");
        if result["success"].as_bool().unwrap() {
            successes += 1;
        } else {
            assert!(
                result["error"].as_str().unwrap().contains("full"),
                "unexpected rejection: {result}"
            );
            full += 1;
        }
    }

    assert_eq!(successes, 3);
    assert_eq!(full, 3);

    let enrolled = app.enrollment_repo.count_for_course(course_id).await.unwrap();
    assert_eq!(enrolled, 3, "enrollment count exceeded capacity");

    shutdown.send(true).ok();
    handle.await.unwrap();
}

/// Two jobs for the same (course, student) pair: one success, one
/// already-enrolled rejection.
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn no_duplicate_enrollment() {
    let app = TestApp::new().await;

    let instructor = app.create_user("dup_instructor", "pw", UserRole::Instructor).await;
    let course_id = app.create_course(instructor, None, true).await;
    let student = app.create_user("dup_student", "pw", UserRole::Student).await;

    let data = EnrollmentJobData {
        course_id,
        student_id: student,
    };
    let first = app.queue.enqueue(&data, JobPriority::NORMAL).await.unwrap();
    let second = app.queue.enqueue(&data, JobPriority::NORMAL).await.unwrap();

    let (shutdown, handle) = app.spawn_worker();

    let first = app.wait_for_terminal(first.id, Duration::from_secs(15)).await;
    let second = app.wait_for_terminal(second.id, Duration::from_secs(15)).await;

    let outcomes: Vec<bool> = [&first, &second]
        .iter()
        .map(|job| job.result.as_ref().unwrap()["success"].as_bool().unwrap())
        .collect();

    assert_eq!(
        outcomes.iter().filter(|&&ok| ok).count(),
        1,
        "exactly one of the two jobs must succeed"
    );

    let enrolled = app.enrollment_repo.count_for_course(course_id).await.unwrap();
    assert_eq!(enrolled, 1);

    shutdown.send(true).ok();
    handle.await.unwrap();
}

/// Jobs enqueued [low, critical, normal] with one worker slot are
/// processed [critical, normal, low].
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn priority_orders_processing() {
    let mut config = test_queue_config();
    config.concurrency = 1;
    let app = TestApp::with_queue(config).await;

    let instructor = app.create_user("prio_instructor", "pw", UserRole::Instructor).await;
    let course_id = app.create_course(instructor, None, true).await;

    let mut jobs = Vec::new();
    for (name, priority) in [
        ("prio_low", JobPriority::LOW),
        ("prio_critical", JobPriority::CRITICAL),
        ("prio_normal", JobPriority::NORMAL),
    ] {
        let student = app.create_user(name, "pw", UserRole::Student).await;
        let job = app
            .queue
            .enqueue(
                &EnrollmentJobData {
                    course_id,
                    student_id: student,
                },
                priority,
            )
            .await
            .unwrap();
        jobs.push((priority, job.id));
    }

    let (shutdown, handle) = app.spawn_worker();

    let mut leased_at = Vec::new();
    for (priority, job_id) in &jobs {
        let job = app.wait_for_terminal(*job_id, Duration::from_secs(15)).await;
        leased_at.push((*priority, job.processed_at.expect("job was leased")));
    }

    let critical = leased_at.iter().find(|(p, _)| *p == JobPriority::CRITICAL).unwrap().1;
    let normal = leased_at.iter().find(|(p, _)| *p == JobPriority::NORMAL).unwrap().1;
    let low = leased_at.iter().find(|(p, _)| *p == JobPriority::LOW).unwrap().1;

    assert!(critical < normal, "critical must be leased before normal");
    assert!(normal < low, "normal must be leased before low");

    shutdown.send(true).ok();
    handle.await.unwrap();
}

/// The queue state machine: transient failures return the job to
/// `waiting` with exponential backoff until the ceiling, and a success
/// on the third attempt completes with `attempts = 2`.
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn retry_backoff_state_machine() {
    let app = TestApp::new().await;

    let job = app
        .queue
        .enqueue(
            &EnrollmentJobData {
                course_id: uuid::Uuid::new_v4(),
                student_id: uuid::Uuid::new_v4(),
            },
            JobPriority::NORMAL,
        )
        .await
        .unwrap();

    // First two attempts fail with a transient error.
    for expected_attempts in 1..=2 {
        let leased = loop {
            if let Some(leased) = app.queue.lease("w1").await.unwrap() {
                break leased;
            }
            // Backoff from the previous round has not elapsed yet.
            tokio::time::sleep(Duration::from_millis(50)).await;
        };
        assert_eq!(leased.id, job.id);

        let resolution = app
            .queue
            .resolve_failure(&leased, "storage unavailable")
            .await
            .unwrap();
        assert_eq!(resolution, FailureResolution::Retried);

        let stored = app.queue.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Waiting);
        assert_eq!(stored.attempts, expected_attempts);
        assert!(
            stored.run_at.expect("retry sets a backoff") > chrono::Utc::now(),
            "backoff must schedule the job in the future"
        );

        // The job is invisible to lease until the backoff elapses.
        assert!(app.queue.lease("w1").await.unwrap().is_none());
    }

    // Third attempt succeeds.
    let leased = loop {
        if let Some(leased) = app.queue.lease("w1").await.unwrap() {
            break leased;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    };
    assert_eq!(leased.attempts, 2);

    app.queue
        .complete(job.id, &serde_json::json!({"success": true}))
        .await
        .unwrap();

    let stored = app.queue.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.attempts, 2);
    assert!(stored.finished_at.is_some());
}

/// Exhausting the attempt ceiling marks the job terminally failed with
/// the last error recorded.
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn retries_exhausted_marks_failed() {
    let app = TestApp::new().await;

    let job = app
        .queue
        .enqueue(
            &EnrollmentJobData {
                course_id: uuid::Uuid::new_v4(),
                student_id: uuid::Uuid::new_v4(),
            },
            JobPriority::NORMAL,
        )
        .await
        .unwrap();

    let mut last_resolution = FailureResolution::Retried;
    for _ in 0..4 {
        let leased = loop {
            if let Some(leased) = app.queue.lease("w1").await.unwrap() {
                break leased;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        };

        last_resolution = app
            .queue
            .resolve_failure(&leased, "still unavailable")
            .await
            .unwrap();
    }

    assert_eq!(last_resolution, FailureResolution::Failed);

    let stored = app.queue.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.attempts, 3);
    assert_eq!(stored.error_message.as_deref(), Some("still unavailable"));
    assert!(stored.finished_at.is_some());
}

/// Cancellation succeeds only while the job is waiting.
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn cancellation_is_state_gated() {
    let app = TestApp::new().await;

    let data = EnrollmentJobData {
        course_id: uuid::Uuid::new_v4(),
        student_id: uuid::Uuid::new_v4(),
    };

    // Waiting: cancellable, and gone afterwards.
    let waiting = app.queue.enqueue(&data, JobPriority::NORMAL).await.unwrap();
    assert!(app.queue.remove(waiting.id).await.unwrap());
    assert!(app.queue.get(waiting.id).await.unwrap().is_none());

    // Active: not cancellable, and unchanged by the attempt.
    let active = app.queue.enqueue(&data, JobPriority::NORMAL).await.unwrap();
    let leased = app.queue.lease("w1").await.unwrap().unwrap();
    assert_eq!(leased.id, active.id);
    assert!(!app.queue.remove(active.id).await.unwrap());
    let stored = app.queue.get(active.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Active);

    // Completed: not cancellable.
    app.queue
        .complete(active.id, &serde_json::json!({"success": true}))
        .await
        .unwrap();
    assert!(!app.queue.remove(active.id).await.unwrap());

    // Unknown: false, not an error.
    assert!(!app.queue.remove(uuid::Uuid::new_v4()).await.unwrap());
}

/// Stats totals match the per-status counts.
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn stats_are_consistent() {
    let app = TestApp::new().await;

    let data = EnrollmentJobData {
        course_id: uuid::Uuid::new_v4(),
        student_id: uuid::Uuid::new_v4(),
    };

    // Two waiting, one active, one completed, one failed.
    app.queue.enqueue(&data, JobPriority::NORMAL).await.unwrap();
    app.queue.enqueue(&data, JobPriority::NORMAL).await.unwrap();

    app.queue.enqueue(&data, JobPriority::HIGH).await.unwrap();
    let active = app.queue.lease("w1").await.unwrap().unwrap();

    app.queue.enqueue(&data, JobPriority::HIGH).await.unwrap();
    let to_complete = app.queue.lease("w1").await.unwrap().unwrap();
    assert_ne!(active.id, to_complete.id);
    app.queue
        .complete(to_complete.id, &serde_json::json!({"success": true}))
        .await
        .unwrap();

    app.queue.enqueue(&data, JobPriority::HIGH).await.unwrap();
    let to_fail = app.queue.lease("w1").await.unwrap().unwrap();
    app.queue.fail(to_fail.id, "boom").await.unwrap();

    let stats = app.queue.stats().await.unwrap();
    assert_eq!(stats.waiting, 2);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(
        stats.total,
        stats.waiting + stats.active + stats.completed + stats.failed
    );
}

/// A stalled active job (no heartbeat) is re-leased while attempts
/// remain, and failed once the ceiling is reached.
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn stalled_jobs_are_reclaimed() {
    let app = TestApp::new().await;

    let data = EnrollmentJobData {
        course_id: uuid::Uuid::new_v4(),
        student_id: uuid::Uuid::new_v4(),
    };

    // Under the ceiling: reclaim returns the job to waiting.
    let job = app.queue.enqueue(&data, JobPriority::NORMAL).await.unwrap();
    app.queue.lease("w1").await.unwrap().unwrap();

    sqlx::query("UPDATE jobs SET heartbeat_at = NOW() - INTERVAL '60 seconds' WHERE id = $1")
        .bind(job.id)
        .execute(&app.db_pool)
        .await
        .unwrap();

    let (requeued, failed) = app.queue.reclaim_stalled().await.unwrap();
    assert_eq!((requeued, failed), (1, 0));

    let stored = app.queue.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Waiting);
    assert_eq!(stored.attempts, 1);

    // At the ceiling: reclaim fails the job.
    sqlx::query("UPDATE jobs SET attempts = max_attempts WHERE id = $1")
        .bind(job.id)
        .execute(&app.db_pool)
        .await
        .unwrap();
    app.queue.lease("w2").await.unwrap().unwrap();
    sqlx::query("UPDATE jobs SET heartbeat_at = NOW() - INTERVAL '60 seconds' WHERE id = $1")
        .bind(job.id)
        .execute(&app.db_pool)
        .await
        .unwrap();

    let (requeued, failed) = app.queue.reclaim_stalled().await.unwrap();
    assert_eq!((requeued, failed), (0, 1));

    let stored = app.queue.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.error_message.as_deref(), Some("Job stalled"));
}

/// Pruning keeps only the configured number of finished jobs.
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn finished_jobs_are_pruned_to_retention() {
    let app = TestApp::new().await;

    let data = EnrollmentJobData {
        course_id: uuid::Uuid::new_v4(),
        student_id: uuid::Uuid::new_v4(),
    };

    // keep_completed is 10 in the test config; finish 12 jobs.
    for _ in 0..12 {
        app.queue.enqueue(&data, JobPriority::NORMAL).await.unwrap();
        let leased = app.queue.lease("w1").await.unwrap().unwrap();
        app.queue
            .complete(leased.id, &serde_json::json!({"success": true}))
            .await
            .unwrap();
    }

    let pruned = app.queue.prune_finished().await.unwrap();
    assert_eq!(pruned, 2);

    let stats = app.queue.stats().await.unwrap();
    assert_eq!(stats.completed, 10);
}

/// Business-rule failures complete immediately without retries.
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn business_failures_are_not_retried() {
    let app = TestApp::new().await;

    let instructor = app.create_user("biz_instructor", "pw", UserRole::Instructor).await;
    // Unpublished course.
    let course_id = app.create_course(instructor, None, false).await;
    let student = app.create_user("biz_student", "pw", UserRole::Student).await;

    let job = app
        .queue
        .enqueue(
            &EnrollmentJobData {
                course_id,
                student_id: student,
            },
            JobPriority::NORMAL,
        )
        .await
        .unwrap();

    let (shutdown, handle) = app.spawn_worker();

    let job = app.wait_for_terminal(job.id, Duration::from_secs(15)).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.attempts, 0, "business failures must not be retried");

    let result = job.result.unwrap();
    assert_eq!(result["success"], false);
    assert_eq!(result["error"], "Course is not published");

    shutdown.send(true).ok();
    handle.await.unwrap();
}
