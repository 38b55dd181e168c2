//! Tests for save state tracking

use super::*;
use std::time::Duration;

fn description_key() -> SaveKey {
    SaveKey::column("orders", "total")
}

/// Let spawned timer tasks observe the advanced clock
async fn advance(duration: Duration) {
    tokio::time::advance(duration).await;
    tokio::task::yield_now().await;
}

mod key_tests {
    use super::*;

    #[test]
    fn test_namespaces_do_not_collide() {
        let tracker = SaveStateTracker::default();
        let table = SaveKey::table("global");
        let column = SaveKey::column("table", "global");

        tracker.begin_save(&table);
        tracker.fail_save(&table);

        assert_eq!(tracker.state_of(&table), SaveState::Error);
        assert_eq!(tracker.state_of(&SaveKey::GlobalContext), SaveState::Idle);
        assert_eq!(tracker.state_of(&column), SaveState::Idle);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(SaveKey::GlobalContext.to_string(), "global");
        assert_eq!(SaveKey::table("users").to_string(), "table:users");
        assert_eq!(SaveKey::column("users", "id").to_string(), "column:users.id");
    }

    #[test]
    fn test_unknown_key_is_idle() {
        let tracker = SaveStateTracker::default();
        assert_eq!(tracker.state_of(&description_key()), SaveState::Idle);
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_failed_save_stays_failed() {
        let tracker = SaveStateTracker::default();
        let key = description_key();

        tracker.begin_save(&key);
        assert!(tracker.state_of(&key).is_saving());
        tracker.fail_save(&key);
        assert_eq!(tracker.state_of(&key), SaveState::Error);

        tracker.begin_save(&key);
        assert_eq!(tracker.state_of(&key), SaveState::Saving);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_does_not_auto_revert() {
        let tracker = SaveStateTracker::default();
        let key = description_key();

        tracker.begin_save(&key);
        tracker.fail_save(&key);
        advance(Duration::from_secs(10)).await;

        assert_eq!(tracker.state_of(&key), SaveState::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_reverts_to_idle_after_delay() {
        let tracker = SaveStateTracker::default();
        let key = description_key();

        tracker.begin_save(&key);
        tracker.complete_save(&key);
        assert_eq!(tracker.state_of(&key), SaveState::Saved);

        advance(Duration::from_millis(1999)).await;
        assert_eq!(tracker.state_of(&key), SaveState::Saved);

        advance(Duration::from_millis(2)).await;
        assert_eq!(tracker.state_of(&key), SaveState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_revert_delay() {
        let tracker = SaveStateTracker::new(Duration::from_millis(500));
        let key = SaveKey::GlobalContext;

        tracker.begin_save(&key);
        tracker.complete_save(&key);
        advance(Duration::from_millis(501)).await;

        assert_eq!(tracker.state_of(&key), SaveState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_cycle_cancels_pending_revert() {
        let tracker = SaveStateTracker::default();
        let key = description_key();

        tracker.begin_save(&key);
        tracker.complete_save(&key);
        advance(Duration::from_millis(1500)).await;

        // Second cycle starts before the first revert fires, then fails.
        tracker.begin_save(&key);
        advance(Duration::from_millis(600)).await;
        assert_eq!(tracker.state_of(&key), SaveState::Saving);

        tracker.fail_save(&key);
        advance(Duration::from_secs(5)).await;
        assert_eq!(tracker.state_of(&key), SaveState::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_cycle_gets_full_revert_delay() {
        let tracker = SaveStateTracker::default();
        let key = description_key();

        tracker.begin_save(&key);
        tracker.complete_save(&key);
        advance(Duration::from_millis(1500)).await;

        tracker.begin_save(&key);
        tracker.complete_save(&key);
        advance(Duration::from_millis(1000)).await;
        assert_eq!(tracker.state_of(&key), SaveState::Saved);

        advance(Duration::from_millis(1001)).await;
        assert_eq!(tracker.state_of(&key), SaveState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_revert_independently() {
        let tracker = SaveStateTracker::default();
        let first = SaveKey::table("users");
        let second = SaveKey::table("orders");

        tracker.begin_save(&first);
        tracker.complete_save(&first);
        advance(Duration::from_millis(1000)).await;
        tracker.begin_save(&second);
        tracker.complete_save(&second);

        advance(Duration::from_millis(1001)).await;
        assert_eq!(tracker.state_of(&first), SaveState::Idle);
        assert_eq!(tracker.state_of(&second), SaveState::Saved);
    }
}

mod ticket_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_superseded_ticket_is_ignored() {
        let tracker = SaveStateTracker::default();
        let key = description_key();

        let first = tracker.begin_save(&key);
        let second = tracker.begin_save(&key);

        // The slow first call fails after the second cycle started.
        assert!(!tracker.settle(&first, SaveOutcome::Failed));
        assert_eq!(tracker.state_of(&key), SaveState::Saving);

        assert!(tracker.settle(&second, SaveOutcome::Saved));
        assert_eq!(tracker.state_of(&key), SaveState::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_ticket_schedules_revert() {
        let tracker = SaveStateTracker::default();
        let ticket = tracker.begin_save(&SaveKey::GlobalContext);
        assert_eq!(ticket.key(), &SaveKey::GlobalContext);

        tracker.settle(&ticket, SaveOutcome::Saved);
        advance(DEFAULT_REVERT_DELAY + Duration::from_millis(1)).await;

        assert_eq!(tracker.state_of(&SaveKey::GlobalContext), SaveState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_forgets_keys_and_timers() {
        let tracker = SaveStateTracker::default();
        let key = description_key();
        let ticket = tracker.begin_save(&key);
        tracker.complete_save(&key);

        tracker.reset();
        assert_eq!(tracker.state_of(&key), SaveState::Idle);
        assert!(!tracker.settle(&ticket, SaveOutcome::Failed));

        advance(Duration::from_secs(3)).await;
        assert_eq!(tracker.state_of(&key), SaveState::Idle);
    }

    #[test]
    fn test_complete_outside_runtime_keeps_saved() {
        let tracker = SaveStateTracker::default();
        let key = description_key();

        tracker.begin_save(&key);
        tracker.complete_save(&key);
        assert_eq!(tracker.state_of(&key), SaveState::Saved);
    }
}
