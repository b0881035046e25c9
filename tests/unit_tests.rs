// Unit tests for the queue, slot and wire models

mod common;

use common::{matched, profile};
use lume_swipe::core::{CandidateQueue, Delivery, MatchPolicy, MatchSlot, QueueError};
use lume_swipe::models::{ChannelFrame, SwipeDirection};
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_queue_front_after_n_pops_is_n_plus_one() {
    let ids: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    let mut queue = CandidateQueue::new(ids.iter().map(|id| profile(id)).collect());

    for n in 0..ids.len() {
        assert_ok!(queue.pop_front());
        assert_eq!(queue.peek_front().map(|p| p.id.clone()), ids.get(n + 1).cloned());
    }
    assert_eq!(assert_err!(queue.pop_front()), QueueError::EmptyQueue);
}

#[test]
fn test_queue_append_skips_known_identities() {
    let mut queue = CandidateQueue::new(vec![profile("a"), profile("b")]);
    assert_ok!(queue.pop_front());

    let added = queue.append(vec![profile("a"), profile("b"), profile("c"), profile("c")]);
    assert_eq!(added, 1);
    let ids: Vec<_> = queue.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
}

#[test]
fn test_queue_observer_tracks_remaining() {
    let mut queue = CandidateQueue::new(vec![profile("a")]);
    let view = queue.observe();
    assert_eq!(view.borrow().remaining, 1);

    queue.append(vec![profile("b")]);
    assert_eq!(view.borrow().remaining, 2);

    assert_ok!(queue.pop_front());
    assert_eq!(view.borrow().front.as_ref().map(|p| p.id.as_str()), Some("b"));
}

#[test]
fn test_slot_first_event_activates_exactly_once() {
    let slot = MatchSlot::new(MatchPolicy::LatestWins, 1);
    let mut rx = slot.subscribe();

    assert_eq!(slot.deliver(matched("D")), Delivery::Activated);
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().active.as_ref().unwrap().profile_id(), "D");
    assert!(!rx.has_changed().unwrap());
}

#[test]
fn test_slot_latest_wins_loses_previous() {
    let slot = MatchSlot::new(MatchPolicy::LatestWins, 8);
    slot.deliver(matched("D"));
    slot.deliver(matched("E"));

    assert_eq!(slot.active().unwrap().profile_id(), "E");
    assert_eq!(slot.pending_len(), 0);
    slot.dismiss();
    assert!(slot.active().is_none());
}

#[test]
fn test_slot_clear_resets_fifo_backlog() {
    let slot = MatchSlot::new(MatchPolicy::Fifo, 8);
    slot.deliver(matched("D"));
    slot.deliver(matched("E"));
    slot.clear();

    assert!(slot.active().is_none());
    assert_eq!(slot.pending_len(), 0);
}

#[test]
fn test_channel_frame_roundtrip_tag() {
    let json = serde_json::to_string(&ChannelFrame::Ping).unwrap();
    assert_eq!(json, r#"{"type":"ping"}"#);
}

#[test]
fn test_direction_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&SwipeDirection::Like).unwrap(), r#""like""#);
    assert_eq!(SwipeDirection::Like.to_string(), "like");
}
