mod common;

use marquee_server::checkout::{
    CheckoutError, CheckoutFlow, CheckoutNotice, CheckoutState, CommitOutcome, TransitionError,
};
use marquee_server::models::{AgeCategory, SeatCoordinate};
use marquee_server::store::{BookingStore, SeatStore};

use common::{customer, dollars, world, World};

fn seat(label: &str) -> SeatCoordinate {
    label.parse().unwrap()
}

async fn at_review(world: &World, user_id: uuid::Uuid, seats: &[&str]) -> CheckoutFlow {
    let mut flow = CheckoutFlow::start(&world.state, user_id, world.movie.id)
        .await
        .unwrap();
    flow.load_showtimes(None).await.unwrap();
    flow.choose_showtime(world.seven_pm.id).await.unwrap();
    for label in seats {
        flow.toggle_seat(seat(label)).unwrap();
        flow.assign_age(seat(label), AgeCategory::Adult).unwrap();
    }
    flow.confirm_seats().await.unwrap();
    flow
}

fn total(flow: &CheckoutFlow) -> rust_decimal::Decimal {
    match flow.state() {
        CheckoutState::PricingReview(review) => review.quote.total,
        CheckoutState::PaymentSelection(stage) => stage.review.quote.total,
        other => panic!("no quote in {}", other.name()),
    }
}

#[tokio::test]
async fn test_full_checkout_with_promotion() {
    let world = world().await;
    let (user_id, card_id) = customer(&world).await;

    let mut flow = at_review(&world, user_id, &["A1", "A2"]).await;
    assert_eq!(total(&flow), dollars(44));

    flow.apply_promotion("TENOFF").await.unwrap();
    assert_eq!(total(&flow), dollars(34));

    flow.acknowledge_pricing().unwrap();
    flow.choose_payment_method(card_id).unwrap();
    let outcome = flow.commit().await.unwrap();

    let booking = match outcome {
        CommitOutcome::Confirmed(booking) => booking,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(booking.total, dollars(34));
    match flow.state() {
        CheckoutState::Confirmed(confirmation) => {
            assert_eq!(confirmation.booking_id, booking.id);
            assert_eq!(confirmation.total, dollars(34));
            assert_eq!(confirmation.quote.discount, dollars(10));
        }
        other => panic!("unexpected {}", other.name()),
    }
    let taken = world.store.taken_seats(world.seven_pm.id).await.unwrap();
    assert_eq!(taken.into_iter().collect::<Vec<_>>(), vec![seat("A1"), seat("A2")]);
}

#[tokio::test]
async fn test_bad_code_keeps_total_and_second_code_is_rejected() {
    let world = world().await;
    let (user_id, _) = customer(&world).await;
    let mut flow = at_review(&world, user_id, &["A1", "A2"]).await;

    flow.apply_promotion("BADCODE").await.unwrap();
    assert_eq!(total(&flow), dollars(44));
    assert_eq!(
        flow.state().notice(),
        Some(&CheckoutNotice::InvalidPromotion("BADCODE".to_string()))
    );

    flow.apply_promotion("TENOFF").await.unwrap();
    let again = flow.apply_promotion("TENOFF").await;

    assert!(matches!(
        again,
        Err(CheckoutError::Transition(TransitionError::DiscountAlreadyApplied))
    ));
    assert_eq!(total(&flow), dollars(34));
}

#[tokio::test]
async fn test_stale_session_is_sent_back_to_seat_selection() {
    let world = world().await;
    let (alice, alice_card) = customer(&world).await;
    let (bob, bob_card) = customer(&world).await;

    let mut slow = at_review(&world, alice, &["A5", "A6"]).await;
    slow.acknowledge_pricing().unwrap();
    slow.choose_payment_method(alice_card).unwrap();

    let mut fast = at_review(&world, bob, &["A5"]).await;
    fast.acknowledge_pricing().unwrap();
    fast.choose_payment_method(bob_card).unwrap();
    assert!(matches!(
        fast.commit().await.unwrap(),
        CommitOutcome::Confirmed(_)
    ));

    let outcome = slow.commit().await.unwrap();

    assert!(matches!(outcome, CommitOutcome::SeatsTaken(ref seats) if seats == &vec![seat("A5")]));
    match slow.state() {
        CheckoutState::SeatSelection(stage) => {
            assert!(stage.taken.contains(&seat("A5")));
            assert!(stage.picks.contains_key(&seat("A6")));
            assert!(!stage.picks.contains_key(&seat("A5")));
        }
        other => panic!("unexpected {}", other.name()),
    }
    // Nothing of Alice's attempt was written.
    assert!(world.store.bookings_for_user(alice).await.unwrap().is_empty());

    // She can carry on with the remaining seat.
    slow.confirm_seats().await.unwrap();
    assert_eq!(total(&slow), dollars(22));
    slow.acknowledge_pricing().unwrap();
    slow.choose_payment_method(alice_card).unwrap();
    assert!(matches!(
        slow.commit().await.unwrap(),
        CommitOutcome::Confirmed(_)
    ));
}

#[tokio::test]
async fn test_back_and_forward_rehydrates_free_seats() {
    let world = world().await;
    let (user_id, _) = customer(&world).await;
    let (other, other_card) = customer(&world).await;

    let mut flow = CheckoutFlow::start(&world.state, user_id, world.movie.id)
        .await
        .unwrap();
    flow.load_showtimes(None).await.unwrap();
    flow.choose_showtime(world.seven_pm.id).await.unwrap();
    flow.toggle_seat(seat("B1")).unwrap();
    flow.assign_age(seat("B1"), AgeCategory::Child).unwrap();
    flow.toggle_seat(seat("B2")).unwrap();
    flow.assign_age(seat("B2"), AgeCategory::Senior).unwrap();
    flow.back().unwrap();

    // Someone else buys B2 meanwhile.
    let mut rival = at_review(&world, other, &["B2"]).await;
    rival.acknowledge_pricing().unwrap();
    rival.choose_payment_method(other_card).unwrap();
    rival.commit().await.unwrap();

    flow.choose_showtime(world.seven_pm.id).await.unwrap();

    match flow.state() {
        CheckoutState::SeatSelection(stage) => {
            assert_eq!(stage.picks.len(), 1);
            assert_eq!(stage.picks.get(&seat("B1")), Some(&Some(AgeCategory::Child)));
            assert_eq!(
                stage.notice,
                Some(CheckoutNotice::SeatsUnavailable(vec![seat("B2")]))
            );
        }
        other => panic!("unexpected {}", other.name()),
    }
}

#[tokio::test]
async fn test_cancel_releases_nothing_and_restarts() {
    let world = world().await;
    let (user_id, _) = customer(&world).await;
    let mut flow = at_review(&world, user_id, &["C1"]).await;

    flow.cancel().unwrap();

    assert!(matches!(flow.state(), CheckoutState::MovieSelected { .. }));
    assert!(world
        .store
        .taken_seats(world.seven_pm.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_commit_without_payment_method_is_refused() {
    let world = world().await;
    let (user_id, _) = customer(&world).await;
    let mut flow = at_review(&world, user_id, &["C1"]).await;
    flow.acknowledge_pricing().unwrap();

    let result = flow.commit().await;

    assert!(matches!(
        result,
        Err(CheckoutError::Transition(TransitionError::PaymentMethodRequired))
    ));
    assert!(matches!(flow.state(), CheckoutState::PaymentSelection(_)));
}
