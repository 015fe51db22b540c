mod common;

use marquee_server::booking::BookingError;
use marquee_server::models::{AgeCategory, CommitRequest, SeatSelection};
use marquee_server::store::{BookingStore, SeatStore};

use common::{customer, dollars, world};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_commits_for_one_seat() {
    let world = world().await;
    let a5 = "A5".parse().unwrap();

    let mut attempts = Vec::new();
    for _ in 0..8 {
        let (user_id, card_id) = customer(&world).await;
        let bookings = world.state.bookings.clone();
        let request = CommitRequest {
            movie_id: world.movie.id,
            showtime_id: world.seven_pm.id,
            seats: vec![SeatSelection {
                seat: a5,
                age: AgeCategory::Adult,
            }],
            payment_method_id: Some(card_id),
            promotion_code: None,
            total: dollars(22),
        };
        attempts.push(tokio::spawn(async move {
            (user_id, bookings.commit(user_id, request).await)
        }));
    }

    let mut winners = Vec::new();
    let mut conflicts = 0;
    for attempt in attempts {
        let (user_id, result) = attempt.await.unwrap();
        match result {
            Ok(booking) => winners.push((user_id, booking)),
            Err(BookingError::Conflict(seats)) => {
                assert_eq!(seats, vec![a5]);
                conflicts += 1;
            }
            Err(e) => panic!("unexpected error {e:?}"),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(conflicts, 7);
    let taken = world.store.taken_seats(world.seven_pm.id).await.unwrap();
    assert_eq!(taken.len(), 1);
    let (winner, booking) = &winners[0];
    assert_eq!(
        world.store.bookings_for_user(*winner).await.unwrap(),
        vec![booking.clone()]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_multi_seat_commits_are_all_or_nothing() {
    let world = world().await;
    let (first, first_card) = customer(&world).await;
    let (second, second_card) = customer(&world).await;
    let seats = |labels: &[&str]| -> Vec<SeatSelection> {
        labels
            .iter()
            .map(|label| SeatSelection {
                seat: label.parse().unwrap(),
                age: AgeCategory::Adult,
            })
            .collect()
    };
    let request = |labels: &[&str], card_id| CommitRequest {
        movie_id: world.movie.id,
        showtime_id: world.seven_pm.id,
        seats: seats(labels),
        payment_method_id: Some(card_id),
        promotion_code: None,
        total: dollars(22) * rust_decimal::Decimal::from(labels.len() as u64),
    };

    let a = world.state.bookings.clone();
    let b = world.state.bookings.clone();
    let left = request(&["D1", "D2", "D3"], first_card);
    let right = request(&["D3", "D4"], second_card);
    let (left, right) = tokio::join!(
        tokio::spawn(async move { a.commit(first, left).await }),
        tokio::spawn(async move { b.commit(second, right).await }),
    );
    let (left, right) = (left.unwrap(), right.unwrap());

    assert!(left.is_ok() != right.is_ok());
    let taken = world.store.taken_seats(world.seven_pm.id).await.unwrap();
    let expected = if left.is_ok() { 3 } else { 2 };
    assert_eq!(taken.len(), expected);
}
