use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use cardroom::scoring::{best_hand, blackjack_total};
use cardroom::{Card, Suit};

fn bench_blackjack_total(c: &mut Criterion) {
    let hand = vec![
        Card::new(0, 1, Suit::Club),
        Card::new(1, 6, Suit::Heart),
        Card::new(2, 10, Suit::Spade),
        Card::new(3, 1, Suit::Diamond),
        Card::new(4, 3, Suit::Club),
    ];
    c.bench_function("blackjack_total_5_cards", |b| {
        b.iter(|| blackjack_total(black_box(&hand)))
    });
}

fn bench_best_hand_seven(c: &mut Criterion) {
    let cards = vec![
        Card::new(0, 2, Suit::Heart),
        Card::new(1, 6, Suit::Heart),
        Card::new(2, 9, Suit::Heart),
        Card::new(3, 11, Suit::Heart),
        Card::new(4, 13, Suit::Heart),
        Card::new(5, 13, Suit::Club),
        Card::new(6, 13, Suit::Spade),
    ];
    c.bench_function("best_hand_7_cards", |b| {
        b.iter(|| best_hand(black_box(&cards)))
    });
}

criterion_group!(benches, bench_blackjack_total, bench_best_hand_seven);
criterion_main!(benches);
