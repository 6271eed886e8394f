//! Retrieval practice card selection.

use crate::model::practice::QuizCard;
use crate::store::StoreSnapshot;
use rand::seq::SliceRandom;
use rand::Rng;

/// Picks one quiz card uniformly at random; `None` when the deck is empty.
pub fn pick_quiz_card<'a, R: Rng + ?Sized>(
    snapshot: &'a StoreSnapshot,
    rng: &mut R,
) -> Option<&'a QuizCard> {
    snapshot.quiz_cards().choose(rng)
}
