//! Deck and hand rotation.
//!
//! Each side plays from a four-card hand with a visible "next" card. The
//! remaining cards wait in a draw pile; a played card goes to the tail of
//! the pile, so the cycle hand → pile → hand can never run dry.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::CardId;
use crate::error::{BattleError, Result};

/// Cards held playable at once.
pub const HAND_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct Hand {
    cards: Vec<CardId>,
    next: CardId,
    pile: VecDeque<CardId>,
}

impl Hand {
    /// Shuffle a deck and deal the opening hand plus the next-card preview.
    ///
    /// The deck must hold at least `HAND_SIZE + 1` cards so the preview
    /// slot can always be filled.
    pub fn deal<R: Rng>(deck: &[CardId], rng: &mut R) -> Result<Self> {
        if deck.len() < HAND_SIZE + 1 {
            return Err(BattleError::InvalidDeck(format!(
                "deck needs at least {} cards, got {}",
                HAND_SIZE + 1,
                deck.len()
            )));
        }
        let mut order = deck.to_vec();
        order.shuffle(rng);
        let mut drawn = order.into_iter();
        let cards: Vec<CardId> = drawn.by_ref().take(HAND_SIZE).collect();
        let next = drawn
            .next()
            .ok_or_else(|| BattleError::InvalidDeck("deck exhausted during deal".to_string()))?;
        let pile: VecDeque<CardId> = drawn.collect();
        Ok(Self { cards, next, pile })
    }

    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    pub fn next_card(&self) -> &CardId {
        &self.next
    }

    pub fn card_at(&self, slot: usize) -> Option<&CardId> {
        self.cards.get(slot)
    }

    /// Rotate after a play: the slot empties, the previewed card joins the
    /// hand, a fresh preview is drawn, and the played card goes to the
    /// pile tail. Returns the played card id.
    pub fn rotate(&mut self, slot: usize) -> Result<CardId> {
        if slot >= self.cards.len() {
            return Err(BattleError::InvalidHandSlot { slot });
        }
        let played = self.cards.remove(slot);
        self.pile.push_back(played.clone());
        // The pile was just fed, so a fresh preview always exists; with a
        // minimum-size deck the played card recycles immediately.
        let drawn = self.pile.pop_front().unwrap_or_else(|| played.clone());
        let promoted = std::mem::replace(&mut self.next, drawn);
        self.cards.push(promoted);
        Ok(played)
    }
}
