//! Card packs for the party game.
//!
//! Pack definitions are loaded by the host once at process start and handed
//! to the game as an owned registry; the core never touches the filesystem.

use serde::{Deserialize, Serialize};

/// A prompt card: text with underscore blanks and the number of answer
/// cards needed to fill it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PromptCard {
    pub text: String,
    pub pick: usize,
    pub pack: String,
}

/// An answer card in a hand or deck.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AnswerCard {
    pub id: u32,
    pub text: String,
    pub pack: String,
}

/// Raw pack content as supplied by the host.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CardPack {
    pub name: String,
    pub prompts: Vec<String>,
    pub answers: Vec<String>,
}

/// Process-scoped pack registry, injected at game construction.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PackRegistry {
    packs: Vec<CardPack>,
}

impl PackRegistry {
    #[must_use]
    pub fn new(packs: Vec<CardPack>) -> Self {
        Self { packs }
    }

    pub fn pack_names(&self) -> impl Iterator<Item = &str> {
        self.packs.iter().map(|p| p.name.as_str())
    }

    /// Builds fresh prompt and answer decks from the selected packs.
    /// Prompts with no blanks still require one answer card; answer texts
    /// lose a trailing period so they read naturally inside a sentence.
    #[must_use]
    pub fn build_decks(&self, selected: &[String]) -> (Vec<PromptCard>, Vec<AnswerCard>) {
        let mut prompts = Vec::new();
        let mut answers = Vec::new();
        let mut answer_id: u32 = 0;
        for pack in &self.packs {
            if !selected.iter().any(|name| *name == pack.name) {
                continue;
            }
            for text in &pack.prompts {
                let pick = text.matches('_').count().max(1);
                prompts.push(PromptCard {
                    text: text.clone(),
                    pick,
                    pack: pack.name.clone(),
                });
            }
            for text in &pack.answers {
                answers.push(AnswerCard {
                    id: answer_id,
                    text: text.trim_end_matches('.').to_string(),
                    pack: pack.name.clone(),
                });
                answer_id += 1;
            }
        }
        (prompts, answers)
    }
}

/// Fills the prompt's blanks with the given answers in order; answers left
/// over after the last blank are appended.
#[must_use]
pub fn fill_in_blanks(prompt_text: &str, answers: &[String]) -> String {
    let mut result = String::with_capacity(prompt_text.len() + 32);
    let mut next = answers.iter();
    let mut used_any_blank = false;
    for chunk in prompt_text.split_inclusive('_') {
        if let Some(stripped) = chunk.strip_suffix('_') {
            result.push_str(stripped);
            used_any_blank = true;
            match next.next() {
                Some(answer) => result.push_str(answer),
                None => result.push('_'),
            }
        } else {
            result.push_str(chunk);
        }
    }
    if !used_any_blank {
        for answer in next {
            result.push(' ');
            result.push_str(answer);
        }
    }
    result
}
