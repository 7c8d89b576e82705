//! Outbound table messages.
//!
//! The core never builds user-facing prose. Every notification is an opaque
//! localization key plus structured arguments; the hosting session renders
//! each message per recipient locale (so two players can see different text
//! for the same event) and drains the queue after every action or tick.

use std::collections::VecDeque;

use crate::game::actions::InputOption;
use crate::game::entities::{Card, PlayerId};

/// A structured message argument. `Card`/`Hand` stay structured so the host
/// can localize card names per recipient.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Int(i64),
    Text(String),
    Flag(bool),
    Card(Card),
    Hand(Vec<Card>),
    /// A list of further localization keys (e.g. modifier labels).
    Keys(Vec<&'static str>),
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u8> for ArgValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for ArgValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Card> for ArgValue {
    fn from(value: Card) -> Self {
        Self::Card(value)
    }
}

impl From<&[Card]> for ArgValue {
    fn from(value: &[Card]) -> Self {
        Self::Hand(value.to_vec())
    }
}

impl From<Vec<&'static str>> for ArgValue {
    fn from(value: Vec<&'static str>) -> Self {
        Self::Keys(value)
    }
}

/// Named arguments attached to a message key.
pub type MessageArgs = Vec<(&'static str, ArgValue)>;

/// Builds [`MessageArgs`] from `("name", value)` pairs, converting values
/// through [`ArgValue::from`].
macro_rules! margs {
    ($(($k:literal, $v:expr)),* $(,)?) => {
        vec![ $(($k, $crate::table::messages::ArgValue::from($v))),* ]
    };
}
pub(crate) use margs;

/// One outbound notification.
#[derive(Clone, Debug)]
pub enum TableMessage {
    /// Tell everyone.
    Broadcast { key: &'static str, args: MessageArgs },
    /// Tell everyone except one player.
    BroadcastExcept {
        key: &'static str,
        args: MessageArgs,
        except: PlayerId,
    },
    /// Tell one player privately.
    Personal {
        to: PlayerId,
        key: &'static str,
        args: MessageArgs,
    },
    /// Tell the actor one thing and everyone else a templated third-person
    /// version of the same event. The host supplies the actor's name when
    /// rendering `others_key`.
    PersonalWithEcho {
        actor: PlayerId,
        personal_key: &'static str,
        others_key: &'static str,
        args: MessageArgs,
    },
    /// One-shot sound effect.
    Sound { name: &'static str },
    /// A human invoked an input-carrying action; collect a choice and
    /// re-dispatch `execute_action` with it.
    InputRequest {
        to: PlayerId,
        action_id: String,
        prompt_key: &'static str,
        options: Vec<InputOption>,
    },
    /// Player menus went stale; the host should rebuild them from
    /// `visible_actions`.
    MenuRefresh,
    /// The game reached terminal state; the host should collect
    /// `build_game_result` and tear the session down.
    Finished,
}

/// Queue of pending messages, drained by the host after each dispatch.
/// Transient; never persisted.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<TableMessage>,
}

impl Outbox {
    pub fn broadcast(&mut self, key: &'static str, args: MessageArgs) {
        self.queue.push_back(TableMessage::Broadcast { key, args });
    }

    pub fn broadcast_except(&mut self, key: &'static str, args: MessageArgs, except: PlayerId) {
        self.queue
            .push_back(TableMessage::BroadcastExcept { key, args, except });
    }

    pub fn personal(&mut self, to: PlayerId, key: &'static str, args: MessageArgs) {
        self.queue.push_back(TableMessage::Personal { to, key, args });
    }

    pub fn personal_echo(
        &mut self,
        actor: PlayerId,
        personal_key: &'static str,
        others_key: &'static str,
        args: MessageArgs,
    ) {
        self.queue.push_back(TableMessage::PersonalWithEcho {
            actor,
            personal_key,
            others_key,
            args,
        });
    }

    pub fn sound(&mut self, name: &'static str) {
        self.queue.push_back(TableMessage::Sound { name });
    }

    pub fn input_request(
        &mut self,
        to: PlayerId,
        action_id: &str,
        prompt_key: &'static str,
        options: Vec<InputOption>,
    ) {
        self.queue.push_back(TableMessage::InputRequest {
            to,
            action_id: action_id.to_string(),
            prompt_key,
            options,
        });
    }

    pub fn menu_refresh(&mut self) {
        self.queue.push_back(TableMessage::MenuRefresh);
    }

    pub fn finished(&mut self) {
        self.queue.push_back(TableMessage::Finished);
    }

    #[must_use]
    pub fn drain(&mut self) -> VecDeque<TableMessage> {
        std::mem::take(&mut self.queue)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Test helper: iterate without draining.
    pub fn iter(&self) -> impl Iterator<Item = &TableMessage> {
        self.queue.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_drains_in_order() {
        let mut outbox = Outbox::default();
        outbox.broadcast("a", MessageArgs::new());
        outbox.personal(PlayerId::new("p"), "b", margs![("amount", 5u32)]);
        outbox.finished();

        let drained = outbox.drain();
        assert_eq!(drained.len(), 3);
        assert!(outbox.is_empty());
        assert!(matches!(drained[0], TableMessage::Broadcast { key: "a", .. }));
        assert!(matches!(drained[2], TableMessage::Finished));
    }

    #[test]
    fn test_margs_converts_values() {
        let args = margs![("count", 3u32), ("name", "bob"), ("soft", true)];
        assert_eq!(args[0].1, ArgValue::Int(3));
        assert_eq!(args[1].1, ArgValue::Text("bob".to_string()));
        assert_eq!(args[2].1, ArgValue::Flag(true));
    }
}
