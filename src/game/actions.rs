//! Declarative action registry.
//!
//! Each game describes its capabilities as a table of [`ActionSpec`]s:
//! stateless descriptors carrying an id, label key, enablement and
//! visibility predicates, a handler, and optionally an input-collection
//! step. Humans and bots are dispatched through the same path; actions that
//! need a sub-choice supply a `bot_select` function so bots resolve the
//! input without any UI.
//!
//! Enablement predicates are advisory for menu building, not a security
//! boundary: handlers re-check their own preconditions before mutating
//! state, because stale menus and double-submits are expected.

use crate::game::entities::PlayerId;
use crate::table::messages::MessageArgs;

/// Whether an action may appear in a rendered menu. Hidden actions stay
/// callable (status readouts bound to keys), they just never show up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// One selectable value for an action's input-collection step.
#[derive(Clone, Debug)]
pub struct InputOption {
    pub value: String,
    pub label_key: &'static str,
    pub args: MessageArgs,
}

/// Input-collection step for actions that need a sub-choice ("which
/// modifier", "which submission"). `options` supplies the choice list for
/// the UI; `bot_select` resolves the same choice for bots.
pub struct InputSpec<G> {
    pub prompt_key: &'static str,
    pub options: fn(&G, &PlayerId) -> Vec<InputOption>,
    pub bot_select: fn(&mut G, &PlayerId, &[InputOption]) -> Option<String>,
}

/// A named capability. Instantiated per menu rebuild, never persisted.
pub struct ActionSpec<G> {
    pub id: &'static str,
    pub label_key: &'static str,
    /// Extra args for dynamic labels ("Submit 2/3 cards").
    pub label_args: Option<fn(&G, &PlayerId) -> MessageArgs>,
    /// `None` = allowed; otherwise an error-reason token for the UI.
    pub enabled: fn(&G, &PlayerId) -> Option<&'static str>,
    pub hidden: fn(&G, &PlayerId) -> Visibility,
    pub handler: fn(&mut G, &PlayerId, Option<&str>),
    pub input: Option<InputSpec<G>>,
}

/// Menu-facing view of one action for one player.
#[derive(Clone, Debug)]
pub struct ActionView {
    pub id: &'static str,
    pub label_key: &'static str,
    pub label_args: MessageArgs,
    pub denied: Option<&'static str>,
}

/// Outcome of routing one action id through a registry.
pub enum DispatchResult {
    Handled,
    /// A human invoked an input-carrying action without a value; the host
    /// must collect one and re-dispatch.
    NeedsInput {
        prompt_key: &'static str,
        options: Vec<InputOption>,
    },
    Rejected(&'static str),
    Unknown,
}

/// Routes an action id through `specs`. This is the single call path for
/// humans, bots, and timer fallbacks.
pub fn dispatch<G>(
    game: &mut G,
    specs: &[ActionSpec<G>],
    player: &PlayerId,
    action_id: &str,
    input: Option<&str>,
    is_bot: bool,
) -> DispatchResult {
    let Some(spec) = specs.iter().find(|s| s.id == action_id) else {
        return DispatchResult::Unknown;
    };
    if let Some(reason) = (spec.enabled)(game, player) {
        return DispatchResult::Rejected(reason);
    }
    if input.is_none()
        && let Some(input_spec) = &spec.input
    {
        let options = (input_spec.options)(game, player);
        if options.is_empty() {
            return DispatchResult::Rejected("action-no-choices");
        }
        if is_bot {
            let Some(choice) = (input_spec.bot_select)(game, player, &options) else {
                return DispatchResult::Rejected("action-no-choices");
            };
            (spec.handler)(game, player, Some(&choice));
            return DispatchResult::Handled;
        }
        return DispatchResult::NeedsInput {
            prompt_key: input_spec.prompt_key,
            options,
        };
    }
    (spec.handler)(game, player, input);
    DispatchResult::Handled
}

/// Builds the visible menu for one player from a registry.
pub fn visible_actions<G>(game: &G, specs: &[ActionSpec<G>], player: &PlayerId) -> Vec<ActionView> {
    specs
        .iter()
        .filter(|spec| (spec.hidden)(game, player) == Visibility::Visible)
        .map(|spec| ActionView {
            id: spec.id,
            label_key: spec.label_key,
            label_args: spec
                .label_args
                .map(|f| f(game, player))
                .unwrap_or_default(),
            denied: (spec.enabled)(game, player),
        })
        .collect()
}
