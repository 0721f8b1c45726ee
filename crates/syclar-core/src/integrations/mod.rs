//! External services: signup notifications and AI suggestions.

pub mod ai;
pub mod notify;

pub use ai::{
    provider_from_env, AnyProvider, MilestoneSuggestion, MockProvider, OpenAiProvider,
    SubtaskSuggestion, SuggestionProvider, DEFAULT_MILESTONE_WEEKS, DEFAULT_SUBTASK_MINUTES,
};
pub use notify::{
    notifier_from_env, AnyNotifier, DisabledNotifier, Notifier, ResendNotifier, SendGridNotifier,
};
