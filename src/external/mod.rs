//! Collaborators outside the engine: the match-stats provider, its cache, and notifications.

mod cache;
mod notify;
mod stats;

pub use cache::{Cache, TtlCache};
pub use notify::{LogNotifier, Notifier, NotifyError, WebhookNotifier};
pub use stats::{
    ExternalMatch, ExternalPlayer, ExternalRounds, ExternalStats, ExternalTeam, HttpStatsProvider,
    ProviderError, StatsProvider, UnconfiguredStatsProvider,
};
