/// Where the session stands with respect to loading the user from the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HydrationState {
    /// Nothing attempted yet (fresh boot, or no stored token).
    #[default]
    Idle,
    Hydrating,
    Hydrated,
    /// Explicit logout, or a hydration that could not confirm identity.
    LoggedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationEvent {
    Started,
    Succeeded,
    Failed,
    LoggedOut,
    /// A new token was adopted; the previous user is no longer valid.
    TokenReplaced,
}

impl HydrationState {
    pub fn next(self, event: HydrationEvent) -> HydrationState {
        match (self, event) {
            (_, HydrationEvent::Started) => HydrationState::Hydrating,
            (HydrationState::Hydrating, HydrationEvent::Succeeded) => HydrationState::Hydrated,
            // A success that lands outside of Hydrating is stale; keep the current state.
            (state, HydrationEvent::Succeeded) => state,
            (_, HydrationEvent::Failed) | (_, HydrationEvent::LoggedOut) => {
                HydrationState::LoggedOut
            }
            (_, HydrationEvent::TokenReplaced) => HydrationState::Idle,
        }
    }
}
