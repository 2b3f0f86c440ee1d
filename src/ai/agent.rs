use crate::game::GameState;

/// Universal interface for computer-controlled players.
pub trait Agent {
    /// Select a column for the player to move in `state`.
    ///
    /// Returns `None` only when the state offers no legal column (finished
    /// game or full board); callers should not ask in that case.
    fn select_action(&mut self, state: &GameState) -> Option<usize>;

    /// Return the agent's display name.
    fn name(&self) -> &str;
}
