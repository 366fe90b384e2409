// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// Commands are validated against current state and turned into events;
// events are then applied to produce the next state. Aggregates here are
// state-stored (the row is the source of truth), so events are the record
// of what a commit changed rather than the means of rebuilding it.
//
// ============================================================================

pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Validate a command and return the events it would produce.
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Fold one event into the current state.
    fn apply_event(&mut self, event: &Self::Event);

    /// Business key (account or customer number).
    fn aggregate_id(&self) -> String;

    /// Persisted row version this state was read at.
    fn version(&self) -> i64;

    /// Handle a command and apply the resulting events in place.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle_command(command)?;
        for event in &events {
            self.apply_event(event);
        }
        Ok(events)
    }
}
