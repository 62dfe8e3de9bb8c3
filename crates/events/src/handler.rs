/// Decide and apply a command in place, without persistence or publication.
///
/// The store-backed path is `CommandDispatcher::dispatch` in the infra crate;
/// this is the same decide-then-evolve step, used directly by tests and by
/// services that build several snapshots before committing them together.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: inkworks_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
