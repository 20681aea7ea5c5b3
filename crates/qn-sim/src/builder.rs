//! Fluent builder for constructing a [`Simulation`].

use qn_core::{JobArena, SimConfig};
use qn_event::EventList;
use qn_queue::{QueueDiscipline, SimQueue};

use crate::{SimError, SimResult, Simulation};

/// Fluent builder for [`Simulation`].
///
/// # Required inputs
///
/// - [`SimConfig`]: start time, optional end time, seed, event cap
///
/// # Optional inputs
///
/// | Method           | Default                          |
/// |------------------|----------------------------------|
/// | `.queue(q)`      | no root queues                   |
/// | `.boxed_queue(q)`| same, for already boxed queues   |
///
/// Root queues are the queues the simulation talks to directly.  Sub-queues
/// of a composite are reached through their composite and must not be
/// registered on their own.
///
/// # Example
///
/// ```rust
/// use qn_core::SimConfig;
/// use qn_queue::Fcfs;
/// use qn_sim::{NoopObserver, SimBuilder};
///
/// let mut sim = SimBuilder::new(SimConfig::default())
///     .queue(Fcfs::new("server"))
///     .build()
///     .unwrap();
/// sim.run(&mut NoopObserver).unwrap();
/// ```
pub struct SimBuilder {
    config: SimConfig,
    queues: Vec<Box<dyn SimQueue>>,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self { config, queues: Vec::new() }
    }

    /// Register a root queue.
    pub fn queue(self, queue: impl SimQueue + 'static) -> Self {
        self.boxed_queue(Box::new(queue))
    }

    pub fn boxed_queue(mut self, queue: Box<dyn SimQueue>) -> Self {
        self.queues.push(queue);
        self
    }

    /// Validate the configuration and the queue set, reset the event list to
    /// the start time and return a ready-to-run [`Simulation`].
    pub fn build(self) -> SimResult<Simulation> {
        self.config.validate()?;

        for (i, queue) in self.queues.iter().enumerate() {
            for (j, other) in self.queues.iter().enumerate() {
                if i != j && queue.owns_entity(other.id()) {
                    return Err(SimError::Config(format!(
                        "queue {} ({}) is registered twice or owned by {} ({})",
                        other.id(),
                        other.name(),
                        queue.id(),
                        queue.name(),
                    )));
                }
            }
        }

        let mut events = EventList::new();
        events.reset(self.config.start_time);

        Ok(Simulation {
            config:     self.config,
            events,
            jobs:       JobArena::new(),
            queues:     self.queues,
            dispatched: 0,
        })
    }
}
