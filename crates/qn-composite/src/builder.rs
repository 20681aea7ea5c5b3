//! Fluent builder for [`CompositeQueue`] and shortcuts for the common
//! network shapes.
//!
//! # Usage
//!
//! ```rust
//! use qn_composite::{CompositeQueueBuilder, StartModel, TandemSelector};
//! use qn_queue::{Fcfs, SimQueue};
//!
//! let composite = CompositeQueueBuilder::new("tandem")
//!     .sub_queue(Fcfs::new("first"))
//!     .sub_queue(Fcfs::new("second"))
//!     .start_model(StartModel::Local)
//!     .selector(TandemSelector::new(2))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(composite.sub_queues().len(), 2);
//! assert_eq!(composite.name(), "tandem");
//! ```

use std::collections::VecDeque;

use qn_core::SimRng;
use qn_queue::{AutoRevocationPolicy, QueueCore, QueueDiscipline, QueueResult, SimQueue};

use crate::delegate::{DelegateJobFactory, DelegateMap, ProxyJobFactory};
use crate::handshake::RevocationHandshake;
use crate::selector::{FeedbackSelector, JacksonSelector, SubQueueSelector, TandemSelector};
use crate::{CompositeQueue, StartModel};

/// Fluent builder for [`CompositeQueue`].
///
/// Defaults: `StartModel::Local`, a [`TandemSelector`] over all sub-queues,
/// [`ProxyJobFactory`] delegates, no drop destination.
pub struct CompositeQueueBuilder {
    name:             String,
    sub_queues:       Vec<Box<dyn SimQueue>>,
    start_model:      StartModel,
    selector:         Option<Box<dyn SubQueueSelector>>,
    factory:          Option<Box<dyn DelegateJobFactory>>,
    drop_destination: Option<usize>,
}

impl CompositeQueueBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:             name.into(),
            sub_queues:       Vec::new(),
            start_model:      StartModel::Local,
            selector:         None,
            factory:          None,
            drop_destination: None,
        }
    }

    /// Append a sub-queue.  Sub-queues are indexed in the order added.
    pub fn sub_queue(self, queue: impl SimQueue + 'static) -> Self {
        self.boxed_sub_queue(Box::new(queue))
    }

    pub fn boxed_sub_queue(mut self, queue: Box<dyn SimQueue>) -> Self {
        self.sub_queues.push(queue);
        self
    }

    pub fn sub_queues(mut self, queues: impl IntoIterator<Item = Box<dyn SimQueue>>) -> Self {
        self.sub_queues.extend(queues);
        self
    }

    pub fn start_model(mut self, model: StartModel) -> Self {
        self.start_model = model;
        self
    }

    pub fn selector(mut self, selector: impl SubQueueSelector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    pub fn delegate_factory(mut self, factory: impl DelegateJobFactory + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Delegates dropped by any other sub-queue re-arrive at sub-queue
    /// `index` instead of dropping their real job.  A drop at `index` itself
    /// drops the real job.
    pub fn drop_destination(mut self, index: usize) -> Self {
        self.drop_destination = Some(index);
        self
    }

    /// Validate and construct.
    ///
    /// Fails with an invalid-argument error if there are no sub-queues, if
    /// the start model needs a different number of them, or if the drop
    /// destination is out of range.
    pub fn build(self) -> QueueResult<CompositeQueue> {
        let mut sub_queues = self.sub_queues;
        let n = sub_queues.len();
        let start_armed = match self.start_model {
            StartModel::Local => true,
            StartModel::EncapsulatorHideStart => false,
            StartModel::EncapsulatorQueue => sub_queues.first().is_some_and(|q| q.is_start_armed()),
            StartModel::CompressedTandem2 => sub_queues.get(1).is_some_and(|q| q.is_start_armed()),
        };
        let core = QueueCore::new(self.name, start_armed);

        if n == 0 {
            return Err(core.invalid(None, "a composite queue needs at least one sub-queue"));
        }
        if let Some(required) = self.start_model.required_sub_queues() {
            if n != required {
                return Err(core.invalid(
                    None,
                    format!("start model {} needs {required} sub-queues, got {n}", self.start_model),
                ));
            }
        }
        if let Some(index) = self.drop_destination {
            if index >= n {
                return Err(core.invalid(None, format!("drop destination {index} out of range 0..{n}")));
            }
        }

        for queue in sub_queues.iter_mut() {
            queue.core_mut().entity_mut().set_ignore_event_list_reset(true);
        }

        let mut composite = CompositeQueue {
            core,
            sub_queues,
            start_model:      self.start_model,
            selector:         self.selector.unwrap_or_else(|| Box::new(TandemSelector::new(n))),
            factory:          self.factory.unwrap_or_else(|| Box::new(ProxyJobFactory)),
            delegates:        DelegateMap::new(),
            drop_destination: self.drop_destination,
            handshake:        RevocationHandshake::Idle,
            worklist:         VecDeque::new(),
            reducing:         false,
        };

        match composite.start_model {
            StartModel::CompressedTandem2 => {
                let credits = composite.compressed_tandem_credits();
                let waiting = composite.sub_queues[0].core_mut();
                waiting.set_auto_revocation_policy(AutoRevocationPolicy::UponStart);
                waiting.initialize_server_access_credits(credits);
            }
            StartModel::EncapsulatorQueue => {
                let credits = composite.core.server_access_credits();
                composite.sub_queues[0].core_mut().initialize_server_access_credits(credits);
            }
            StartModel::Local | StartModel::EncapsulatorHideStart => {}
        }
        Ok(composite)
    }
}

// ── Shortcuts ─────────────────────────────────────────────────────────────────

/// Jobs visit every sub-queue once, in order.
pub fn tandem(name: impl Into<String>, sub_queues: Vec<Box<dyn SimQueue>>) -> QueueResult<CompositeQueue> {
    let n = sub_queues.len();
    CompositeQueueBuilder::new(name)
        .sub_queues(sub_queues)
        .selector(TandemSelector::new(n))
        .build()
}

/// Jobs visit `queue` exactly `visits` times.
pub fn feedback(
    name:   impl Into<String>,
    queue:  impl SimQueue + 'static,
    visits: u32,
) -> QueueResult<CompositeQueue> {
    CompositeQueueBuilder::new(name)
        .sub_queue(queue)
        .selector(FeedbackSelector::new(visits))
        .build()
}

/// Probabilistic routing over `sub_queues` (see [`JacksonSelector`]).
pub fn jackson(
    name:       impl Into<String>,
    sub_queues: Vec<Box<dyn SimQueue>>,
    entry:      Vec<f64>,
    routing:    Vec<Vec<f64>>,
    rng:        SimRng,
) -> QueueResult<CompositeQueue> {
    let selector = JacksonSelector::new(entry, routing, rng)?;
    let routed = selector.len();
    let composite = CompositeQueueBuilder::new(name)
        .sub_queues(sub_queues)
        .selector(selector)
        .build()?;
    if routed != composite.sub_queues().len() {
        return Err(composite.core().invalid(
            None,
            format!("routing covers {routed} sub-queues, composite has {}", composite.sub_queues().len()),
        ));
    }
    Ok(composite)
}

/// A single sub-queue whose waiting and service areas the composite mirrors.
pub fn encapsulator(name: impl Into<String>, queue: impl SimQueue + 'static) -> QueueResult<CompositeQueue> {
    CompositeQueueBuilder::new(name)
        .sub_queue(queue)
        .start_model(StartModel::EncapsulatorQueue)
        .build()
}

/// A single sub-queue that holds the composite's jobs in its waiting area
/// from arrival to departure.
pub fn encapsulator_hide_start(
    name:  impl Into<String>,
    queue: impl SimQueue + 'static,
) -> QueueResult<CompositeQueue> {
    CompositeQueueBuilder::new(name)
        .sub_queue(queue)
        .start_model(StartModel::EncapsulatorHideStart)
        .build()
}

/// A two-queue tandem presented as one queue: waiting at `wait`, service at
/// `serve`.
pub fn compressed_tandem2(
    name:  impl Into<String>,
    wait:  impl SimQueue + 'static,
    serve: impl SimQueue + 'static,
) -> QueueResult<CompositeQueue> {
    CompositeQueueBuilder::new(name)
        .sub_queue(wait)
        .sub_queue(serve)
        .start_model(StartModel::CompressedTandem2)
        .build()
}
