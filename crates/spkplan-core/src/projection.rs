//! Projections arriving at a population

use std::fmt;
use std::sync::Arc;

use crate::connector::Connector;
use crate::dynamics::SynapseDynamics;
use crate::error::{PlanError, Result};
use crate::params::ParameterValue;
use crate::source::SourceVertex;
use crate::synapse_io::n_delay_stages_for;

/// Position of a projection in its target population, in insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectionId(pub u32);

impl ProjectionId {
    /// Get the raw index
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProjectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projection {}", self.0)
    }
}

/// A set of synapses from one source onto one synapse type of a population
#[derive(Debug, Clone)]
pub struct IncomingProjection {
    source: Arc<SourceVertex>,
    synapse_type: u32,
    connector: Arc<dyn Connector>,
    weights: ParameterValue,
    delays: ParameterValue,
    dynamics: SynapseDynamics,
    n_delay_stages: Option<u32>,
}

impl IncomingProjection {
    /// Static projection with unit weights and a 1 ms delay
    pub fn new(source: Arc<SourceVertex>, synapse_type: u32, connector: Arc<dyn Connector>) -> Self {
        Self {
            source,
            synapse_type,
            connector,
            weights: ParameterValue::Fixed(1.0),
            delays: ParameterValue::Fixed(1.0),
            dynamics: SynapseDynamics::Static,
            n_delay_stages: None,
        }
    }

    /// Set the weights
    pub fn with_weights(mut self, weights: impl Into<ParameterValue>) -> Self {
        self.weights = weights.into();
        self
    }

    /// Set the delays (ms)
    pub fn with_delays(mut self, delays: impl Into<ParameterValue>) -> Self {
        self.delays = delays.into();
        self
    }

    /// Set the synapse dynamics
    pub fn with_dynamics(mut self, dynamics: SynapseDynamics) -> Self {
        self.dynamics = dynamics;
        self
    }

    /// Fix the number of delay stages instead of deriving it from the delays
    pub fn with_delay_stages(mut self, n_delay_stages: u32) -> Self {
        self.n_delay_stages = Some(n_delay_stages);
        self
    }

    /// Check the projection against a target with `n_synapse_types` types
    pub fn validate(&self, n_synapse_types: u32) -> Result<()> {
        if self.synapse_type >= n_synapse_types {
            return Err(PlanError::invalid_parameter(
                "synapse_type",
                self.synapse_type.to_string(),
                format!("< {}", n_synapse_types),
            ));
        }
        self.weights.validate("weights")?;
        self.delays.validate("delays")?;
        let (min_delay, _) = self.delays.bounds();
        if min_delay < 0.0 {
            return Err(PlanError::invalid_parameter(
                "delays",
                min_delay.to_string(),
                ">= 0",
            ));
        }
        if let SynapseDynamics::Structural(s) = &self.dynamics {
            s.validate()?;
        }
        Ok(())
    }

    /// Source of the projection
    pub fn source(&self) -> &SourceVertex {
        &self.source
    }

    /// Synapse type targeted
    pub fn synapse_type(&self) -> u32 {
        self.synapse_type
    }

    /// Connector
    pub fn connector(&self) -> &dyn Connector {
        self.connector.as_ref()
    }

    /// Weights
    pub fn weights(&self) -> &ParameterValue {
        &self.weights
    }

    /// Delays (ms)
    pub fn delays(&self) -> &ParameterValue {
        &self.delays
    }

    /// Synapse dynamics
    pub fn dynamics(&self) -> &SynapseDynamics {
        &self.dynamics
    }

    /// Delay stages needed beyond the native range at `timestep_us`
    pub fn n_delay_stages(&self, timestep_us: f64) -> u32 {
        self.n_delay_stages
            .unwrap_or_else(|| n_delay_stages_for(self.delays.bounds().1, timestep_us))
    }

    /// Whether the connectivity can be generated on the core
    pub fn generates_on_core(&self) -> bool {
        self.connector.generates_on_core() && self.dynamics.generates_on_core()
    }
}
