//! Resource planning for spiking neural network cores
//!
//! Given a population of neurons, the projections arriving at it and the
//! slice of atoms one core will run, the planner computes:
//!
//! - the bytes of every SDRAM region the core allocates, its working memory
//!   and its cycles per tick ([`ResourceBudgetCalculator`]);
//! - the ring-buffer left shift of each synapse type, which keeps the
//!   accumulated synaptic input from overflowing 16-bit fixed point
//!   ([`RingBufferScaleSolver`]);
//! - where each projection's synaptic matrices sit in the core's matrix
//!   region ([`SynapticMatrixLayoutPlanner`]), the size of the lookup table
//!   that finds them ([`MasterPopulationTable`]) and the size of the data for
//!   generating them on the core ([`GeneratorSizePlanner`]).
//!
//! ```
//! use std::sync::Arc;
//! use spkplan_core::{
//!     AllToAllConnector, IncomingProjection, NeuronModel, ParameterValue, PlanningConfig,
//!     Population, ResourceBudgetCalculator, SourceId, SourceVertex, VertexSlice,
//! };
//!
//! let config = PlanningConfig::default();
//! let mut pop = Population::new("exc", 100, Arc::new(NeuronModel::if_curr_exp()), &config)?;
//! let input = Arc::new(SourceVertex::new(SourceId(0), "input", 50, 256)?);
//! pop.add_projection(
//!     IncomingProjection::new(input, 0, Arc::new(AllToAllConnector::new(true)))
//!         .with_weights(ParameterValue::Fixed(0.5)),
//! )?;
//!
//! let calc = ResourceBudgetCalculator::new(config.simulation.timestep_us);
//! let estimate = calc.estimate(&mut pop, &VertexSlice::whole(100)?);
//! assert!(estimate.sdram.total() > 0);
//! # Ok::<(), spkplan_core::PlanError>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod bit_field;
pub mod config;
pub mod connector;
pub mod constants;
pub mod dynamics;
pub mod error;
pub mod generator;
pub mod matrix_layout;
pub mod neuron;
pub mod params;
pub mod pop_table;
pub mod population;
pub mod projection;
pub mod recorder;
pub mod resources;
pub mod ring_buffer;
pub mod slice;
pub mod source;
pub mod synapse_io;

pub use bit_field::{BitFieldEstimator, DefaultBitFieldEstimator, NoBitFields};
pub use config::{PlanningConfig, ReportsConfig, SimulationConfig};
pub use connector::{
    AllToAllConnector, Connector, DelayRange, FixedProbabilityConnector, OneToOneConnector,
};
pub use dynamics::{StdpDynamics, StructuralDynamics, SynapseDynamics};
pub use error::{PlanError, Result};
pub use generator::{GeneratorBlock, GeneratorSizePlanner};
pub use matrix_layout::{MatrixBlock, MatrixLayout, ProjectionMatrixLayout, SynapticMatrixLayoutPlanner};
pub use neuron::{NeuronCosts, NeuronModel};
pub use params::ParameterValue;
pub use pop_table::{BinarySearchPopTable, MasterPopulationTable};
pub use population::{Population, PopulationEvent};
pub use projection::{IncomingProjection, ProjectionId};
pub use recorder::NeuronRecorder;
pub use resources::{ResourceBudgetCalculator, ResourceEstimate, SdramBreakdown};
pub use ring_buffer::{RingBufferScaleSolver, RingBufferShift};
pub use slice::VertexSlice;
pub use source::{MaxSpikeSource, SourceId, SourceVertex};
pub use synapse_io::MaxRowInfo;
