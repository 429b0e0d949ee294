pub mod policy;
pub mod reports;
pub mod simulation;
pub mod tester;

pub use policy::{PlayerPolicy, PlayerStrategy, PlayerView, PolicyDecision};
pub use simulation::{
    AttemptRecord, DayOutcome, SimulationExpectation, SimulationPlan, SimulationSummary, Simulator,
};
pub use tester::*;
