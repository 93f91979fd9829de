pub mod generator;
pub mod model;
pub mod options;

pub use generator::{build_plan, PlanGenerator};
pub use model::NSDeploymentPlan;
pub use options::NamespacePlanOptions;
