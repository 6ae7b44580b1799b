mod aggregate;
mod portal;
mod report;
mod session;

pub use aggregate::aggregate_curves;
pub use portal::{PortalClient, UpdateListener};
pub use report::ReportClient;
pub use session::{Session, SessionManager};
