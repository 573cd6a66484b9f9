pub mod company;
pub mod process_log;

pub use company::{Company, CompanyStatus, PipelineStep, QueueCompanyRequest};
pub use process_log::{LogStatus, LogStep, ProcessLog};
