pub mod image;
pub mod invite;
pub mod member_service;
pub mod membership;
pub mod project_service;
pub mod task_service;
pub mod workspace_service;

pub use member_service::MemberService;
pub use membership::{find_membership, MembershipGate};
pub use project_service::ProjectService;
pub use task_service::TaskService;
pub use workspace_service::WorkspaceService;
