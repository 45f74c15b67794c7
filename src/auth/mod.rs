mod extractors;
mod password;
pub mod session;

pub use extractors::*;
pub use password::*;
pub use session::{
    create_admin_session, purge_expired_sessions, resolve_capability, revoke_session, Capability,
    NewSession,
};
