mod create_superuser;
mod init;

pub use create_superuser::cmd_create_superuser;
pub use init::cmd_init;
