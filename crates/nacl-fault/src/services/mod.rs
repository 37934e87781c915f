//! Fault stages: provision the chaos ACL, select subnets, switch
//! associations, and roll back.

pub mod provisioner;
pub mod rollback;
pub mod selector;
pub mod switcher;

pub use provisioner::ChaosAclProvisioner;
pub use rollback::RollbackExecutor;
pub use selector::SubnetSelector;
pub use switcher::AssociationSwitcher;
