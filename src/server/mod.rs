pub mod authn;
pub mod authz;
pub mod blocklist;
pub mod config;
pub mod factory;
pub mod gate;
pub mod handlers;
pub mod resolver;
pub mod response;
pub mod restful;
