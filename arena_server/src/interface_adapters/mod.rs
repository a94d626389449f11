// Interface adapters: wire protocol, TCP sessions and HTTP control routes.

pub mod http;
pub mod net;
pub mod protocol;
pub mod routes;
pub mod state;
