//! Library-level flows across ranking, learning, caching and explanation.

mod explain_flow;
mod http_flow;
mod session_flow;
