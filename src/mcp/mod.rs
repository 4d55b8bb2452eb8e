//! JSON-RPC (MCP) surface: the agent's tools exposed over stdin/stdout and `POST /rpc`.
pub mod handler;
pub mod protocol;
