mod auth_flow;
mod chat_flow;
mod persistence;
