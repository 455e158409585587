// Domain-Driven Organization - one module per aggregate

pub mod comment;
pub mod echo;
pub mod social_graph;
pub mod user;
