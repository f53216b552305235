mod common;
mod evaluation;
mod plan;
