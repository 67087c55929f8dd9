mod common;
mod max_suffix;
