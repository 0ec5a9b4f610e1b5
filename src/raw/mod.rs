mod arena;
mod handle;
mod mutate;
mod node;
mod raw_tree;

pub(crate) use handle::Handle;
pub(crate) use raw_tree::RawTree;
