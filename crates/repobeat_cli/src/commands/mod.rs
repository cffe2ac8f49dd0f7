pub(crate) mod collect;
pub(crate) mod meta;
