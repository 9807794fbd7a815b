//! Output timing: how source clips map onto the output timeline and when each poem line shows.

pub(crate) mod reconcile;
pub(crate) mod segment;
