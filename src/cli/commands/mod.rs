pub(super) mod compose;
pub(super) mod init;
pub(super) mod merge;
pub(super) mod refresh;
pub(super) mod remap;
pub(super) mod setup;
pub(super) mod status;
pub(super) mod sync;
