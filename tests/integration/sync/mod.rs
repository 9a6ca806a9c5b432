mod e2e;
mod partial;
mod recovery;
mod status;
