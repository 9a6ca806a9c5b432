mod binary;
mod commands;
