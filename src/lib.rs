pub mod config;
pub mod ctrl;
pub mod fabric;
pub mod net;
pub mod sim;
pub mod topo;

#[cfg(test)]
mod test;
