// chirpy-common: wire types and chirp validation shared by the Chirpy crates

pub mod chirp;
pub mod types;
