// handlers/mod.rs - two-tier handler layout
//
// public    → no credential required (/register, /login)
// protected → bearer token required; the auth middleware puts a
//             `CurrentActor` in the request extensions

pub mod protected;
pub mod public;
